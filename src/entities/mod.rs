//! SeaORM entity definitions
//!
//! One module per table; `prelude` re-exports the commonly used aliases.

pub mod activation_token;
pub mod budget_limit;
pub mod entitlement_record;
pub mod entitlement_user;
pub mod invoice;
pub mod invoice_item;
pub mod platform_user;
pub mod prelude;
