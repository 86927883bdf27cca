pub mod budget;
pub mod entitlement;
pub mod invoices;
pub mod users;

pub use budget::Budget;
pub use entitlement::Entitlements;
pub use invoices::Invoices;
pub use users::Users;
