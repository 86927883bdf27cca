//! Entity prelude for convenient imports

pub use super::activation_token::{
  ActiveModel as ActivationTokenActiveModel, Entity as ActivationToken,
  Model as ActivationTokenModel,
};
pub use super::budget_limit::{
  ActiveModel as BudgetLimitActiveModel, Entity as BudgetLimit,
  Model as BudgetLimitModel,
};
pub use super::entitlement_record::{
  ActiveModel as EntitlementRecordActiveModel, Entity as EntitlementRecord,
  GrantMethod, Model as EntitlementRecordModel,
};
pub use super::entitlement_user::{
  AccountStatus, ActiveModel as EntitlementUserActiveModel,
  Entity as EntitlementUser, Model as EntitlementUserModel,
};
pub use super::invoice::{
  ActiveModel as InvoiceActiveModel, Entity as Invoice, Model as InvoiceModel,
};
pub use super::invoice_item::{
  ActiveModel as InvoiceItemActiveModel, Entity as InvoiceItem,
  Model as InvoiceItemModel,
};
pub use super::platform_user::{
  ActiveModel as PlatformUserActiveModel, Entity as PlatformUser,
  Model as PlatformUserModel,
};
