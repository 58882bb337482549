pub mod api;
pub mod models;
pub mod service;

pub use models::{
    ActiveBilling, BillingRecord, BillingStatus, EntitlementDenial, EntitlementOutcome, Product,
    UsageCommit, UsageLimit, UsageRecord,
};
pub use service::UsageAccountant;
