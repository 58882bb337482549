use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// key: billing-models -> products,billing records,usage
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Credits per user; `0` means unlimited.
    pub usage_limit: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn limit(&self) -> UsageLimit {
        UsageLimit::from_column(self.usage_limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLimit {
    Unlimited,
    Capped(i32),
}

impl UsageLimit {
    pub fn from_column(value: i32) -> Self {
        if value > 0 {
            UsageLimit::Capped(value)
        } else {
            UsageLimit::Unlimited
        }
    }

    pub fn as_option(&self) -> Option<i32> {
        match self {
            UsageLimit::Unlimited => None,
            UsageLimit::Capped(limit) => Some(*limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingStatus {
    Active,
    Approved,
    Other(String),
}

impl BillingStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => BillingStatus::Active,
            "approved" => BillingStatus::Approved,
            other => BillingStatus::Other(other.to_string()),
        }
    }

    pub fn is_entitling(&self) -> bool {
        matches!(self, BillingStatus::Active | BillingStatus::Approved)
    }
}

/// key: billing-record-model -> subscription per user
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BillingRecord {
    pub id: String,
    pub user_id: String,
    pub product_id: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillingRecord {
    pub fn status(&self) -> BillingStatus {
        BillingStatus::parse(&self.status)
    }
}

/// An entitling billing record together with its product, when it still has one.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveBilling {
    pub record: BillingRecord,
    pub product: Option<Product>,
}

/// key: usage-record-model -> per user and product counter
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: String,
    pub product_id: String,
    pub used: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementDenial {
    NoSubscription,
    NoCredits,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntitlementOutcome {
    pub allowed: bool,
    pub billing_id: Option<String>,
    pub product_id: Option<String>,
    /// `None` when the product is unlimited or absent.
    pub limit: Option<i32>,
    pub used: i32,
    pub remaining: Option<i32>,
    pub denial: Option<EntitlementDenial>,
    pub notes: Vec<String>,
}

impl EntitlementOutcome {
    fn denied(billing: Option<&ActiveBilling>, denial: EntitlementDenial, note: &str) -> Self {
        Self {
            allowed: false,
            billing_id: billing.map(|b| b.record.id.clone()),
            product_id: billing.and_then(|b| b.record.product_id.clone()),
            limit: None,
            used: 0,
            remaining: Some(0),
            denial: Some(denial),
            notes: vec![note.to_string()],
        }
    }

    /// Fail-closed entitlement decision for an active billing record and its current usage.
    pub fn evaluate(billing: Option<&ActiveBilling>, used: i32) -> Self {
        let Some(active) = billing else {
            return Self::denied(
                None,
                EntitlementDenial::NoSubscription,
                "billing:subscription-missing",
            );
        };
        let Some(product) = active.product.as_ref() else {
            return Self::denied(
                billing,
                EntitlementDenial::NoSubscription,
                "billing:product-missing",
            );
        };

        let used = used.max(0);
        let base = Self {
            allowed: true,
            billing_id: Some(active.record.id.clone()),
            product_id: Some(product.id.clone()),
            limit: None,
            used,
            remaining: None,
            denial: None,
            notes: Vec::new(),
        };

        match product.limit() {
            UsageLimit::Unlimited => Self {
                notes: vec![format!("billing:usage:{}:unlimited", product.id)],
                ..base
            },
            UsageLimit::Capped(limit) if used >= limit => Self {
                allowed: false,
                limit: Some(limit),
                remaining: Some(0),
                denial: Some(EntitlementDenial::NoCredits),
                notes: vec![format!("billing:credits-exhausted:{}", product.id)],
                ..base
            },
            UsageLimit::Capped(limit) => Self {
                limit: Some(limit),
                remaining: Some(limit - used),
                notes: vec![format!("billing:usage:{}:{used}/{limit}", product.id)],
                ..base
            },
        }
    }
}

/// Result of an atomic usage commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageCommit {
    Committed { used: i32 },
    LimitReached,
}
