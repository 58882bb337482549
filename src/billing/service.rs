use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::models::{
    ActiveBilling, BillingRecord, EntitlementOutcome, Product, UsageCommit, UsageLimit,
    UsageRecord,
};

/// key: usage-accountant -> entitlement gate and credit commits
#[derive(Clone)]
pub struct UsageAccountant {
    pool: PgPool,
}

impl UsageAccountant {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recently updated billing record whose status is entitling.
    pub async fn active_billing(&self, user_id: &str) -> sqlx::Result<Option<ActiveBilling>> {
        let row = sqlx::query(
            r#"
            SELECT
                b.id,
                b.user_id,
                b.product_id,
                b.status,
                b.created_at,
                b.updated_at,
                p.id AS product_row_id,
                p.name AS product_name,
                p.usage_limit AS product_usage_limit,
                p.created_at AS product_created_at,
                p.updated_at AS product_updated_at
            FROM billing_records b
            LEFT JOIN products p ON p.id = b.product_id
            WHERE b.user_id = $1
              AND lower(b.status) IN ('active', 'approved')
            ORDER BY b.updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let record = BillingRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            product_id: row.get("product_id"),
            status: row.get("status"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        };

        if !record.status().is_entitling() {
            return Ok(None);
        }

        let product_id: Option<String> = row.get("product_row_id");
        let product = match product_id {
            Some(id) => Some(Product {
                id,
                name: row.get("product_name"),
                usage_limit: row.get("product_usage_limit"),
                created_at: row.get::<DateTime<Utc>, _>("product_created_at"),
                updated_at: row.get::<DateTime<Utc>, _>("product_updated_at"),
            }),
            None => None,
        };

        Ok(Some(ActiveBilling { record, product }))
    }

    pub async fn usage_for(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> sqlx::Result<Option<UsageRecord>> {
        sqlx::query_as::<_, UsageRecord>(
            "SELECT * FROM usage_records WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Read-only entitlement check. Fails closed when no entitling billing record or
    /// product exists.
    pub async fn check_entitlement(&self, user_id: &str) -> sqlx::Result<EntitlementOutcome> {
        let billing = self.active_billing(user_id).await?;
        let used = match billing
            .as_ref()
            .and_then(|active| active.product.as_ref())
        {
            Some(product) => self
                .usage_for(user_id, &product.id)
                .await?
                .map(|usage| usage.used)
                .unwrap_or(0),
            None => 0,
        };
        Ok(EntitlementOutcome::evaluate(billing.as_ref(), used))
    }

    /// Consumes one credit. The insert-or-increment runs as one statement guarded by the
    /// limit, so concurrent commits for the same pair serialize on the row and never push
    /// `used` past a positive limit.
    pub async fn commit_usage(
        &self,
        user_id: &str,
        product_id: &str,
        limit: UsageLimit,
    ) -> sqlx::Result<UsageCommit> {
        let cap = limit.as_option().unwrap_or(0);
        let used: Option<i32> = sqlx::query_scalar(
            r#"
            INSERT INTO usage_records (user_id, product_id, used, created_at, updated_at)
            VALUES ($1, $2, 1, NOW(), NOW())
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET
                used = usage_records.used + 1,
                updated_at = NOW()
            WHERE $3 <= 0 OR usage_records.used < $3
            RETURNING used
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(cap)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match used {
            Some(used) => UsageCommit::Committed { used },
            None => UsageCommit::LimitReached,
        })
    }

    pub async fn list_products(&self) -> sqlx::Result<Vec<Product>> {
        sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn product(&self, product_id: &str) -> sqlx::Result<Option<Product>> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create_product(&self, name: &str, usage_limit: i32) -> sqlx::Result<Product> {
        sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, usage_limit) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(usage_limit)
        .fetch_one(&self.pool)
        .await
    }

    /// Creates or updates the user's most recent billing record.
    pub async fn upsert_billing(
        &self,
        user_id: &str,
        product_id: &str,
        status: &str,
    ) -> sqlx::Result<BillingRecord> {
        let existing_id: Option<String> = sqlx::query_scalar(
            "SELECT id FROM billing_records WHERE user_id = $1 ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let billing_id = existing_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        sqlx::query_as::<_, BillingRecord>(
            r#"
            INSERT INTO billing_records (id, user_id, product_id, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET
                product_id = EXCLUDED.product_id,
                status = EXCLUDED.status,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(billing_id)
        .bind(user_id)
        .bind(product_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }
}
