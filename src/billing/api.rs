use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{BillingRecord, EntitlementOutcome, Product, UsageAccountant};
use crate::error::{AppError, AppResult};
use crate::extractor::AuthUser;

/// key: billing-api -> usage summary and admin billing endpoints
pub async fn current_usage(
    user: AuthUser,
    Extension(pool): Extension<PgPool>,
) -> AppResult<Json<EntitlementOutcome>> {
    let outcome = UsageAccountant::new(pool)
        .check_entitlement(&user.user_id)
        .await?;
    Ok(Json(outcome))
}

pub async fn list_products(
    user: AuthUser,
    Extension(pool): Extension<PgPool>,
) -> AppResult<Json<Vec<Product>>> {
    user.require_admin()?;
    let products = UsageAccountant::new(pool).list_products().await?;
    Ok(Json(products))
}

pub async fn create_product(
    user: AuthUser,
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    user.require_admin()?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Product name is required".into()));
    }
    let limit = payload.limit.unwrap_or(0);
    if limit < 0 {
        return Err(AppError::Validation("Limit must be zero or positive".into()));
    }
    let product = UsageAccountant::new(pool)
        .create_product(name, limit)
        .await?;
    tracing::info!(admin_id = %user.user_id, product_id = %product.id, limit, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn upsert_billing(
    user: AuthUser,
    Extension(pool): Extension<PgPool>,
    Path(target_user_id): Path<String>,
    Json(payload): Json<UpsertBillingRequest>,
) -> AppResult<Json<BillingEnvelope>> {
    user.require_admin()?;
    let accountant = UsageAccountant::new(pool);
    let product = accountant
        .product(&payload.product_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let status = payload
        .status
        .as_deref()
        .map(str::trim)
        .filter(|status| !status.is_empty())
        .unwrap_or("active");
    let record = accountant
        .upsert_billing(&target_user_id, &product.id, status)
        .await
        .map_err(|error| match &error {
            sqlx::Error::Database(db_err)
                if db_err.constraint() == Some("billing_records_user_id_fkey") =>
            {
                AppError::NotFound
            }
            _ => AppError::Db(error),
        })?;
    tracing::info!(
        admin_id = %user.user_id,
        user_id = %target_user_id,
        billing_id = %record.id,
        status = %record.status,
        "billing record upserted"
    );
    Ok(Json(BillingEnvelope { billing: record, product }))
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub limit: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertBillingRequest {
    pub product_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BillingEnvelope {
    pub billing: BillingRecord,
    pub product: Product,
}
