use axum::{body::Bytes, extract::Extension, Json};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::PgPool;
use url::Url;

use crate::ai::{self, AiGateway};
use crate::billing::{
    EntitlementDenial, EntitlementOutcome, UsageAccountant, UsageCommit, UsageLimit,
};
use crate::error::{AppError, AppResult};
use crate::extractor::AuthUser;
use crate::settings::SettingsService;

const MIN_TEXT_CHARS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct HashtagRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct HashtagResponse {
    pub hashtags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    pub caption: String,
}

/// key: invocation-hashtags -> `POST /api/ai/hashtag-generator`
pub async fn hashtag_generator(
    user: AuthUser,
    Extension(pool): Extension<PgPool>,
    Extension(gateway): Extension<AiGateway>,
    body: Bytes,
) -> AppResult<Json<HashtagResponse>> {
    let accountant = UsageAccountant::new(pool.clone());
    let entitlement = authorize(&accountant, &user, "hashtag").await?;

    let request: HashtagRequest = parse_body(&body)?;
    let text = validate_text(&request.text)?;

    let settings = SettingsService::new(pool).ai_settings().await?;
    let resolved = ai::resolve_provider(settings.as_ref(), &gateway)?;
    let hashtags = ai::generate_hashtags(resolved.instance.as_ref(), &resolved.model, text)
        .await
        .map_err(|error| {
            tracing::error!(
                user_id = %user.user_id,
                model = %resolved.model.name,
                %error,
                "hashtag generation failed"
            );
            AppError::Provider(format!("Failed to generate hashtags: {error}"))
        })?;

    commit(&accountant, &user, &entitlement, "hashtag").await?;
    Ok(Json(HashtagResponse { hashtags }))
}

/// key: invocation-caption -> `POST /api/ai/image-caption-generator`
pub async fn image_caption_generator(
    user: AuthUser,
    Extension(pool): Extension<PgPool>,
    Extension(gateway): Extension<AiGateway>,
    body: Bytes,
) -> AppResult<Json<CaptionResponse>> {
    let accountant = UsageAccountant::new(pool.clone());
    let entitlement = authorize(&accountant, &user, "caption").await?;

    let request: CaptionRequest = parse_body(&body)?;
    let image_url = validate_image_url(&request.image_url)?;

    let settings = SettingsService::new(pool).ai_settings().await?;
    let resolved = ai::resolve_provider(settings.as_ref(), &gateway)?;
    let caption = ai::generate_caption(resolved.instance.as_ref(), &resolved.model, &image_url)
        .await
        .map_err(|error| {
            tracing::error!(
                user_id = %user.user_id,
                model = %resolved.model.name,
                %image_url,
                %error,
                "caption generation failed"
            );
            error
        })?;

    commit(&accountant, &user, &entitlement, "caption").await?;
    Ok(Json(CaptionResponse { caption }))
}

async fn authorize(
    accountant: &UsageAccountant,
    user: &AuthUser,
    capability: &'static str,
) -> AppResult<EntitlementOutcome> {
    let outcome = accountant.check_entitlement(&user.user_id).await?;
    let denial = outcome.denial;
    match denial {
        None if outcome.allowed => Ok(outcome),
        Some(EntitlementDenial::NoCredits) => {
            tracing::error!(
                user_id = %user.user_id,
                capability,
                used = outcome.used,
                limit = ?outcome.limit,
                product_id = ?outcome.product_id,
                "no credits left"
            );
            Err(AppError::NoCredits)
        }
        _ => {
            tracing::error!(
                user_id = %user.user_id,
                capability,
                billing_id = ?outcome.billing_id,
                notes = ?outcome.notes,
                "no active subscription found"
            );
            Err(AppError::NoSubscription)
        }
    }
}

/// Charges one credit after a successful generation. Losing the race for the last credit
/// surfaces as `NoCredits`.
async fn commit(
    accountant: &UsageAccountant,
    user: &AuthUser,
    entitlement: &EntitlementOutcome,
    capability: &'static str,
) -> AppResult<()> {
    let Some(product_id) = entitlement.product_id.as_deref() else {
        return Err(AppError::NoSubscription);
    };
    let limit = UsageLimit::from_column(entitlement.limit.unwrap_or(0));
    match accountant
        .commit_usage(&user.user_id, product_id, limit)
        .await?
    {
        UsageCommit::Committed { used } => {
            tracing::info!(
                user_id = %user.user_id,
                capability,
                product_id,
                used,
                "usage committed"
            );
            Ok(())
        }
        UsageCommit::LimitReached => {
            tracing::error!(
                user_id = %user.user_id,
                capability,
                product_id,
                limit = ?entitlement.limit,
                "credit exhausted by a concurrent request"
            );
            Err(AppError::NoCredits)
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_json::from_slice(body)
        .map_err(|error| AppError::Validation(format!("Invalid input: {error}")))
}

fn validate_text(text: &str) -> AppResult<&str> {
    if text.chars().count() < MIN_TEXT_CHARS {
        return Err(AppError::Validation(
            "Text is too short for hashtag generation".to_string(),
        ));
    }
    Ok(text.trim())
}

fn validate_image_url(raw: &str) -> AppResult<Url> {
    let invalid = || AppError::Validation("Invalid url".to_string());
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}
