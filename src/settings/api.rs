use std::sync::Arc;

use axum::{extract::Extension, Json};
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use sqlx::PgPool;

use super::{
    AiSettings, AuthSettings, AuthSettingsPatch, AuthSettingsStore, SettingsService,
    SocialProvider,
};
use crate::error::AppResult;
use crate::extractor::AuthUser;

/// key: settings-api -> admin endpoints
pub async fn get_ai_settings(
    user: AuthUser,
    Extension(pool): Extension<PgPool>,
) -> AppResult<Json<AiSettings>> {
    user.require_admin()?;
    let settings = SettingsService::new(pool).ai_settings().await?;
    Ok(Json(settings.unwrap_or_default()))
}

pub async fn update_ai_settings(
    user: AuthUser,
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<AiSettings>,
) -> AppResult<Json<AiSettings>> {
    user.require_admin()?;
    let payload = AiSettings {
        api_key: payload.api_key().map(str::to_string),
        enabled_models: payload.enabled_models().map(str::to_string).collect(),
    };
    SettingsService::new(pool).save_ai(&payload).await?;
    tracing::info!(
        admin_id = %user.user_id,
        models = payload.enabled_models.len(),
        "AI settings updated"
    );
    Ok(Json(payload))
}

pub async fn get_auth_settings(
    user: AuthUser,
    Extension(store): Extension<Arc<AuthSettingsStore>>,
) -> AppResult<Json<AuthSettings>> {
    user.require_admin()?;
    Ok(Json(store.snapshot().await))
}

pub async fn update_auth_settings(
    user: AuthUser,
    Extension(pool): Extension<PgPool>,
    Extension(store): Extension<Arc<AuthSettingsStore>>,
    Json(patch): Json<AuthSettingsPatch>,
) -> AppResult<Json<AuthSettings>> {
    user.require_admin()?;
    let service = SettingsService::new(pool);
    let mut settings = service.auth_settings().await?;
    settings.merge(patch.clone());
    service.save_auth(&settings).await?;
    store.update(patch).await;
    tracing::info!(admin_id = %user.user_id, "auth settings updated");
    Ok(Json(store.snapshot().await))
}

#[derive(Debug, Serialize)]
pub struct GeneratedSecret {
    pub secret: String,
}

pub async fn generate_auth_secret(user: AuthUser) -> AppResult<Json<GeneratedSecret>> {
    user.require_admin()?;
    Ok(Json(GeneratedSecret {
        secret: generate_secret(),
    }))
}

/// Public sign-in options: each enabled provider with its client id. Secrets stay private.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialProviderOption {
    pub provider: SocialProvider,
    pub client_id: String,
}

pub async fn list_social_providers(
    Extension(store): Extension<Arc<AuthSettingsStore>>,
) -> Json<Vec<SocialProviderOption>> {
    let mut options = Vec::new();
    for provider in store.enabled_providers().await {
        let credentials = store.provider_credentials(provider).await;
        options.push(SocialProviderOption {
            provider,
            client_id: credentials.client_id,
        });
    }
    Json(options)
}

fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
