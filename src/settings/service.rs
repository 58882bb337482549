use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

use super::models::{AiSettings, AuthSettings, GeneralSettings};
use crate::error::{AppError, AppResult};

/// The dashboard keeps a single settings row.
const SETTINGS_ROW_ID: i32 = 1;

/// key: settings-service -> settings row access
#[derive(Clone)]
pub struct SettingsService {
    pool: PgPool,
}

impl SettingsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn general(&self) -> AppResult<Option<GeneralSettings>> {
        let document: Option<Value> =
            sqlx::query_scalar("SELECT general FROM settings WHERE id = $1")
                .bind(SETTINGS_ROW_ID)
                .fetch_optional(&self.pool)
                .await?;

        document
            .map(|value| {
                serde_json::from_value(value).map_err(|error| {
                    AppError::Configuration(format!("Invalid settings document: {error}"))
                })
            })
            .transpose()
    }

    pub async fn ai_settings(&self) -> AppResult<Option<AiSettings>> {
        Ok(self.general().await?.and_then(|general| general.ai))
    }

    pub async fn auth_settings(&self) -> AppResult<AuthSettings> {
        Ok(self
            .general()
            .await?
            .and_then(|general| general.auth)
            .unwrap_or_default())
    }

    pub async fn save_ai(&self, settings: &AiSettings) -> AppResult<()> {
        self.save_section("ai", settings).await
    }

    pub async fn save_auth(&self, settings: &AuthSettings) -> AppResult<()> {
        self.save_section("auth", settings).await
    }

    /// Replaces one top-level section of `settings.general`, leaving the others intact.
    async fn save_section<T: Serialize>(&self, section: &str, value: &T) -> AppResult<()> {
        let payload = serde_json::to_value(value)
            .map_err(|error| AppError::Message(format!("Failed to encode settings: {error}")))?;
        sqlx::query(
            r#"
            INSERT INTO settings (id, general, updated_at)
            VALUES ($1, jsonb_build_object($2::text, $3::jsonb), NOW())
            ON CONFLICT (id)
            DO UPDATE SET
                general = settings.general || EXCLUDED.general,
                updated_at = NOW()
            "#,
        )
        .bind(SETTINGS_ROW_ID)
        .bind(section)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
