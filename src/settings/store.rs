use tokio::sync::RwLock;

use super::models::{AuthSettings, AuthSettingsPatch, ProviderCredentials, SocialProvider};
use super::service::SettingsService;
use crate::error::AppResult;

/// key: auth-settings-store -> injected auth configuration
///
/// Built once at startup, shared through an `Extension<Arc<AuthSettingsStore>>`, and
/// refreshed with [`AuthSettingsStore::reload`] whenever the persisted settings change.
#[derive(Debug, Default)]
pub struct AuthSettingsStore {
    auth: RwLock<AuthSettings>,
}

impl AuthSettingsStore {
    pub fn new(settings: AuthSettings) -> Self {
        Self {
            auth: RwLock::new(settings),
        }
    }

    pub async fn load(service: &SettingsService) -> AppResult<Self> {
        let store = Self::default();
        store.reload(service).await?;
        Ok(store)
    }

    /// Replaces the cached settings with the persisted ones.
    pub async fn reload(&self, service: &SettingsService) -> AppResult<()> {
        let fresh = service.auth_settings().await?;
        *self.auth.write().await = fresh;
        tracing::info!("auth settings reloaded");
        Ok(())
    }

    /// Applies a partial update to the cached settings only.
    pub async fn update(&self, patch: AuthSettingsPatch) {
        self.auth.write().await.merge(patch);
    }

    pub async fn snapshot(&self) -> AuthSettings {
        self.auth.read().await.clone()
    }

    pub async fn secret(&self) -> Option<String> {
        let auth = self.auth.read().await;
        let secret = auth.secret.trim();
        (!secret.is_empty()).then(|| secret.to_string())
    }

    pub async fn trusted_origins(&self) -> Vec<String> {
        self.auth.read().await.trusted_origins.clone()
    }

    pub async fn enabled_providers(&self) -> Vec<SocialProvider> {
        self.auth.read().await.enabled_providers.clone()
    }

    pub async fn provider_credentials(&self, provider: SocialProvider) -> ProviderCredentials {
        self.auth
            .read()
            .await
            .provider_credentials
            .get(&provider)
            .cloned()
            .unwrap_or_default()
    }

    /// Secret used to sign and verify session tokens.
    pub async fn signing_secret(&self) -> String {
        match self.secret().await {
            Some(secret) => secret,
            None => crate::config::JWT_SECRET.clone(),
        }
    }
}
