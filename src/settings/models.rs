use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// key: settings-general -> `settings.general` JSONB document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai: Option<AiSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSettings>,
}

/// key: settings-ai -> provider credentials and model allow-list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub enabled_models: Vec<String>,
}

impl AiSettings {
    /// API key with surrounding whitespace removed, or `None` when blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn enabled_models(&self) -> impl Iterator<Item = &str> {
        self.enabled_models
            .iter()
            .map(|model| model.trim())
            .filter(|model| !model.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialProvider {
    Apple,
    Discord,
    Facebook,
    Github,
    Google,
    Microsoft,
    Twitter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

/// key: settings-auth -> session secret, origins and social sign-in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub trusted_origins: Vec<String>,
    #[serde(default)]
    pub enabled_providers: Vec<SocialProvider>,
    #[serde(default)]
    pub provider_credentials: BTreeMap<SocialProvider, ProviderCredentials>,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettingsPatch {
    pub secret: Option<String>,
    pub trusted_origins: Option<Vec<String>>,
    pub enabled_providers: Option<Vec<SocialProvider>>,
    pub provider_credentials: Option<BTreeMap<SocialProvider, ProviderCredentials>>,
}

impl AuthSettings {
    pub fn merge(&mut self, patch: AuthSettingsPatch) {
        if let Some(secret) = patch.secret {
            self.secret = secret;
        }
        if let Some(origins) = patch.trusted_origins {
            self.trusted_origins = origins;
        }
        if let Some(providers) = patch.enabled_providers {
            self.enabled_providers = providers;
        }
        if let Some(credentials) = patch.provider_credentials {
            self.provider_credentials = credentials;
        }
    }
}
