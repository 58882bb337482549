//! Admin-managed configuration persisted in the `settings` table.

pub mod api;
pub mod models;
pub mod service;
pub mod store;

pub use models::{
    AiSettings, AuthSettings, AuthSettingsPatch, GeneralSettings, ProviderCredentials,
    SocialProvider,
};
pub use service::SettingsService;
pub use store::AuthSettingsStore;
