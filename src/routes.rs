use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{auth, billing, invocations, settings};

pub fn api_routes() -> Router {
    Router::new()
        .route("/api/register", post(auth::register_user))
        .route("/api/login", post(auth::login_user))
        .route("/api/logout", post(auth::logout_user))
        .route("/api/me", get(auth::current_user))
        .route(
            "/api/auth/providers",
            get(settings::api::list_social_providers),
        )
        .route(
            "/api/ai/hashtag-generator",
            post(invocations::hashtag_generator),
        )
        .route(
            "/api/ai/image-caption-generator",
            post(invocations::image_caption_generator),
        )
        .route("/api/billing/usage", get(billing::api::current_usage))
        .route(
            "/api/admin/products",
            get(billing::api::list_products).post(billing::api::create_product),
        )
        .route(
            "/api/admin/billing/:user_id",
            put(billing::api::upsert_billing),
        )
        .route(
            "/api/admin/settings/ai",
            get(settings::api::get_ai_settings).put(settings::api::update_ai_settings),
        )
        .route(
            "/api/admin/settings/auth",
            get(settings::api::get_auth_settings).put(settings::api::update_auth_settings),
        )
        .route(
            "/api/admin/settings/auth/secret",
            post(settings::api::generate_auth_secret),
        )
}
