use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use dashboard_api::ai::AiGateway;
use dashboard_api::settings::{AuthSettingsStore, SettingsService, SocialProvider};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

fn admin_token() -> String {
    let claims = json!({"sub": "admin-1", "role": "admin", "exp": 9999999999u64});
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"secret"),
    )
    .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL with Postgres server"]
async fn auth_settings_update_is_persisted_and_served(pool: PgPool) {
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    std::env::set_var("JWT_SECRET", "secret");
    let service = SettingsService::new(pool.clone());
    let store = Arc::new(AuthSettingsStore::load(&service).await.unwrap());
    let gateway = AiGateway::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    let app = dashboard_api::build_app(pool.clone(), store.clone(), gateway);

    let update = Request::builder()
        .method("PUT")
        .uri("/api/admin/settings/auth")
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", admin_token()))
        .body(Body::from(
            json!({
                "enabledProviders": ["github"],
                "providerCredentials": {
                    "github": { "clientId": "gh-client", "clientSecret": "gh-secret" }
                }
            })
            .to_string(),
        ))
        .unwrap();
    let (status, body) = send(app.clone(), update).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabledProviders"], json!(["github"]));

    let providers = Request::builder()
        .uri("/api/auth/providers")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, providers).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "provider": "github", "clientId": "gh-client" }]));

    let persisted = service.auth_settings().await.unwrap();
    assert_eq!(persisted.enabled_providers, vec![SocialProvider::Github]);
    assert_eq!(
        store
            .provider_credentials(SocialProvider::Github)
            .await
            .client_secret,
        "gh-secret"
    );

    let reloaded = AuthSettingsStore::load(&service).await.unwrap();
    assert_eq!(reloaded.snapshot().await, store.snapshot().await);
}
