use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::extractor::{AuthUser, Claims, SESSION_COOKIE};
use crate::settings::AuthSettingsStore;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::{
    extract::Extension,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::error;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;
const SESSION_HOURS: i64 = 24;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
}

pub async fn register_user(
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<StatusCode> {
    let email = payload.email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation("Password too short".into()));
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::Message(format!("Hashing failed: {}", e)))?;
    // The first account on a fresh install administers the dashboard.
    let result = sqlx::query(
        r#"
        INSERT INTO users (id, email, name, password_hash, role)
        VALUES (
            $1, $2, $3, $4,
            CASE WHEN EXISTS (SELECT 1 FROM users) THEN 'user' ELSE 'admin' END
        )
        RETURNING role
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&email)
    .bind(payload.name.as_deref().map(str::trim).filter(|n| !n.is_empty()))
    .bind(hash.to_string())
    .fetch_one(&pool)
    .await;
    match result {
        Ok(row) => {
            let role: String = row.get("role");
            tracing::info!(%email, %role, "user registered");
            Ok(StatusCode::CREATED)
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("users_email_key") {
                    return Err(AppError::Validation("Email already registered".into()));
                }
            }
            Err(AppError::Db(e))
        }
    }
}

fn origin_allowed(headers: &HeaderMap, trusted_origins: &[String]) -> bool {
    if trusted_origins.is_empty() {
        return true;
    }
    match headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()) {
        Some(origin) => {
            let origin = origin.trim_end_matches('/');
            trusted_origins
                .iter()
                .any(|trusted| trusted.trim_end_matches('/') == origin)
        }
        None => true,
    }
}

pub async fn login_user(
    Extension(pool): Extension<PgPool>,
    Extension(store): Extension<Arc<AuthSettingsStore>>,
    request_headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(HeaderMap, &'static str)> {
    if !origin_allowed(&request_headers, &store.trusted_origins().await) {
        tracing::warn!(origin = ?request_headers.get(header::ORIGIN), "login from untrusted origin");
        return Err(AppError::Forbidden);
    }
    let email = payload.email.trim().to_ascii_lowercase();
    let rec = sqlx::query("SELECT id, password_hash, role, banned FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            error!(?e, "DB error while fetching user");
            AppError::Db(e)
        })?;
    let rec = rec.ok_or(AppError::Unauthorized)?;
    let id: String = rec.get("id");
    let pass_hash: String = rec.get("password_hash");
    let role: String = rec.get("role");
    let banned: bool = rec.get("banned");
    let parsed = PasswordHash::new(&pass_hash).map_err(|e| {
        error!(?e, "Hash parse error");
        AppError::Message(format!("Hash error: {}", e))
    })?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(AppError::Unauthorized);
    }
    if banned {
        tracing::warn!(user_id = %id, "banned user attempted login");
        return Err(AppError::Forbidden);
    }
    let exp = (Utc::now() + Duration::hours(SESSION_HOURS)).timestamp() as usize;
    let claims = Claims { sub: id, role, exp };
    let secret = store.signing_secret().await;
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(?e, "Token encoding error");
        AppError::Message("Token error".into())
    })?;
    let cookie = HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Secure; SameSite=Strict; Path=/"
    ))
    .map_err(|e| AppError::Message(format!("Cookie error: {}", e)))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);
    Ok((headers, "Login successful"))
}

pub async fn logout_user() -> (HeaderMap, &'static str) {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("auth_token=deleted; HttpOnly; Path=/; Max-Age=0"),
    );
    (headers, "Logged out")
}

pub async fn current_user(
    AuthUser { user_id, role }: AuthUser,
    Extension(pool): Extension<PgPool>,
) -> AppResult<Json<UserInfo>> {
    let rec = sqlx::query("SELECT email, name FROM users WHERE id = $1")
        .bind(&user_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            error!(?e, "DB error while fetching user email");
            AppError::Db(e)
        })?;
    let Some(row) = rec else {
        return Err(AppError::NotFound);
    };
    Ok(Json(UserInfo {
        id: user_id,
        email: row.get("email"),
        name: row.get("name"),
        role,
    }))
}
