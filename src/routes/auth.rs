/**
 * Authentication Routes
 * JWT-based admin authentication with register, login, verify, refresh, and logout
 */
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{self, admins};
use crate::error::ApiError;
use crate::routes::require_pool;

// ============================================================================
// Configuration
// ============================================================================

/// Placeholder secret; `run` refuses to start in production while it is in use.
pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

lazy_static::lazy_static! {
    /// JWT secret key from environment
    pub static ref JWT_SECRET: String = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

    /// Username accepted by the env-credential fallback (no database configured)
    pub static ref ADMIN_USERNAME: String = std::env::var("ADMIN_USERNAME")
        .unwrap_or_else(|_| "poet".to_string());

    /// bcrypt hash for the env-credential fallback. `None` disables the fallback.
    pub static ref ADMIN_PASSWORD_HASH: Option<String> = {
        if let Ok(hash) = std::env::var("ADMIN_HASH_PASSWORD") {
            Some(hash)
        } else if let Ok(plain) = std::env::var("ADMIN_PASSWORD") {
            hash(&plain, DEFAULT_COST).ok()
        } else {
            None
        }
    };

    /// Refresh tokens issued while no database is configured
    pub static ref REFRESH_TOKENS: Arc<RwLock<HashMap<String, RefreshTokenData>>> =
        Arc::new(RwLock::new(HashMap::new()));

    /// Login attempts per IP: (window start, attempts in window)
    static ref LOGIN_ATTEMPTS: Arc<RwLock<HashMap<String, (i64, u32)>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

/// Access token expiry in minutes
const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Refresh token expiry in days
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// Login attempts allowed per IP within one window
const LOGIN_ATTEMPTS_PER_WINDOW: u32 = 5;

const RATE_LIMIT_WINDOW_SECS: i64 = 60;

const ADMIN_ROLE: &str = "admin";

// ============================================================================
// Types
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone)]
pub struct RefreshTokenData {
    pub user_id: String,
    pub username: String,
    pub expires_at: i64,
    pub revoked: bool,
    /// Whether the owning account may still sign in
    pub active: bool,
}

impl RefreshTokenData {
    fn is_usable(&self, now: i64) -> bool {
        self.active && !self.revoked && self.expires_at > now
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserInfo,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub is_valid: bool,
    pub user: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ============================================================================
// Admin extractor
// ============================================================================

/// Verified admin identity. Rejects the request with 401 unless a valid
/// `Authorization: Bearer <access token>` header is present.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub Claims);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authorization required".to_string()))?;

        verify_access_token(&token)
            .map(AdminAuth)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn generate_refresh_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 64)
}

/// SHA-256 of a refresh token; only the digest is stored.
fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn create_access_token(user_id: &str, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES);

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role: ADMIN_ROLE.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
}

pub fn verify_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Sliding bookkeeping for login attempts. Expired windows are evicted on
/// every call so the map only holds currently active IPs.
fn allow_attempt(attempts: &mut HashMap<String, (i64, u32)>, ip: &str, now: i64) -> bool {
    attempts.retain(|_, (start, _)| now - *start < RATE_LIMIT_WINDOW_SECS);

    let entry = attempts.entry(ip.to_string()).or_insert((now, 0));
    if entry.1 >= LOGIN_ATTEMPTS_PER_WINDOW {
        return false;
    }
    entry.1 += 1;
    true
}

/// Drops refresh tokens that can no longer be exchanged.
fn prune_refresh_tokens(tokens: &mut HashMap<String, RefreshTokenData>, now: i64) {
    tokens.retain(|_, data| data.is_usable(now));
}

async fn check_rate_limit(ip: &str) -> bool {
    if cfg!(test) {
        return true;
    }
    let mut attempts = LOGIN_ATTEMPTS.write().await;
    allow_attempt(&mut attempts, ip, Utc::now().timestamp())
}

fn validate_credentials(payload: &Credentials) -> Result<(), ApiError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }
    Ok(())
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials. Please try again.".to_string())
}

async fn bcrypt_hash(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash(&password, DEFAULT_COST))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {}", e)))?
        .map_err(|_| ApiError::Internal("Failed to process password".to_string()))
}

/// bcrypt is CPU-bound; keep it off the async executor.
async fn bcrypt_verify(password: String, password_hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify(&password, &password_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

/// Issues an access token and a fresh refresh token, persisting the latter.
async fn issue_tokens(user_id: &str, username: &str) -> Result<(String, String), ApiError> {
    let access_token = create_access_token(user_id, username)
        .map_err(|e| ApiError::Internal(format!("Failed to create token: {}", e)))?;

    let refresh_token = generate_refresh_token();
    let token_hash = hash_refresh_token(&refresh_token);
    let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS);

    match (db::get_pool(), Uuid::parse_str(user_id)) {
        (Some(pool), Ok(uid)) if !uid.is_nil() => {
            admins::insert_refresh_token(&pool, uid, &token_hash, expires_at)
                .await
                .map_err(|e| ApiError::database("Failed to create session", e))?;
        }
        _ => {
            let mut tokens = REFRESH_TOKENS.write().await;
            prune_refresh_tokens(&mut tokens, Utc::now().timestamp());
            tokens.insert(
                token_hash,
                RefreshTokenData {
                    user_id: user_id.to_string(),
                    username: username.to_string(),
                    expires_at: expires_at.timestamp(),
                    revoked: false,
                    active: true,
                },
            );
        }
    }

    Ok((access_token, refresh_token))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
/// Creates the first admin account; closed once any admin exists.
pub async fn register(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    if !check_rate_limit(&addr.ip().to_string()).await {
        return Err(ApiError::TooManyRequests);
    }
    validate_credentials(&payload)?;

    if payload.password.len() < 8 {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters long",
        ));
    }

    let pool = require_pool()?;

    let existing = admins::count(&pool)
        .await
        .map_err(|e| ApiError::database("Failed to check existing admins", e))?;
    if existing > 0 {
        return Err(ApiError::Conflict(
            "Registration is closed. An admin account already exists.".to_string(),
        ));
    }

    let password_hash = bcrypt_hash(payload.password).await?;
    let username = payload.username.trim().to_string();

    let admin = admins::insert_first(&pool, &username, &password_hash)
        .await
        .map_err(|e| ApiError::database("Failed to create account", e))?
        .ok_or_else(|| {
            ApiError::Conflict(
                "Registration is closed. An admin account already exists.".to_string(),
            )
        })?;

    tracing::info!(username = %admin.username, "admin account registered");

    Ok((
        StatusCode::CREATED,
        Json(UserInfo {
            user_id: admin.id.to_string(),
            username: admin.username,
            role: ADMIN_ROLE.to_string(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let ip = addr.ip().to_string();

    if !check_rate_limit(&ip).await {
        return Err(ApiError::TooManyRequests);
    }
    validate_credentials(&payload)?;

    // Database accounts first; env credentials only when no database is configured.
    let (user_id, username) = match db::get_pool() {
        Some(pool) => {
            let admin = admins::find_by_username(&pool, &payload.username)
                .await
                .map_err(|e| ApiError::database("Authentication service temporarily unavailable", e))?
                .ok_or_else(|| {
                    tracing::warn!(username = %payload.username, "login attempt for unknown user");
                    invalid_credentials()
                })?;

            if !admin.is_active {
                return Err(ApiError::Unauthorized("Account is disabled.".to_string()));
            }

            if !bcrypt_verify(payload.password, admin.password_hash.clone()).await {
                if let Err(e) = admins::record_failed_login(&pool, admin.id).await {
                    tracing::error!("Failed to record failed login: {}", e);
                }
                tracing::warn!(username = %admin.username, "failed login attempt");
                return Err(invalid_credentials());
            }

            if let Err(e) = admins::record_login(&pool, admin.id, &ip).await {
                tracing::error!("Failed to record login metadata: {}", e);
            }

            (admin.id.to_string(), admin.username)
        }
        None => {
            let username_matches =
                payload.username.trim().eq_ignore_ascii_case(ADMIN_USERNAME.as_str());
            let password_matches = match ADMIN_PASSWORD_HASH.as_ref() {
                Some(h) => bcrypt_verify(payload.password, h.clone()).await,
                None => false,
            };
            if !username_matches || !password_matches {
                return Err(invalid_credentials());
            }
            (Uuid::nil().to_string(), ADMIN_USERNAME.clone())
        }
    };

    let (access_token, refresh_token) = issue_tokens(&user_id, &username).await?;

    tracing::info!(username = %username, "successful login");

    Ok(Json(LoginResponse {
        user: UserInfo {
            user_id,
            username,
            role: ADMIN_ROLE.to_string(),
        },
        access_token,
        refresh_token,
    }))
}

/// POST /api/auth/verify
/// Always 200; the body says whether the bearer token is valid.
pub async fn verify_token(headers: HeaderMap) -> Json<VerifyResponse> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Json(VerifyResponse {
            is_valid: false,
            user: None,
            error: Some("No authorization token provided".to_string()),
        });
    };

    match verify_access_token(&token) {
        Ok(claims) => Json(VerifyResponse {
            is_valid: true,
            user: Some(UserInfo {
                user_id: claims.sub,
                username: claims.username,
                role: claims.role,
            }),
            error: None,
        }),
        Err(e) => {
            tracing::debug!("Token verification failed: {}", e);
            Json(VerifyResponse {
                is_valid: false,
                user: None,
                error: Some("Invalid or expired token".to_string()),
            })
        }
    }
}

/// POST /api/auth/refresh
/// Exchanges a refresh token for a new access token and rotates the refresh token.
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> Result<Json<RefreshResponse>, ApiError> {
    if payload.refresh_token.is_empty() {
        return Err(ApiError::bad_request("Refresh token is required"));
    }

    let token_hash = hash_refresh_token(&payload.refresh_token);
    let now = Utc::now().timestamp();

    let stored = match db::get_pool() {
        Some(pool) => match admins::find_refresh_token(&pool, &token_hash).await {
            Ok(Some((user_id, username, expires_at, revoked, active))) => {
                Some(RefreshTokenData {
                    user_id: user_id.to_string(),
                    username,
                    expires_at: expires_at.timestamp(),
                    revoked,
                    active,
                })
            }
            Ok(None) => REFRESH_TOKENS.read().await.get(&token_hash).cloned(),
            Err(e) => {
                tracing::error!("DB error during token refresh lookup: {}", e);
                REFRESH_TOKENS.read().await.get(&token_hash).cloned()
            }
        },
        None => REFRESH_TOKENS.read().await.get(&token_hash).cloned(),
    };

    let data = match stored {
        Some(data) if data.is_usable(now) => data,
        Some(data) if !data.active => {
            tracing::warn!(username = %data.username, "refresh attempt for disabled account");
            return Err(ApiError::Unauthorized("Account is disabled.".to_string()));
        }
        _ => {
            return Err(ApiError::Unauthorized(
                "Invalid or expired refresh token".to_string(),
            ))
        }
    };

    if let Some(pool) = db::get_pool() {
        if let Err(e) = admins::revoke_refresh_token(&pool, &token_hash).await {
            tracing::error!("Failed to revoke rotated refresh token: {}", e);
        }
    }
    if let Some(old) = REFRESH_TOKENS.write().await.get_mut(&token_hash) {
        old.revoked = true;
    }

    let (access_token, refresh_token) = issue_tokens(&data.user_id, &data.username).await?;

    Ok(Json(RefreshResponse {
        access_token,
        refresh_token,
    }))
}

/// POST /api/auth/logout
/// Revokes the given refresh token, and every refresh token of the bearer's account.
/// Idempotent: always succeeds.
pub async fn logout(headers: HeaderMap, Json(payload): Json<LogoutRequest>) -> Json<LogoutResponse> {
    let pool = db::get_pool();

    if let Some(refresh_token) = payload.refresh_token {
        let token_hash = hash_refresh_token(&refresh_token);
        if let Some(ref p) = pool {
            if let Err(e) = admins::revoke_refresh_token(p, &token_hash).await {
                tracing::error!("Failed to revoke refresh token: {}", e);
            }
        }
        if let Some(data) = REFRESH_TOKENS.write().await.get_mut(&token_hash) {
            data.revoked = true;
        }
    }

    if let Some(claims) = extract_bearer_token(&headers).and_then(|t| verify_access_token(&t).ok()) {
        if let (Some(ref p), Ok(uid)) = (&pool, Uuid::parse_str(&claims.sub)) {
            if let Err(e) = admins::revoke_all_refresh_tokens(p, uid).await {
                tracing::error!("Failed to revoke refresh tokens: {}", e);
            }
        }
        let mut tokens = REFRESH_TOKENS.write().await;
        for data in tokens.values_mut() {
            if data.user_id == claims.sub {
                data.revoked = true;
            }
        }
    }

    Json(LogoutResponse { success: true })
}
