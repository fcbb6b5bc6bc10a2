use axum::{
    extract::{Extension, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::json;
use tracing::{debug, error, info};
use uuid::Uuid;

use shared_models::auth::{SessionResponse, TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::{extract_token, AuthContext, SESSION_COOKIE};
use shared_utils::jwt::{looks_like_jwt, validate_token as validate_jwt};
use shared_utils::session::SessionData;

fn session_cookie(token: &str, max_age_seconds: u64) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    ))
    .map_err(|e| AppError::Internal(format!("Invalid cookie value: {}", e)))
}

fn identity_from_bearer(auth: &AuthContext, bearer: &Bearer) -> Result<User, AppError> {
    let token = bearer.token();
    if !looks_like_jwt(token) {
        return Err(AppError::Auth("Expected an identity token".to_string()));
    }
    validate_jwt(token, &auth.config.supabase_jwt_secret).map_err(AppError::Auth)
}

pub async fn validate_token(
    State(auth): State<AuthContext>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let user = identity_from_bearer(&auth, &bearer)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

/// Exchange an identity token for an opaque session token, also set as an
/// `HttpOnly` cookie.
pub async fn create_session(
    State(auth): State<AuthContext>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Response, AppError> {
    let user = identity_from_bearer(&auth, &bearer)?;

    let token = Uuid::new_v4().to_string();
    let ttl = auth.session_ttl();
    let session = SessionData::for_user(&user, ttl);
    let expires_at = session.expires_at;

    auth.sessions.set(&token, session, ttl).await.map_err(|e| {
        error!("Failed to store session: {}", e);
        AppError::Unavailable("Session store unavailable".to_string())
    })?;

    info!("Session opened for user {}", user.id);

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, session_cookie(&token, ttl.as_secs())?);

    let body = SessionResponse {
        session_token: token,
        expires_at,
        user_id: user.id,
        role: user.role,
    };

    Ok((headers, Json(body)).into_response())
}

/// Revoke the caller's session token and clear the cookie. Identity tokens
/// are stateless, so presenting one only clears the cookie.
pub async fn end_session(
    State(auth): State<AuthContext>,
    request_headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = extract_token(&request_headers)?
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    if !looks_like_jwt(&token) {
        auth.sessions.delete(&token).await.map_err(|e| {
            error!("Failed to revoke session: {}", e);
            AppError::Unavailable("Session store unavailable".to_string())
        })?;
        info!("Session closed");
    }

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, session_cookie("", 0)?);

    Ok((headers, Json(json!({ "success": true }))).into_response())
}

pub async fn me(
    Extension(user): Extension<User>,
) -> Json<User> {
    Json(user)
}
