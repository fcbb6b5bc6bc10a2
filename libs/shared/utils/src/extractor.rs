use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
    body::Body,
};
use headers::{Cookie, HeaderMapExt};
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::jwt::{looks_like_jwt, validate_token};
use crate::session::SessionStore;

pub const SESSION_COOKIE: &str = "session_token";

/// Everything the auth middleware needs to turn a request into a `User`.
#[derive(Clone)]
pub struct AuthContext {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AuthContext {
    pub fn new(config: Arc<AppConfig>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { config, sessions }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.config.session_ttl_seconds)
    }

    /// Resolve either an identity JWT or an opaque session token.
    pub async fn resolve_token(&self, token: &str) -> Result<User, AppError> {
        if looks_like_jwt(token) {
            return validate_token(token, &self.config.supabase_jwt_secret)
                .map_err(AppError::Auth);
        }

        match self.sessions.get(token).await {
            Ok(Some(session)) => Ok(session.to_user()),
            Ok(None) => Err(AppError::Auth("Session expired or not found".to_string())),
            Err(e) => {
                error!("Session lookup failed: {}", e);
                Err(AppError::Unavailable("Session store unavailable".to_string()))
            }
        }
    }
}

/// Bearer token if present, otherwise the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    if let Some(auth_header) = headers.get("Authorization") {
        let auth_value = auth_header
            .to_str()
            .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

        return match auth_value.strip_prefix("Bearer ") {
            Some(token) if !token.is_empty() => Ok(Some(token.to_string())),
            _ => Err(AppError::Auth("Invalid authorization header format".to_string())),
        };
    }

    Ok(headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_owned)))
}

pub async fn auth_middleware(
    State(auth): State<AuthContext>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers())?
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let user = auth.resolve_token(&token).await?;
    debug!("Authenticated user {} as {}", user.id, user.role);

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn require_role(user: &User, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden(format!(
            "This action requires the {} role",
            role
        )));
    }
    Ok(())
}
