use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::extractor::{auth_middleware, AuthContext};

use crate::handlers;

pub fn auth_routes(auth: AuthContext) -> Router {
    let public_routes = Router::new()
        .route("/validate", post(handlers::validate_token))
        .route("/sessions", post(handlers::create_session).delete(handlers::end_session));

    let protected_routes = Router::new()
        .route("/me", get(handlers::me))
        .layer(middleware::from_fn_with_state(auth.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(auth)
}
