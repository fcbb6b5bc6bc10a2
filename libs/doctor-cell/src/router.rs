use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, DoctorState};

pub fn doctor_routes(state: Arc<DoctorState>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/specialty/{specialty}", get(handlers::search_doctors_by_specialty))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/availability", get(handlers::get_doctor_availability));

    // Static segments take precedence over `/{doctor_id}` in axum's matcher.
    let protected_routes = Router::new()
        .route("/profile", post(handlers::provision_profile))
        .route("/me", get(handlers::get_my_profile))
        .route("/me/availability", get(handlers::get_my_availability).post(handlers::create_my_availability))
        .layer(middleware::from_fn_with_state(state.auth.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
