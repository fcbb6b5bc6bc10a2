use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_role, AuthContext};

use crate::models::{CreateAvailabilityRequest, DoctorError, ProvisionDoctorRequest};
use crate::repository::DoctorRepository;
use crate::services::{AvailabilityService, DoctorService};

/// Shared state for every doctor route.
#[derive(Clone)]
pub struct DoctorState {
    pub auth: AuthContext,
    pub doctors: Arc<dyn DoctorRepository>,
}

impl DoctorState {
    pub fn new(auth: AuthContext, doctors: Arc<dyn DoctorRepository>) -> Self {
        Self { auth, doctors }
    }

    fn doctor_service(&self) -> DoctorService {
        DoctorService::new(self.doctors.clone())
    }

    fn availability_service(&self) -> AvailabilityService {
        AvailabilityService::new(self.doctors.clone())
    }
}

impl From<DoctorError> for AppError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::AlreadyExists => AppError::Conflict(e.to_string()),
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::Store(store) => {
                error!("Doctor store failure: {}", store);
                AppError::Unavailable("Doctor directory is temporarily unavailable".to_string())
            }
        }
    }
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn list_doctors(
    State(state): State<Arc<DoctorState>>,
) -> Result<Json<Value>, AppError> {
    let doctors = state.doctor_service().list_active_doctors().await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

pub async fn search_doctors_by_specialty(
    State(state): State<Arc<DoctorState>>,
    Path(specialty): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctors = state.doctor_service().search_by_specialty(&specialty).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len(),
        "specialty": specialty
    })))
}

pub async fn get_doctor(
    State(state): State<Arc<DoctorState>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.doctor_service().get_doctor(doctor_id).await?;
    Ok(Json(json!(doctor)))
}

pub async fn get_doctor_availability(
    State(state): State<Arc<DoctorState>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    state.doctor_service().get_doctor(doctor_id).await?;
    let availability = state.availability_service().get_doctor_availability(doctor_id).await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "availability": availability
    })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

pub async fn provision_profile(
    State(state): State<Arc<DoctorState>>,
    Extension(user): Extension<User>,
    Json(request): Json<ProvisionDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Doctor)?;

    let doctor = state.doctor_service().provision_profile(user.id, request).await?;
    Ok(Json(json!(doctor)))
}

pub async fn get_my_profile(
    State(state): State<Arc<DoctorState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Doctor)?;

    let doctor = state.doctor_service().get_doctor_for_user(user.id).await?;
    Ok(Json(json!(doctor)))
}

pub async fn get_my_availability(
    State(state): State<Arc<DoctorState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Doctor)?;

    let doctor = state.doctor_service().get_doctor_for_user(user.id).await?;
    let availability = state.availability_service().get_doctor_availability(doctor.id).await?;

    Ok(Json(json!({
        "doctor_id": doctor.id,
        "availability": availability
    })))
}

pub async fn create_my_availability(
    State(state): State<Arc<DoctorState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Doctor)?;

    let doctor = state.doctor_service().get_doctor_for_user(user.id).await?;
    let rule = state.availability_service().create_availability(doctor.id, request).await?;

    Ok(Json(json!(rule)))
}
