use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
    http::StatusCode,
    Json,
};
use chrono::Duration;
use serde_json::{json, Value};
use tracing::error;

use doctor_cell::repository::DoctorRepository;
use doctor_cell::services::{AvailabilityService, DoctorService};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::time::{day_of_week, format_time_of_day, parse_date};
use shared_utils::extractor::AuthContext;

use crate::models::{AppointmentError, AvailableSlotsResponse, BookAppointmentRequest, UpdateStatusRequest};
use crate::repository::AppointmentRepository;
use crate::services::{
    AppointmentBookingService, AppointmentLifecycleService, AppointmentQueryService, SlotService,
};

#[derive(Clone)]
pub struct AppointmentState {
    pub auth: AuthContext,
    pub doctors: Arc<dyn DoctorRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub slot_stride: Duration,
}

impl AppointmentState {
    pub fn new(
        auth: AuthContext,
        doctors: Arc<dyn DoctorRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        let slot_stride = Duration::minutes(i64::from(auth.config.slot_stride_minutes));
        Self {
            auth,
            doctors,
            appointments,
            slot_stride,
        }
    }

    pub fn slot_service(&self) -> SlotService {
        SlotService::new(
            AvailabilityService::new(self.doctors.clone()),
            self.appointments.clone(),
            self.slot_stride,
        )
    }

    pub fn booking_service(&self) -> AppointmentBookingService {
        AppointmentBookingService::new(
            DoctorService::new(self.doctors.clone()),
            self.slot_service(),
            self.appointments.clone(),
        )
    }

    pub fn lifecycle_service(&self) -> AppointmentLifecycleService {
        AppointmentLifecycleService::new(self.appointments.clone(), self.doctors.clone())
    }

    pub fn query_service(&self) -> AppointmentQueryService {
        AppointmentQueryService::new(self.appointments.clone(), self.doctors.clone())
    }
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::NotFound(_) => AppError::NotFound(e.to_string()),
            AppointmentError::AccessDenied(msg) => AppError::Forbidden(msg),
            AppointmentError::SlotUnavailable => AppError::Conflict(
                "This slot was just booked by someone else; fetch the available slots again and pick another".to_string(),
            ),
            AppointmentError::InvalidTransition { .. } => AppError::InvalidTransition(e.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::Unavailable(msg) => {
                error!("Appointment store failure: {}", msg);
                AppError::Unavailable("Appointment store is temporarily unavailable".to_string())
            }
        }
    }
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn get_available_slots(
    State(state): State<Arc<AppointmentState>>,
    Path((doctor_id, date)): Path<(i64, String)>,
) -> Result<Json<AvailableSlotsResponse>, AppError> {
    let date = parse_date(&date).map_err(AppError::ValidationError)?;

    DoctorService::new(state.doctors.clone())
        .get_active_doctor(doctor_id)
        .await
        .map_err(AppointmentError::from)?;

    let slots = state.slot_service().generate_slots(doctor_id, date).await?;

    Ok(Json(AvailableSlotsResponse {
        doctor_id,
        date,
        day_of_week: day_of_week(&date),
        slots: slots.iter().map(format_time_of_day).collect(),
    }))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

pub async fn book_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state.booking_service().book_appointment(&user, request).await?;
    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

pub async fn get_my_appointments(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.query_service().patient_appointments(&user).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn get_doctor_schedule(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.query_service().doctor_schedule(&user).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn get_schedule_summary(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let summary = state.query_service().schedule_summary(&user).await?;
    Ok(Json(json!(summary)))
}

pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.query_service().get_appointment(appointment_id, &user).await?;
    Ok(Json(json!(appointment)))
}

pub async fn update_appointment_status(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.lifecycle_service()
        .transition(appointment_id, &user, &request.status)
        .await?;
    Ok(Json(json!(appointment)))
}
