use std::sync::Arc;

use tracing::{debug, info, warn};

use doctor_cell::repository::DoctorRepository;
use shared_models::auth::User;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::repository::AppointmentRepository;
use crate::services::doctor_id_for;

/// Statuses reachable from `current`. Terminal states allow nothing and no
/// state leads back to `pending`.
pub fn get_valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    match current {
        AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
        AppointmentStatus::Confirmed => &[AppointmentStatus::Completed, AppointmentStatus::Cancelled],
        AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
    }
}

pub fn validate_status_transition(
    current: AppointmentStatus,
    next: AppointmentStatus,
) -> Result<(), AppointmentError> {
    if !get_valid_transitions(current).contains(&next) {
        warn!("Invalid status transition attempted: {} -> {}", current, next);
        return Err(AppointmentError::InvalidTransition {
            from: current,
            to: next.to_string(),
        });
    }
    Ok(())
}

pub struct AppointmentLifecycleService {
    appointments: Arc<dyn AppointmentRepository>,
    doctors: Arc<dyn DoctorRepository>,
}

impl AppointmentLifecycleService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>, doctors: Arc<dyn DoctorRepository>) -> Self {
        Self { appointments, doctors }
    }

    /// Move an appointment to `new_status` on behalf of its doctor.
    pub async fn transition(
        &self,
        appointment_id: i64,
        actor: &User,
        new_status: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.appointments.find_by_id(appointment_id).await?
            .ok_or_else(|| AppointmentError::NotFound("Appointment".to_string()))?;

        let actor_doctor_id = doctor_id_for(self.doctors.as_ref(), actor).await?;
        if actor_doctor_id != appointment.doctor_id {
            return Err(AppointmentError::AccessDenied(
                "Only the assigned doctor can change this appointment".to_string(),
            ));
        }

        let next: AppointmentStatus = new_status.parse().map_err(|_| AppointmentError::InvalidTransition {
            from: appointment.status,
            to: new_status.to_string(),
        })?;

        validate_status_transition(appointment.status, next)?;

        debug!("Moving appointment {} from {} to {}", appointment_id, appointment.status, next);

        match self.appointments.update_status(appointment_id, appointment.status, next).await? {
            Some(updated) => {
                info!("Appointment {} is now {}", appointment_id, next);
                Ok(updated)
            }
            None => {
                // Someone else changed the status after we read it.
                let current = self.appointments.find_by_id(appointment_id).await?
                    .ok_or_else(|| AppointmentError::NotFound("Appointment".to_string()))?;
                warn!(
                    "Concurrent update on appointment {}: expected {}, found {}",
                    appointment_id, appointment.status, current.status
                );
                Err(AppointmentError::InvalidTransition {
                    from: current.status,
                    to: next.to_string(),
                })
            }
        }
    }
}
