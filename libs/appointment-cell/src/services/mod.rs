pub mod booking;
pub mod lifecycle;
pub mod query;
pub mod slots;

pub use booking::AppointmentBookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use query::AppointmentQueryService;
pub use slots::SlotService;

use doctor_cell::repository::DoctorRepository;
use shared_models::auth::User;

use crate::models::AppointmentError;

/// Doctor profile id of a doctor-role caller.
pub(crate) async fn doctor_id_for(doctors: &dyn DoctorRepository, user: &User) -> Result<i64, AppointmentError> {
    if !user.is_doctor() {
        return Err(AppointmentError::AccessDenied("Only doctors manage appointments".to_string()));
    }

    doctors.find_by_user_id(user.id).await?
        .map(|doctor| doctor.id)
        .ok_or_else(|| AppointmentError::AccessDenied("No doctor profile for this user".to_string()))
}
