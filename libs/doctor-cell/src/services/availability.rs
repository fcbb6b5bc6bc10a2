use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use shared_models::time::{day_of_week, parse_time_of_day};

use crate::models::{
    CreateAvailabilityRequest, DoctorAvailability, DoctorError, NewAvailability, WeeklyWindow,
};
use crate::repository::DoctorRepository;

pub struct AvailabilityService {
    doctors: Arc<dyn DoctorRepository>,
}

impl AvailabilityService {
    pub fn new(doctors: Arc<dyn DoctorRepository>) -> Self {
        Self { doctors }
    }

    /// The open hours of `doctor_id` on `day_of_week` (0 = Sunday), or `None`
    /// when the doctor does not work that day.
    ///
    /// Several active rules for one day are not merged: the earliest rule
    /// wins and the rest are reported in the log.
    pub async fn get_weekly_window(
        &self,
        doctor_id: i64,
        day_of_week: i32,
    ) -> Result<Option<WeeklyWindow>, DoctorError> {
        let rules = self.doctors.active_availability_for_day(doctor_id, day_of_week).await?;

        if rules.len() > 1 {
            warn!(
                "Doctor {} has {} active availability rules for day {}; using rule {}",
                doctor_id,
                rules.len(),
                day_of_week,
                rules[0].id
            );
        }

        Ok(rules.first().map(WeeklyWindow::from))
    }

    pub async fn window_for_date(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Option<WeeklyWindow>, DoctorError> {
        self.get_weekly_window(doctor_id, day_of_week(&date)).await
    }

    pub async fn get_doctor_availability(&self, doctor_id: i64) -> Result<Vec<DoctorAvailability>, DoctorError> {
        Ok(self.doctors.list_availability(doctor_id).await?)
    }

    pub async fn create_availability(
        &self,
        doctor_id: i64,
        request: CreateAvailabilityRequest,
    ) -> Result<DoctorAvailability, DoctorError> {
        if !(0..=6).contains(&request.day_of_week) {
            return Err(DoctorError::ValidationError(
                "day_of_week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }

        let start_time = parse_time_of_day(&request.start_time).map_err(DoctorError::ValidationError)?;
        let end_time = parse_time_of_day(&request.end_time).map_err(DoctorError::ValidationError)?;

        if start_time >= end_time {
            return Err(DoctorError::ValidationError("Start time must be before end time".to_string()));
        }

        debug!("Adding availability for doctor {} on day {}", doctor_id, request.day_of_week);

        let rule = self.doctors.create_availability(NewAvailability {
            doctor_id,
            day_of_week: request.day_of_week,
            start_time,
            end_time,
        }).await?;

        Ok(rule)
    }
}
