use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::{StoreError, SupabaseClient};
use shared_models::time::{format_time_of_day, hhmm, DATE_FORMAT};

use crate::models::{Appointment, AppointmentStatus, NewAppointment};
use super::AppointmentRepository;

const APPOINTMENT_SELECT: &str = "select=*,patient:users!patient_id(id,email,first_name,last_name,phone)";
const NEWEST_FIRST: &str = "order=appointment_date.desc,appointment_time.desc";

#[derive(Deserialize)]
struct OccupiedRow {
    #[serde(with = "hhmm")]
    appointment_time: NaiveTime,
}

/// Appointments stored in the `appointments` table. The partial unique index
/// `appointments_live_slot_uniq` turns a double booking into a 409 / 23505.
pub struct SupabaseAppointmentRepository {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub fn with_client(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    async fn fetch(&self, filter: &str) -> Result<Vec<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?{}&{}", APPOINTMENT_SELECT, filter);
        let rows: Vec<Appointment> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;
        Ok(rows)
    }
}

#[async_trait]
impl AppointmentRepository for SupabaseAppointmentRepository {
    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let now = Utc::now().to_rfc3339();
        let row = json!({
            "patient_id": appointment.patient_id,
            "doctor_id": appointment.doctor_id,
            "appointment_date": appointment.appointment_date.format(DATE_FORMAT).to_string(),
            "appointment_time": format_time_of_day(&appointment.appointment_time),
            "status": AppointmentStatus::Pending.as_str(),
            "notes": appointment.notes,
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<Appointment> = self.supabase.insert_returning("appointments", row).await
            .map_err(|e| {
                let store_error = StoreError::from(e);
                if let StoreError::UniqueViolation(ref msg) = store_error {
                    debug!("Slot already taken: {}", msg);
                }
                store_error
            })?;

        created.into_iter().next()
            .ok_or_else(|| StoreError::Malformed("Insert returned no appointment row".to_string()))
    }

    async fn find_by_id(&self, appointment_id: i64) -> Result<Option<Appointment>, StoreError> {
        let rows = self.fetch(&format!("id=eq.{}", appointment_id)).await?;
        Ok(rows.into_iter().next())
    }

    async fn occupied_times(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<NaiveTime>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?select=appointment_time&doctor_id=eq.{}&appointment_date=eq.{}&status=neq.cancelled",
            doctor_id,
            date.format(DATE_FORMAT)
        );
        let rows: Vec<OccupiedRow> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;
        Ok(rows.into_iter().map(|row| row.appointment_time).collect())
    }

    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, StoreError> {
        self.fetch(&format!("patient_id=eq.{}&{}", patient_id, NEWEST_FIRST)).await
    }

    async fn list_for_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, StoreError> {
        self.fetch(&format!("doctor_id=eq.{}&{}", doctor_id, NEWEST_FIRST)).await
    }

    async fn update_status(
        &self,
        appointment_id: i64,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<Option<Appointment>, StoreError> {
        let filter = format!("id=eq.{}&status=eq.{}", appointment_id, expected);
        let patch = json!({
            "status": next.as_str(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let updated: Vec<Appointment> = self.supabase.update_returning("appointments", &filter, patch).await?;
        if updated.len() > 1 {
            warn!("Status update for appointment {} touched {} rows", appointment_id, updated.len());
        }
        Ok(updated.into_iter().next())
    }
}
