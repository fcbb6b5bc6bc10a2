use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{StoreError, SupabaseClient};
use shared_models::time::format_time_of_day;

use crate::models::{Doctor, DoctorAvailability, NewAvailability, NewDoctorProfile};
use super::DoctorRepository;

const DOCTOR_SELECT: &str = "select=*,user:users(id,email,first_name,last_name,phone)";

pub struct SupabaseDoctorRepository {
    supabase: SupabaseClient,
}

impl SupabaseDoctorRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub fn with_client(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    async fn fetch_doctors(&self, filter: &str) -> Result<Vec<Doctor>, StoreError> {
        let path = format!("/rest/v1/doctors?{}&{}", DOCTOR_SELECT, filter);
        let doctors: Vec<Doctor> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;
        Ok(doctors)
    }
}

fn sorted_by_name(mut doctors: Vec<Doctor>) -> Vec<Doctor> {
    doctors.sort_by_key(Doctor::name_key);
    doctors
}

#[async_trait]
impl DoctorRepository for SupabaseDoctorRepository {
    async fn find_by_id(&self, doctor_id: i64) -> Result<Option<Doctor>, StoreError> {
        debug!("Fetching doctor {}", doctor_id);
        let doctors = self.fetch_doctors(&format!("id=eq.{}", doctor_id)).await?;
        Ok(doctors.into_iter().next())
    }

    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Doctor>, StoreError> {
        debug!("Fetching doctor profile for user {}", user_id);
        let doctors = self.fetch_doctors(&format!("user_id=eq.{}", user_id)).await?;
        Ok(doctors.into_iter().next())
    }

    async fn list_active(&self) -> Result<Vec<Doctor>, StoreError> {
        let doctors = self.fetch_doctors("is_active=eq.true").await?;
        Ok(sorted_by_name(doctors))
    }

    async fn search_by_specialty(&self, specialty: &str) -> Result<Vec<Doctor>, StoreError> {
        let pattern = urlencoding::encode(specialty);
        let filter = format!("is_active=eq.true&specialty=ilike.*{}*", pattern);
        let doctors = self.fetch_doctors(&filter).await?;
        Ok(sorted_by_name(doctors))
    }

    async fn create_profile(&self, profile: NewDoctorProfile) -> Result<Doctor, StoreError> {
        debug!("Creating doctor profile for user {}", profile.user_id);
        let now = Utc::now().to_rfc3339();
        let row = json!({
            "user_id": profile.user_id,
            "specialty": profile.specialty,
            "experience_years": profile.experience_years,
            "education": profile.education,
            "about": profile.about,
            "consultation_fee": profile.consultation_fee,
            "is_active": true,
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<Doctor> = self.supabase.insert_returning("doctors", row).await?;
        created.into_iter().next()
            .ok_or_else(|| StoreError::Malformed("Insert returned no doctor row".to_string()))
    }

    async fn list_availability(&self, doctor_id: i64) -> Result<Vec<DoctorAvailability>, StoreError> {
        let path = format!(
            "/rest/v1/doctor_availability?doctor_id=eq.{}&order=day_of_week.asc,start_time.asc",
            doctor_id
        );
        let rules: Vec<DoctorAvailability> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;
        Ok(rules)
    }

    async fn active_availability_for_day(
        &self,
        doctor_id: i64,
        day_of_week: i32,
    ) -> Result<Vec<DoctorAvailability>, StoreError> {
        let path = format!(
            "/rest/v1/doctor_availability?doctor_id=eq.{}&day_of_week=eq.{}&is_active=eq.true&order=id.asc",
            doctor_id, day_of_week
        );
        let rules: Vec<DoctorAvailability> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;
        Ok(rules)
    }

    async fn create_availability(&self, rule: NewAvailability) -> Result<DoctorAvailability, StoreError> {
        let row = json!({
            "doctor_id": rule.doctor_id,
            "day_of_week": rule.day_of_week,
            "start_time": format_time_of_day(&rule.start_time),
            "end_time": format_time_of_day(&rule.end_time),
            "is_active": true,
            "created_at": Utc::now().to_rfc3339()
        });

        let created: Vec<DoctorAvailability> =
            self.supabase.insert_returning("doctor_availability", row).await?;
        created.into_iter().next()
            .ok_or_else(|| StoreError::Malformed("Insert returned no availability row".to_string()))
    }
}
