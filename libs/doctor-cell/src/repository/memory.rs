use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use shared_database::StoreError;

use crate::models::{Doctor, DoctorAvailability, NewAvailability, NewDoctorProfile, UserProfile};
use super::DoctorRepository;

#[derive(Default)]
struct DoctorTables {
    users: HashMap<i64, UserProfile>,
    doctors: Vec<Doctor>,
    availability: Vec<DoctorAvailability>,
    next_doctor_id: i64,
    next_availability_id: i64,
}

/// Process-local doctor directory for development and tests.
#[derive(Default)]
pub struct InMemoryDoctorRepository {
    tables: RwLock<DoctorTables>,
}

impl InMemoryDoctorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a user's profile available for embedding in doctor rows.
    pub async fn register_user(&self, profile: UserProfile) {
        let mut tables = self.tables.write().await;
        let user_id = profile.id;
        for doctor in tables.doctors.iter_mut().filter(|d| d.user_id == user_id) {
            doctor.user = Some(profile.clone());
        }
        tables.users.insert(user_id, profile);
    }

    pub async fn set_active(&self, doctor_id: i64, is_active: bool) -> bool {
        let mut tables = self.tables.write().await;
        match tables.doctors.iter_mut().find(|d| d.id == doctor_id) {
            Some(doctor) => {
                doctor.is_active = is_active;
                doctor.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn set_rule_active(&self, availability_id: i64, is_active: bool) -> bool {
        let mut tables = self.tables.write().await;
        match tables.availability.iter_mut().find(|r| r.id == availability_id) {
            Some(rule) => {
                rule.is_active = is_active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl DoctorRepository for InMemoryDoctorRepository {
    async fn find_by_id(&self, doctor_id: i64) -> Result<Option<Doctor>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.iter().find(|d| d.id == doctor_id).cloned())
    }

    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Doctor>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.iter().find(|d| d.user_id == user_id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Doctor>, StoreError> {
        let tables = self.tables.read().await;
        let mut doctors: Vec<Doctor> = tables.doctors.iter()
            .filter(|d| d.is_active)
            .cloned()
            .collect();
        doctors.sort_by_key(Doctor::name_key);
        Ok(doctors)
    }

    async fn search_by_specialty(&self, specialty: &str) -> Result<Vec<Doctor>, StoreError> {
        let needle = specialty.to_lowercase();
        let mut doctors = self.list_active().await?;
        doctors.retain(|d| d.specialty.to_lowercase().contains(&needle));
        Ok(doctors)
    }

    async fn create_profile(&self, profile: NewDoctorProfile) -> Result<Doctor, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.doctors.iter().any(|d| d.user_id == profile.user_id) {
            return Err(StoreError::UniqueViolation(format!(
                "doctor profile for user {} already exists",
                profile.user_id
            )));
        }

        tables.next_doctor_id += 1;
        let now = Utc::now();
        let doctor = Doctor {
            id: tables.next_doctor_id,
            user_id: profile.user_id,
            specialty: profile.specialty,
            experience_years: profile.experience_years,
            education: profile.education,
            about: profile.about,
            consultation_fee: profile.consultation_fee,
            is_active: true,
            created_at: now,
            updated_at: now,
            user: tables.users.get(&profile.user_id).cloned(),
        };
        tables.doctors.push(doctor.clone());
        Ok(doctor)
    }

    async fn list_availability(&self, doctor_id: i64) -> Result<Vec<DoctorAvailability>, StoreError> {
        let tables = self.tables.read().await;
        let mut rules: Vec<DoctorAvailability> = tables.availability.iter()
            .filter(|r| r.doctor_id == doctor_id)
            .cloned()
            .collect();
        rules.sort_by_key(|r| (r.day_of_week, r.start_time));
        Ok(rules)
    }

    async fn active_availability_for_day(
        &self,
        doctor_id: i64,
        day_of_week: i32,
    ) -> Result<Vec<DoctorAvailability>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.availability.iter()
            .filter(|r| r.doctor_id == doctor_id && r.day_of_week == day_of_week && r.is_active)
            .cloned()
            .collect())
    }

    async fn create_availability(&self, rule: NewAvailability) -> Result<DoctorAvailability, StoreError> {
        let mut tables = self.tables.write().await;
        tables.next_availability_id += 1;
        let availability = DoctorAvailability {
            id: tables.next_availability_id,
            doctor_id: rule.doctor_id,
            day_of_week: rule.day_of_week,
            start_time: rule.start_time,
            end_time: rule.end_time,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.availability.push(availability.clone());
        Ok(availability)
    }
}
