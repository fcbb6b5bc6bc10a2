use std::sync::Arc;

use tracing::{debug, info};

use shared_database::StoreError;

use crate::models::{Doctor, DoctorError, NewDoctorProfile, ProvisionDoctorRequest};
use crate::repository::DoctorRepository;

pub struct DoctorService {
    doctors: Arc<dyn DoctorRepository>,
}

impl DoctorService {
    pub fn new(doctors: Arc<dyn DoctorRepository>) -> Self {
        Self { doctors }
    }

    /// Any doctor by id, active or not.
    pub async fn get_doctor(&self, doctor_id: i64) -> Result<Doctor, DoctorError> {
        self.doctors.find_by_id(doctor_id).await?
            .ok_or(DoctorError::NotFound)
    }

    /// A doctor that can currently be booked; inactive doctors read as absent.
    pub async fn get_active_doctor(&self, doctor_id: i64) -> Result<Doctor, DoctorError> {
        let doctor = self.get_doctor(doctor_id).await?;
        if !doctor.is_active {
            debug!("Doctor {} exists but is inactive", doctor_id);
            return Err(DoctorError::NotFound);
        }
        Ok(doctor)
    }

    pub async fn list_active_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        Ok(self.doctors.list_active().await?)
    }

    pub async fn search_by_specialty(&self, specialty: &str) -> Result<Vec<Doctor>, DoctorError> {
        let specialty = specialty.trim();
        if specialty.is_empty() {
            return Err(DoctorError::ValidationError("Specialty must not be empty".to_string()));
        }
        Ok(self.doctors.search_by_specialty(specialty).await?)
    }

    pub async fn get_doctor_for_user(&self, user_id: i64) -> Result<Doctor, DoctorError> {
        self.doctors.find_by_user_id(user_id).await?
            .ok_or(DoctorError::NotFound)
    }

    /// Create the doctor profile for a registered doctor user. Missing fields
    /// fall back to the registration defaults.
    pub async fn provision_profile(
        &self,
        user_id: i64,
        request: ProvisionDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        if self.doctors.find_by_user_id(user_id).await?.is_some() {
            return Err(DoctorError::AlreadyExists);
        }

        let defaults = NewDoctorProfile::defaults_for(user_id);
        let profile = NewDoctorProfile {
            user_id,
            specialty: request.specialty
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.specialty),
            experience_years: request.experience_years.unwrap_or(defaults.experience_years),
            education: request.education.unwrap_or(defaults.education),
            about: request.about.unwrap_or(defaults.about),
            consultation_fee: request.consultation_fee.unwrap_or(defaults.consultation_fee),
        };

        if profile.experience_years < 0 {
            return Err(DoctorError::ValidationError("Experience years cannot be negative".to_string()));
        }
        if !profile.consultation_fee.is_finite() || profile.consultation_fee < 0.0 {
            return Err(DoctorError::ValidationError("Consultation fee cannot be negative".to_string()));
        }

        let doctor = self.doctors.create_profile(profile).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => DoctorError::AlreadyExists,
            other => DoctorError::Store(other),
        })?;

        info!("Provisioned doctor profile {} for user {}", doctor.id, user_id);
        Ok(doctor)
    }
}
