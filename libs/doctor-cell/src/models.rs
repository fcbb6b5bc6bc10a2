use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, NaiveTime};

use shared_database::StoreError;
use shared_models::time::hhmm;

pub const DEFAULT_SPECIALTY: &str = "General Practice";
pub const DEFAULT_CONSULTATION_FEE: f64 = 50.00;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub user_id: i64,
    pub specialty: String,
    pub experience_years: i32,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub about: String,
    pub consultation_fee: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl Doctor {
    pub fn display_name(&self) -> String {
        match &self.user {
            Some(user) => format!("Dr. {}", user.full_name()),
            None => format!("Doctor #{}", self.id),
        }
    }

    /// Sort key used for directory listings: first name, last name, then id.
    pub fn name_key(&self) -> (String, String, i64) {
        match &self.user {
            Some(user) => (user.first_name.clone(), user.last_name.clone(), self.id),
            None => (String::new(), String::new(), self.id),
        }
    }
}

/// A recurring weekly rule: the doctor is open on `day_of_week`
/// (0 = Sunday) from `start_time` until `end_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorAvailability {
    pub id: i64,
    pub doctor_id: i64,
    pub day_of_week: i32,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// The open hours resolved for one doctor on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl From<&DoctorAvailability> for WeeklyWindow {
    fn from(rule: &DoctorAvailability) -> Self {
        Self {
            start: rule.start_time,
            end: rule.end_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDoctorProfile {
    pub user_id: i64,
    pub specialty: String,
    pub experience_years: i32,
    pub education: String,
    pub about: String,
    pub consultation_fee: f64,
}

impl NewDoctorProfile {
    /// Profile created for a freshly registered doctor.
    pub fn defaults_for(user_id: i64) -> Self {
        Self {
            user_id,
            specialty: DEFAULT_SPECIALTY.to_string(),
            experience_years: 0,
            education: String::new(),
            about: String::new(),
            consultation_fee: DEFAULT_CONSULTATION_FEE,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionDoctorRequest {
    pub specialty: Option<String>,
    pub experience_years: Option<i32>,
    pub education: Option<String>,
    pub about: Option<String>,
    pub consultation_fee: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAvailability {
    pub doctor_id: i64,
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor profile already exists for this user")]
    AlreadyExists,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
