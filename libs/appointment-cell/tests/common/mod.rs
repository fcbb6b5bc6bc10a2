#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, Weekday};

use appointment_cell::models::BookAppointmentRequest;
use appointment_cell::repository::InMemoryAppointmentRepository;
use appointment_cell::AppointmentState;
use doctor_cell::models::{CreateAvailabilityRequest, ProvisionDoctorRequest, UserProfile};
use doctor_cell::repository::InMemoryDoctorRepository;
use doctor_cell::services::{AvailabilityService, DoctorService};
use shared_models::auth::User;
use shared_utils::extractor::AuthContext;
use shared_utils::session::MemorySessionStore;
use shared_utils::test_utils::{TestConfig, TestUser};

pub struct Clinic {
    pub config: TestConfig,
    pub doctors: Arc<InMemoryDoctorRepository>,
    pub appointments: Arc<InMemoryAppointmentRepository>,
    pub state: AppointmentState,
}

/// A seeded doctor: the login user plus the profile id.
pub struct SeededDoctor {
    pub login: TestUser,
    pub user: User,
    pub doctor_id: i64,
}

impl Clinic {
    pub fn new() -> Self {
        let config = TestConfig::default();
        let doctors = Arc::new(InMemoryDoctorRepository::new());
        let appointments = Arc::new(InMemoryAppointmentRepository::new());
        let auth = AuthContext::new(config.to_arc(), Arc::new(MemorySessionStore::new()));
        let state = AppointmentState::new(auth, doctors.clone(), appointments.clone());

        Self {
            config,
            doctors,
            appointments,
            state,
        }
    }

    pub async fn doctor(&self, email: &str, first_name: &str, last_name: &str) -> SeededDoctor {
        let login = TestUser::doctor(email);
        self.doctors.register_user(UserProfile {
            id: login.id,
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            phone: None,
        }).await;

        let doctor = DoctorService::new(self.doctors.clone())
            .provision_profile(login.id, ProvisionDoctorRequest::default())
            .await
            .unwrap();

        SeededDoctor {
            user: login.to_user(),
            login,
            doctor_id: doctor.id,
        }
    }

    pub async fn open_hours(&self, doctor_id: i64, day_of_week: i32, start: &str, end: &str) {
        AvailabilityService::new(self.doctors.clone())
            .create_availability(doctor_id, CreateAvailabilityRequest {
                day_of_week,
                start_time: start.to_string(),
                end_time: end.to_string(),
            })
            .await
            .unwrap();
    }

    pub async fn patient(&self, email: &str) -> (TestUser, User) {
        let login = TestUser::patient(email);
        self.appointments.register_patient(UserProfile {
            id: login.id,
            email: email.to_string(),
            first_name: "Pat".to_string(),
            last_name: "Ient".to_string(),
            phone: None,
        }).await;
        let user = login.to_user();
        (login, user)
    }
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// The first Monday strictly after today.
pub fn next_monday() -> NaiveDate {
    let today = Local::now().date_naive();
    (1..=7)
        .map(|offset| today + Duration::days(offset))
        .find(|date| date.weekday() == Weekday::Mon)
        .unwrap()
}

pub fn request(doctor_id: i64, date: NaiveDate, time: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id,
        appointment_date: date.format("%Y-%m-%d").to_string(),
        appointment_time: time.to_string(),
        notes: None,
    }
}
