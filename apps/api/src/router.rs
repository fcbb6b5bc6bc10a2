use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};
use tracing::{info, warn};

use appointment_cell::repository::{
    AppointmentRepository, InMemoryAppointmentRepository, SupabaseAppointmentRepository,
};
use appointment_cell::{appointment_routes, AppointmentState};
use auth_cell::auth_routes;
use doctor_cell::repository::{DoctorRepository, InMemoryDoctorRepository, SupabaseDoctorRepository};
use doctor_cell::{doctor_routes, DoctorState};
use shared_config::{AppConfig, StoreBackend};
use shared_utils::extractor::AuthContext;
use shared_utils::session::{MemorySessionStore, RedisSessionStore, SessionStore};

/// Stores every cell shares for the life of the process.
pub struct Stores {
    pub doctors: Arc<dyn DoctorRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Stores {
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let (doctors, appointments): (Arc<dyn DoctorRepository>, Arc<dyn AppointmentRepository>) =
            match config.store_backend {
                StoreBackend::Supabase => {
                    info!("Using Supabase store at {}", config.supabase_url);
                    (
                        Arc::new(SupabaseDoctorRepository::new(config)),
                        Arc::new(SupabaseAppointmentRepository::new(config)),
                    )
                }
                StoreBackend::Memory => {
                    warn!("Using in-memory store; data is lost on restart");
                    (
                        Arc::new(InMemoryDoctorRepository::new()),
                        Arc::new(InMemoryAppointmentRepository::new()),
                    )
                }
            };

        let sessions: Arc<dyn SessionStore> = match &config.redis_url {
            Some(url) => Arc::new(RedisSessionStore::new(url).await?),
            None => {
                info!("REDIS_URL not set, keeping sessions in memory");
                Arc::new(MemorySessionStore::new())
            }
        };

        Ok(Self {
            doctors,
            appointments,
            sessions,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            doctors: Arc::new(InMemoryDoctorRepository::new()),
            appointments: Arc::new(InMemoryAppointmentRepository::new()),
            sessions: Arc::new(MemorySessionStore::new()),
        }
    }
}

pub fn create_router(config: Arc<AppConfig>, stores: Stores) -> Router {
    let auth = AuthContext::new(config, stores.sessions);

    let doctor_state = Arc::new(DoctorState::new(auth.clone(), stores.doctors.clone()));
    let appointment_state = Arc::new(AppointmentState::new(
        auth.clone(),
        stores.doctors,
        stores.appointments,
    ));

    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .nest("/auth", auth_routes(auth))
        .nest("/doctors", doctor_routes(doctor_state))
        .nest("/appointments", appointment_routes(appointment_state))
}
