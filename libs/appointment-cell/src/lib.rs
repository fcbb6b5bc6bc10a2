pub mod handlers;
pub mod models;
pub mod repository;
pub mod router;
pub mod services;

pub use handlers::AppointmentState;
pub use models::*;
pub use repository::{AppointmentRepository, InMemoryAppointmentRepository, SupabaseAppointmentRepository};
pub use router::appointment_routes;
pub use services::{
    AppointmentBookingService, AppointmentLifecycleService, AppointmentQueryService, SlotService,
};
