//! Appointment persistence.
//!
//! Implementations must reject an insert with `StoreError::UniqueViolation`
//! when a non-cancelled row already holds the same doctor, date and time.
//! That check and the insert happen as one atomic step; callers never
//! read-then-write to guard a slot.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use shared_database::StoreError;

use crate::models::{Appointment, AppointmentStatus, NewAppointment};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryAppointmentRepository;
pub use supabase::SupabaseAppointmentRepository;

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Insert with status `pending`.
    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, StoreError>;

    async fn find_by_id(&self, appointment_id: i64) -> Result<Option<Appointment>, StoreError>;

    /// Times held by non-cancelled appointments for one doctor and date.
    async fn occupied_times(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<NaiveTime>, StoreError>;

    /// Newest date and time first.
    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, StoreError>;

    /// Newest date and time first.
    async fn list_for_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, StoreError>;

    /// Set `status` to `next` only if it is still `expected`. Returns `None`
    /// when the row is missing or its status has moved on.
    async fn update_status(
        &self,
        appointment_id: i64,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<Option<Appointment>, StoreError>;
}
