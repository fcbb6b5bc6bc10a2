//! Data access for doctors and their weekly availability rules.

use async_trait::async_trait;

use shared_database::StoreError;

use crate::models::{Doctor, DoctorAvailability, NewAvailability, NewDoctorProfile};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryDoctorRepository;
pub use supabase::SupabaseDoctorRepository;

#[async_trait]
pub trait DoctorRepository: Send + Sync {
    async fn find_by_id(&self, doctor_id: i64) -> Result<Option<Doctor>, StoreError>;

    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Doctor>, StoreError>;

    /// Active doctors ordered by first then last name.
    async fn list_active(&self) -> Result<Vec<Doctor>, StoreError>;

    /// Active doctors whose specialty contains `specialty`, case-insensitively.
    async fn search_by_specialty(&self, specialty: &str) -> Result<Vec<Doctor>, StoreError>;

    async fn create_profile(&self, profile: NewDoctorProfile) -> Result<Doctor, StoreError>;

    /// All rules for a doctor ordered by weekday then start time.
    async fn list_availability(&self, doctor_id: i64) -> Result<Vec<DoctorAvailability>, StoreError>;

    /// Active rules for one weekday in insertion (id) order.
    async fn active_availability_for_day(
        &self,
        doctor_id: i64,
        day_of_week: i32,
    ) -> Result<Vec<DoctorAvailability>, StoreError>;

    async fn create_availability(&self, rule: NewAvailability) -> Result<DoctorAvailability, StoreError>;
}
