use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;

use doctor_cell::models::UserProfile;
use shared_database::StoreError;

use crate::models::{Appointment, AppointmentStatus, NewAppointment};
use super::AppointmentRepository;

#[derive(Default)]
struct AppointmentTable {
    rows: Vec<Appointment>,
    patients: HashMap<i64, UserProfile>,
    next_id: i64,
}

impl AppointmentTable {
    fn with_patient(&self, mut appointment: Appointment) -> Appointment {
        appointment.patient = self.patients.get(&appointment.patient_id).cloned();
        appointment
    }

    fn newest_first(&self, mut rows: Vec<Appointment>) -> Vec<Appointment> {
        rows.sort_by_key(|a| Reverse((a.appointment_date, a.appointment_time, a.id)));
        rows.into_iter().map(|a| self.with_patient(a)).collect()
    }
}

/// Appointment table held in process memory. The slot check and the insert
/// share one write lock, giving the same guarantee as the partial unique
/// index in Postgres.
#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    table: RwLock<AppointmentTable>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_patient(&self, profile: UserProfile) {
        self.table.write().await.patients.insert(profile.id, profile);
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let mut table = self.table.write().await;

        let taken = table.rows.iter().any(|row| {
            row.doctor_id == appointment.doctor_id
                && row.appointment_date == appointment.appointment_date
                && row.appointment_time == appointment.appointment_time
                && row.status.occupies_slot()
        });
        if taken {
            return Err(StoreError::UniqueViolation(format!(
                "doctor {} already booked at {} {}",
                appointment.doctor_id, appointment.appointment_date, appointment.appointment_time
            )));
        }

        table.next_id += 1;
        let now = Utc::now();
        let row = Appointment {
            id: table.next_id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            appointment_date: appointment.appointment_date,
            appointment_time: appointment.appointment_time,
            status: AppointmentStatus::Pending,
            notes: appointment.notes,
            created_at: now,
            updated_at: now,
            patient: None,
            doctor: None,
        };
        table.rows.push(row.clone());

        Ok(table.with_patient(row))
    }

    async fn find_by_id(&self, appointment_id: i64) -> Result<Option<Appointment>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter()
            .find(|row| row.id == appointment_id)
            .cloned()
            .map(|row| table.with_patient(row)))
    }

    async fn occupied_times(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<NaiveTime>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter()
            .filter(|row| row.doctor_id == doctor_id && row.appointment_date == date && row.status.occupies_slot())
            .map(|row| row.appointment_time)
            .collect())
    }

    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, StoreError> {
        let table = self.table.read().await;
        let rows = table.rows.iter().filter(|row| row.patient_id == patient_id).cloned().collect();
        Ok(table.newest_first(rows))
    }

    async fn list_for_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, StoreError> {
        let table = self.table.read().await;
        let rows = table.rows.iter().filter(|row| row.doctor_id == doctor_id).cloned().collect();
        Ok(table.newest_first(rows))
    }

    async fn update_status(
        &self,
        appointment_id: i64,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut table = self.table.write().await;

        let updated = match table.rows.iter_mut().find(|row| row.id == appointment_id) {
            Some(row) if row.status == expected => {
                row.status = next;
                row.updated_at = Utc::now();
                row.clone()
            }
            _ => return Ok(None),
        };

        Ok(Some(table.with_patient(updated)))
    }
}
