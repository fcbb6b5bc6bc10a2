use std::collections::HashMap;
use std::sync::Arc;

use doctor_cell::repository::DoctorRepository;
use shared_models::auth::User;

use crate::models::{Appointment, AppointmentError, DoctorSummary, ScheduleSummary};
use crate::repository::AppointmentRepository;
use crate::services::doctor_id_for;

/// Read-only, caller-scoped views over appointments.
pub struct AppointmentQueryService {
    appointments: Arc<dyn AppointmentRepository>,
    doctors: Arc<dyn DoctorRepository>,
}

impl AppointmentQueryService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>, doctors: Arc<dyn DoctorRepository>) -> Self {
        Self { appointments, doctors }
    }

    pub async fn patient_appointments(&self, patient: &User) -> Result<Vec<Appointment>, AppointmentError> {
        if !patient.is_patient() {
            return Err(AppointmentError::AccessDenied("Only patients have bookings".to_string()));
        }
        let appointments = self.appointments.list_for_patient(patient.id).await?;
        self.with_doctors(appointments).await
    }

    pub async fn doctor_schedule(&self, doctor: &User) -> Result<Vec<Appointment>, AppointmentError> {
        let doctor_id = doctor_id_for(self.doctors.as_ref(), doctor).await?;
        let appointments = self.appointments.list_for_doctor(doctor_id).await?;
        self.with_doctors(appointments).await
    }

    pub async fn schedule_summary(&self, doctor: &User) -> Result<ScheduleSummary, AppointmentError> {
        let doctor_id = doctor_id_for(self.doctors.as_ref(), doctor).await?;
        let appointments = self.appointments.list_for_doctor(doctor_id).await?;
        Ok(ScheduleSummary::from_appointments(&appointments))
    }

    /// One appointment, visible to its patient and its doctor only.
    pub async fn get_appointment(&self, appointment_id: i64, caller: &User) -> Result<Appointment, AppointmentError> {
        let appointment = self.appointments.find_by_id(appointment_id).await?
            .ok_or_else(|| AppointmentError::NotFound("Appointment".to_string()))?;

        let visible = if caller.is_patient() {
            appointment.patient_id == caller.id
        } else if caller.is_doctor() {
            doctor_id_for(self.doctors.as_ref(), caller).await? == appointment.doctor_id
        } else {
            false
        };

        if !visible {
            return Err(AppointmentError::AccessDenied(
                "Appointment belongs to another patient or doctor".to_string(),
            ));
        }

        let mut enriched = self.with_doctors(vec![appointment]).await?;
        enriched.pop().ok_or_else(|| AppointmentError::NotFound("Appointment".to_string()))
    }

    async fn with_doctors(&self, mut appointments: Vec<Appointment>) -> Result<Vec<Appointment>, AppointmentError> {
        let mut cache: HashMap<i64, Option<DoctorSummary>> = HashMap::new();

        for appointment in appointments.iter_mut().filter(|a| a.doctor.is_none()) {
            if !cache.contains_key(&appointment.doctor_id) {
                let summary = self.doctors.find_by_id(appointment.doctor_id).await?
                    .map(|doctor| DoctorSummary::from(&doctor));
                cache.insert(appointment.doctor_id, summary);
            }
            appointment.doctor = cache.get(&appointment.doctor_id).cloned().flatten();
        }

        Ok(appointments)
    }
}
