use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use doctor_cell::services::DoctorService;
use shared_models::auth::User;
use shared_models::time::{parse_date, parse_time_of_day};

use crate::models::{Appointment, AppointmentError, BookAppointmentRequest, DoctorSummary, NewAppointment};
use crate::repository::AppointmentRepository;
use crate::services::slots::SlotService;

pub struct AppointmentBookingService {
    doctors: DoctorService,
    slots: SlotService,
    appointments: Arc<dyn AppointmentRepository>,
}

impl AppointmentBookingService {
    pub fn new(
        doctors: DoctorService,
        slots: SlotService,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self {
            doctors,
            slots,
            appointments,
        }
    }

    /// Book `request` for `patient`, relative to the local calendar date.
    pub async fn book_appointment(
        &self,
        patient: &User,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        self.book_appointment_on(patient, request, Local::now().date_naive()).await
    }

    /// Booking with an explicit "today".
    ///
    /// The doctor must be active and the time must be one of the slots the
    /// doctor's weekly window offers on that date. Whether the slot is still
    /// free is decided by the insert alone: a losing racer gets
    /// `SlotUnavailable`.
    pub async fn book_appointment_on(
        &self,
        patient: &User,
        request: BookAppointmentRequest,
        today: NaiveDate,
    ) -> Result<Appointment, AppointmentError> {
        if !patient.is_patient() {
            return Err(AppointmentError::AccessDenied("Only patients can book appointments".to_string()));
        }

        let date = parse_date(&request.appointment_date).map_err(AppointmentError::ValidationError)?;
        let time = parse_time_of_day(&request.appointment_time).map_err(AppointmentError::ValidationError)?;

        let doctor = self.doctors.get_active_doctor(request.doctor_id).await?;

        if date < today {
            return Err(AppointmentError::ValidationError(format!(
                "Cannot book an appointment in the past ({})",
                date
            )));
        }

        if !self.slots.is_candidate_slot(doctor.id, date, time).await? {
            return Err(AppointmentError::ValidationError(format!(
                "{} {} is not a bookable slot for this doctor",
                date,
                time.format("%H:%M")
            )));
        }

        let notes = request.notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        debug!("Booking doctor {} at {} {} for patient {}", doctor.id, date, time, patient.id);

        let mut appointment = self.appointments.insert(NewAppointment {
            patient_id: patient.id,
            doctor_id: doctor.id,
            appointment_date: date,
            appointment_time: time,
            notes,
        }).await.map_err(|e| {
            let err = AppointmentError::from(e);
            if matches!(err, AppointmentError::SlotUnavailable) {
                warn!("Slot {} {} for doctor {} was taken concurrently", date, time, doctor.id);
            }
            err
        })?;

        appointment.doctor = Some(DoctorSummary::from(&doctor));
        info!("Appointment {} booked for patient {}", appointment.id, patient.id);
        Ok(appointment)
    }
}
