mod common;

use assert_matches::assert_matches;
use futures::future::join_all;

use appointment_cell::models::{Appointment, AppointmentError, AppointmentStatus};
use common::{next_monday, request, Clinic, SeededDoctor};
use shared_utils::test_utils::TestUser;

async fn booked(clinic: &Clinic) -> (SeededDoctor, Appointment) {
    let doctor = clinic.doctor("house@example.com", "Greg", "House").await;
    clinic.open_hours(doctor.doctor_id, 1, "09:00", "12:00").await;
    let (_, patient) = clinic.patient("patient@example.com").await;

    let appointment = clinic.state.booking_service()
        .book_appointment(&patient, request(doctor.doctor_id, next_monday(), "09:00"))
        .await
        .unwrap();
    (doctor, appointment)
}

#[tokio::test]
async fn test_owning_doctor_confirms_then_completes() {
    let clinic = Clinic::new();
    let (doctor, appointment) = booked(&clinic).await;
    let lifecycle = clinic.state.lifecycle_service();

    let confirmed = lifecycle.transition(appointment.id, &doctor.user, "confirmed").await.unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
    assert!(confirmed.updated_at >= appointment.updated_at);

    let completed = lifecycle.transition(appointment.id, &doctor.user, "completed").await.unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    let seen_by_patient = clinic.state.query_service()
        .patient_appointments(&TestUser { id: appointment.patient_id, ..TestUser::patient("patient@example.com") }.to_user())
        .await
        .unwrap();
    assert_eq!(seen_by_patient[0].status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn test_other_doctor_is_denied() {
    let clinic = Clinic::new();
    let (_, appointment) = booked(&clinic).await;
    let other = clinic.doctor("wilson@example.com", "James", "Wilson").await;

    let result = clinic.state.lifecycle_service()
        .transition(appointment.id, &other.user, "confirmed")
        .await;

    assert_matches!(result, Err(AppointmentError::AccessDenied(_)));
}

#[tokio::test]
async fn test_patient_cannot_transition() {
    let clinic = Clinic::new();
    let (_, appointment) = booked(&clinic).await;
    let patient = TestUser { id: appointment.patient_id, ..TestUser::patient("patient@example.com") }.to_user();

    let result = clinic.state.lifecycle_service()
        .transition(appointment.id, &patient, "cancelled")
        .await;

    assert_matches!(result, Err(AppointmentError::AccessDenied(_)));
}

#[tokio::test]
async fn test_pending_cannot_jump_to_completed() {
    let clinic = Clinic::new();
    let (doctor, appointment) = booked(&clinic).await;

    let result = clinic.state.lifecycle_service()
        .transition(appointment.id, &doctor.user, "completed")
        .await;

    assert_matches!(
        result,
        Err(AppointmentError::InvalidTransition { from: AppointmentStatus::Pending, .. })
    );
}

#[tokio::test]
async fn test_terminal_states_reject_every_status() {
    let clinic = Clinic::new();
    let (doctor, appointment) = booked(&clinic).await;
    let lifecycle = clinic.state.lifecycle_service();
    lifecycle.transition(appointment.id, &doctor.user, "cancelled").await.unwrap();

    for status in ["pending", "confirmed", "cancelled", "completed"] {
        let result = lifecycle.transition(appointment.id, &doctor.user, status).await;
        assert_matches!(
            result,
            Err(AppointmentError::InvalidTransition { from: AppointmentStatus::Cancelled, .. }),
            "status {}",
            status
        );
    }
}

#[tokio::test]
async fn test_unknown_status_string_is_an_invalid_transition() {
    let clinic = Clinic::new();
    let (doctor, appointment) = booked(&clinic).await;

    let result = clinic.state.lifecycle_service()
        .transition(appointment.id, &doctor.user, "no_show")
        .await;

    assert_matches!(result, Err(AppointmentError::InvalidTransition { to, .. }) if to == "no_show");
}

#[tokio::test]
async fn test_missing_appointment_is_not_found() {
    let clinic = Clinic::new();
    let (doctor, _) = booked(&clinic).await;

    let result = clinic.state.lifecycle_service()
        .transition(424_242, &doctor.user, "confirmed")
        .await;

    assert_matches!(result, Err(AppointmentError::NotFound(_)));
}

#[tokio::test]
async fn test_racing_transitions_apply_once() {
    let clinic = Clinic::new();
    let (doctor, appointment) = booked(&clinic).await;
    let lifecycle = clinic.state.lifecycle_service();

    let attempts = ["confirmed", "cancelled", "confirmed", "cancelled"]
        .into_iter()
        .map(|status| lifecycle.transition(appointment.id, &doctor.user, status));
    let results = join_all(attempts).await;

    let applied: Vec<&Appointment> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert!(!applied.is_empty());

    // Whatever won first, the row never went back to pending.
    let final_state = clinic.state.query_service()
        .get_appointment(appointment.id, &doctor.user)
        .await
        .unwrap();
    assert_ne!(final_state.status, AppointmentStatus::Pending);
    for result in results.iter().filter(|r| r.is_err()) {
        assert_matches!(result, Err(AppointmentError::InvalidTransition { .. }));
    }
}
