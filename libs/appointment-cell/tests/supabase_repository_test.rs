use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};

use appointment_cell::models::{AppointmentError, AppointmentStatus, BookAppointmentRequest, NewAppointment};
use appointment_cell::repository::{AppointmentRepository, SupabaseAppointmentRepository};
use appointment_cell::services::{AppointmentBookingService, SlotService};
use doctor_cell::repository::SupabaseDoctorRepository;
use doctor_cell::services::{AvailabilityService, DoctorService};
use shared_database::StoreError;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn new_appointment() -> NewAppointment {
    NewAppointment {
        patient_id: 20,
        doctor_id: 5,
        appointment_date: date("2030-06-03"),
        appointment_time: hm(9, 0),
        notes: None,
    }
}

fn repo_for(mock_server: &MockServer) -> SupabaseAppointmentRepository {
    SupabaseAppointmentRepository::new(&TestConfig::with_supabase_url(&mock_server.uri()).to_app_config())
}

#[tokio::test]
async fn test_insert_posts_pending_row() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({
            "doctor_id": 5,
            "appointment_date": "2030-06-03",
            "appointment_time": "09:00",
            "status": "pending"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_response(1, 20, 5, "2030-06-03", "09:00:00", "pending")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let appointment = repo_for(&mock_server).insert(new_appointment()).await.unwrap();

    assert_eq!(appointment.id, 1);
    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.appointment_time, hm(9, 0));
}

#[tokio::test]
async fn test_unique_index_violation_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::unique_violation_response()))
        .mount(&mock_server)
        .await;

    let result = repo_for(&mock_server).insert(new_appointment()).await;
    assert_matches!(result, Err(StoreError::UniqueViolation(_)));
}

#[tokio::test]
async fn test_other_conflicts_are_not_slot_conflicts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockSupabaseResponses::error_response("foreign key violation", "23503")
        ))
        .mount(&mock_server)
        .await;

    let result = repo_for(&mock_server).insert(new_appointment()).await;
    assert_matches!(result, Err(StoreError::Unavailable(_)));
}

#[tokio::test]
async fn test_occupied_times_skip_cancelled_rows() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "appointment_time"))
        .and(query_param("doctor_id", "eq.5"))
        .and(query_param("appointment_date", "eq.2030-06-03"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "appointment_time": "09:00:00" },
            { "appointment_time": "11:00:00" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let occupied = repo_for(&mock_server).occupied_times(5, date("2030-06-03")).await.unwrap();
    assert_eq!(occupied, vec![hm(9, 0), hm(11, 0)]);
}

#[tokio::test]
async fn test_patient_listing_requests_newest_first() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", "eq.20"))
        .and(query_param("order", "appointment_date.desc,appointment_time.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(2, 20, 5, "2030-06-10", "10:00:00", "confirmed"),
            MockSupabaseResponses::appointment_response(1, 20, 5, "2030-06-03", "09:00:00", "pending")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let rows = repo_for(&mock_server).list_for_patient(20).await.unwrap();
    assert_eq!(rows.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2, 1]);
}

#[tokio::test]
async fn test_status_update_is_conditional_on_current_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.1"))
        .and(query_param("status", "eq.pending"))
        .and(body_partial_json(json!({ "status": "confirmed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(1, 20, 5, "2030-06-03", "09:00:00", "confirmed")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.1"))
        .and(query_param("status", "eq.confirmed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let repo = repo_for(&mock_server);

    let updated = repo.update_status(1, AppointmentStatus::Pending, AppointmentStatus::Confirmed).await.unwrap();
    assert_eq!(updated.map(|a| a.status), Some(AppointmentStatus::Confirmed));

    let stale = repo.update_status(1, AppointmentStatus::Confirmed, AppointmentStatus::Completed).await.unwrap();
    assert!(stale.is_none());
}

#[tokio::test]
async fn test_store_outage_surfaces_as_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let result = repo_for(&mock_server).find_by_id(1).await;
    assert_matches!(result, Err(StoreError::Unavailable(_)));
}

#[tokio::test]
async fn test_booking_against_postgrest_reports_taken_slot() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(5, 50, "Diagnostics", true)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_availability"))
        .and(query_param("doctor_id", "eq.5"))
        .and(query_param("day_of_week", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::availability_response(1, 5, 1, "09:00:00", "12:00:00")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::unique_violation_response()))
        .mount(&mock_server)
        .await;

    let doctors = Arc::new(SupabaseDoctorRepository::new(&config));
    let appointments = Arc::new(SupabaseAppointmentRepository::new(&config));
    let booking = AppointmentBookingService::new(
        DoctorService::new(doctors.clone()),
        SlotService::new(AvailabilityService::new(doctors), appointments.clone(), chrono::Duration::hours(1)),
        appointments,
    );

    let patient = TestUser::patient("patient@example.com").to_user();
    let request = BookAppointmentRequest {
        doctor_id: 5,
        appointment_date: "2030-06-03".to_string(),
        appointment_time: "09:00".to_string(),
        notes: None,
    };

    let result = booking.book_appointment_on(&patient, request, date("2030-06-01")).await;
    assert_matches!(result, Err(AppointmentError::SlotUnavailable));
}
