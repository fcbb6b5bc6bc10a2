use assert_matches::assert_matches;
use serde_json::json;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param, header};

use doctor_cell::models::{DoctorError, NewDoctorProfile, ProvisionDoctorRequest};
use doctor_cell::repository::{DoctorRepository, SupabaseDoctorRepository};
use doctor_cell::services::DoctorService;
use shared_database::StoreError;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn repo_for(mock_server: &MockServer) -> SupabaseDoctorRepository {
    SupabaseDoctorRepository::new(&TestConfig::with_supabase_url(&mock_server.uri()).to_app_config())
}

#[tokio::test]
async fn test_list_active_sorts_by_name() {
    let mock_server = MockServer::start().await;

    let mut zed = MockSupabaseResponses::doctor_response(1, 10, "Cardiology", true);
    zed["user"] = MockSupabaseResponses::user_profile_response(10, "Zed", "Adams");
    let mut amy = MockSupabaseResponses::doctor_response(2, 11, "Neurology", true);
    amy["user"] = MockSupabaseResponses::user_profile_response(11, "Amy", "Brown");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("is_active", "eq.true"))
        .and(header("apikey", "test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([zed, amy])))
        .mount(&mock_server)
        .await;

    let doctors = repo_for(&mock_server).list_active().await.unwrap();

    assert_eq!(doctors.len(), 2);
    assert_eq!(doctors[0].id, 2);
    assert_eq!(doctors[1].id, 1);
    assert_eq!(doctors[0].display_name(), "Dr. Amy Brown");
}

#[tokio::test]
async fn test_specialty_search_uses_ilike_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("specialty", "ilike.*cardio*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(1, 10, "Cardiology", true)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let doctors = repo_for(&mock_server).search_by_specialty("cardio").await.unwrap();
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].specialty, "Cardiology");
}

#[tokio::test]
async fn test_day_rules_parse_postgres_time_columns() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_availability"))
        .and(query_param("doctor_id", "eq.5"))
        .and(query_param("day_of_week", "eq.1"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::availability_response(1, 5, 1, "09:00:00", "12:00:00")
        ])))
        .mount(&mock_server)
        .await;

    let rules = repo_for(&mock_server).active_availability_for_day(5, 1).await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].start_time.to_string(), "09:00:00");
}

#[tokio::test]
async fn test_duplicate_profile_maps_to_already_exists() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctors"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::unique_violation_response()))
        .mount(&mock_server)
        .await;

    let service = DoctorService::new(std::sync::Arc::new(repo_for(&mock_server)));
    let result = service.provision_profile(10, ProvisionDoctorRequest::default()).await;

    assert_matches!(result, Err(DoctorError::AlreadyExists));
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockSupabaseResponses::error_response("connection refused", "08006")
        ))
        .mount(&mock_server)
        .await;

    let result = repo_for(&mock_server).create_profile(NewDoctorProfile::defaults_for(10)).await;
    assert_matches!(result, Err(StoreError::Unavailable(_)));
}

#[tokio::test]
async fn test_undecodable_row_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "not-a-number", "specialty": 42 }
        ])))
        .mount(&mock_server)
        .await;

    let result = repo_for(&mock_server).list_active().await;
    assert_matches!(result, Err(StoreError::Malformed(_)));
}
