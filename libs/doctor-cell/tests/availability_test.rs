use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};

use doctor_cell::models::{CreateAvailabilityRequest, DoctorError, ProvisionDoctorRequest};
use doctor_cell::repository::InMemoryDoctorRepository;
use doctor_cell::services::{AvailabilityService, DoctorService};

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn rule(day_of_week: i32, start: &str, end: &str) -> CreateAvailabilityRequest {
    CreateAvailabilityRequest {
        day_of_week,
        start_time: start.to_string(),
        end_time: end.to_string(),
    }
}

async fn setup() -> (AvailabilityService, Arc<InMemoryDoctorRepository>, i64) {
    let repo = Arc::new(InMemoryDoctorRepository::new());
    let doctor = DoctorService::new(repo.clone())
        .provision_profile(1, ProvisionDoctorRequest::default())
        .await
        .unwrap();
    (AvailabilityService::new(repo.clone()), repo, doctor.id)
}

#[tokio::test]
async fn test_weekly_window_for_configured_day() {
    let (service, _, doctor_id) = setup().await;
    service.create_availability(doctor_id, rule(1, "09:00", "12:00")).await.unwrap();

    let window = service.get_weekly_window(doctor_id, 1).await.unwrap().unwrap();
    assert_eq!(window.start, hm(9, 0));
    assert_eq!(window.end, hm(12, 0));
}

#[tokio::test]
async fn test_day_without_rule_has_no_window() {
    let (service, _, doctor_id) = setup().await;
    service.create_availability(doctor_id, rule(1, "09:00", "12:00")).await.unwrap();

    assert!(service.get_weekly_window(doctor_id, 2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_inactive_rule_is_ignored() {
    let (service, repo, doctor_id) = setup().await;
    let created = service.create_availability(doctor_id, rule(3, "08:00", "10:00")).await.unwrap();
    repo.set_rule_active(created.id, false).await;

    assert!(service.get_weekly_window(doctor_id, 3).await.unwrap().is_none());
}

#[tokio::test]
async fn test_first_of_several_rules_wins() {
    let (service, _, doctor_id) = setup().await;
    service.create_availability(doctor_id, rule(1, "13:00", "15:00")).await.unwrap();
    service.create_availability(doctor_id, rule(1, "09:00", "12:00")).await.unwrap();

    let window = service.get_weekly_window(doctor_id, 1).await.unwrap().unwrap();
    assert_eq!(window.start, hm(13, 0));
    assert_eq!(window.end, hm(15, 0));
}

#[tokio::test]
async fn test_window_for_date_uses_sunday_based_weekday() {
    let (service, _, doctor_id) = setup().await;
    service.create_availability(doctor_id, rule(0, "10:00", "11:00")).await.unwrap();

    // 2030-06-02 is a Sunday.
    let sunday = NaiveDate::from_ymd_opt(2030, 6, 2).unwrap();
    let monday = NaiveDate::from_ymd_opt(2030, 6, 3).unwrap();

    assert!(service.window_for_date(doctor_id, sunday).await.unwrap().is_some());
    assert!(service.window_for_date(doctor_id, monday).await.unwrap().is_none());
}

#[tokio::test]
async fn test_rule_validation() {
    let (service, _, doctor_id) = setup().await;

    assert_matches!(
        service.create_availability(doctor_id, rule(7, "09:00", "10:00")).await,
        Err(DoctorError::ValidationError(_))
    );
    assert_matches!(
        service.create_availability(doctor_id, rule(1, "10:00", "10:00")).await,
        Err(DoctorError::ValidationError(_))
    );
    assert_matches!(
        service.create_availability(doctor_id, rule(1, "nine", "10:00")).await,
        Err(DoctorError::ValidationError(_))
    );
}

#[tokio::test]
async fn test_rules_listed_by_day_then_start() {
    let (service, _, doctor_id) = setup().await;
    service.create_availability(doctor_id, rule(3, "09:00", "10:00")).await.unwrap();
    service.create_availability(doctor_id, rule(1, "14:00", "16:00")).await.unwrap();
    service.create_availability(doctor_id, rule(1, "08:00", "09:00")).await.unwrap();

    let rules = service.get_doctor_availability(doctor_id).await.unwrap();
    let order: Vec<(i32, NaiveTime)> = rules.iter().map(|r| (r.day_of_week, r.start_time)).collect();
    assert_eq!(order, vec![(1, hm(8, 0)), (1, hm(14, 0)), (3, hm(9, 0))]);
}
