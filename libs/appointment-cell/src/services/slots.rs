use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::debug;

use doctor_cell::models::WeeklyWindow;
use doctor_cell::services::AvailabilityService;

use crate::models::AppointmentError;
use crate::repository::AppointmentRepository;

/// Slot starts inside `window`, one every `stride`. A slot is only offered
/// when it finishes by `window.end`.
pub fn candidate_slots(window: &WeeklyWindow, stride: Duration) -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    if stride <= Duration::zero() {
        return slots;
    }

    let mut current = window.start;
    loop {
        let (slot_end, wrapped) = current.overflowing_add_signed(stride);
        if wrapped != 0 || slot_end > window.end {
            break;
        }
        slots.push(current);
        current = slot_end;
    }

    slots
}

/// Candidates minus occupied times, ascending and without duplicates.
pub fn available_slots(candidates: &[NaiveTime], occupied: &[NaiveTime]) -> Vec<NaiveTime> {
    let taken: HashSet<&NaiveTime> = occupied.iter().collect();
    let mut free: Vec<NaiveTime> = candidates.iter()
        .filter(|slot| !taken.contains(slot))
        .copied()
        .collect();
    free.sort();
    free.dedup();
    free
}

pub struct SlotService {
    availability: AvailabilityService,
    appointments: Arc<dyn AppointmentRepository>,
    stride: Duration,
}

impl SlotService {
    pub fn new(
        availability: AvailabilityService,
        appointments: Arc<dyn AppointmentRepository>,
        stride: Duration,
    ) -> Self {
        Self {
            availability,
            appointments,
            stride,
        }
    }

    /// Every slot the doctor's weekly window offers on `date`, booked or not.
    pub async fn candidate_slots_for(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, AppointmentError> {
        let window = self.availability.window_for_date(doctor_id, date).await?;
        Ok(window
            .map(|w| candidate_slots(&w, self.stride))
            .unwrap_or_default())
    }

    /// Bookable slots for one doctor and date. The result is a hint: only
    /// the insert decides who gets a slot.
    pub async fn generate_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, AppointmentError> {
        let candidates = self.candidate_slots_for(doctor_id, date).await?;
        if candidates.is_empty() {
            debug!("Doctor {} has no open hours on {}", doctor_id, date);
            return Ok(candidates);
        }

        let occupied = self.appointments.occupied_times(doctor_id, date).await?;
        let slots = available_slots(&candidates, &occupied);

        debug!(
            "Doctor {} on {}: {} of {} slots free",
            doctor_id,
            date,
            slots.len(),
            candidates.len()
        );
        Ok(slots)
    }

    pub async fn is_candidate_slot(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<bool, AppointmentError> {
        Ok(self.candidate_slots_for(doctor_id, date).await?.contains(&time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(start: NaiveTime, end: NaiveTime) -> WeeklyWindow {
        WeeklyWindow { start, end }
    }

    #[test]
    fn hourly_slots_exclude_the_end() {
        let slots = candidate_slots(&window(hm(9, 0), hm(12, 0)), Duration::hours(1));
        assert_eq!(slots, vec![hm(9, 0), hm(10, 0), hm(11, 0)]);
    }

    #[test]
    fn no_partial_trailing_slot() {
        let slots = candidate_slots(&window(hm(9, 0), hm(11, 30)), Duration::hours(1));
        assert_eq!(slots, vec![hm(9, 0), hm(10, 0)]);
    }

    #[test]
    fn window_shorter_than_stride_is_empty() {
        assert!(candidate_slots(&window(hm(9, 0), hm(9, 45)), Duration::hours(1)).is_empty());
    }

    #[test]
    fn half_hour_stride() {
        let slots = candidate_slots(&window(hm(9, 0), hm(10, 30)), Duration::minutes(30));
        assert_eq!(slots, vec![hm(9, 0), hm(9, 30), hm(10, 0)]);
    }

    #[test]
    fn window_ending_at_midnight_does_not_wrap() {
        let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap();
        let slots = candidate_slots(&window(hm(22, 0), end), Duration::hours(1));
        assert_eq!(slots, vec![hm(22, 0)]);
    }

    #[test]
    fn zero_stride_yields_nothing() {
        assert!(candidate_slots(&window(hm(9, 0), hm(12, 0)), Duration::zero()).is_empty());
    }

    #[test]
    fn occupied_times_are_removed() {
        let candidates = vec![hm(9, 0), hm(10, 0), hm(11, 0)];
        let free = available_slots(&candidates, &[hm(10, 0), hm(15, 0)]);
        assert_eq!(free, vec![hm(9, 0), hm(11, 0)]);
    }

    #[test]
    fn result_is_strictly_ascending() {
        let candidates = vec![hm(11, 0), hm(9, 0), hm(10, 0), hm(9, 0)];
        let free = available_slots(&candidates, &[]);
        assert!(free.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(free.len(), 3);
    }
}
