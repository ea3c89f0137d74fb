// libs/appointment-cell/src/services/slots.rs
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use shared_database::postgrest::StoreClient;
use shared_models::time::format_hhmm;

use crate::models::AppointmentError;
use crate::services::conflict::ConflictDetectionService;

/// Clinic hours: bookable ticks run 09:00..=17:00 in 15-minute steps.
const OPENING_MINUTE: u32 = 9 * 60;
const CLOSING_MINUTE: u32 = 17 * 60;
const SLOT_STEP_MINUTES: u32 = 15;

pub struct SlotService {
    conflicts: ConflictDetectionService,
}

impl SlotService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self {
            conflicts: ConflictDetectionService::new(store),
        }
    }

    /// Free 15-minute slots for a doctor on a date, as "HH:MM" strings in
    /// chronological order.
    pub async fn suggest_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<String>, AppointmentError> {
        debug!("Computing free slots for doctor {} on {}", doctor_id, date);

        let busy: HashSet<NaiveTime> = self
            .conflicts
            .active_appointments(doctor_id, date, None)
            .await?
            .into_iter()
            .map(|apt| apt.appointment_time)
            .collect();

        Ok(free_slots(&busy).into_iter().map(format_hhmm).collect())
    }
}

/// Pure slot enumeration over a snapshot of busy times. A slot is excluded
/// only when it coincides exactly with a booked time; near-misses are the
/// conflict checker's concern, not the calculator's.
pub fn free_slots(busy: &HashSet<NaiveTime>) -> Vec<NaiveTime> {
    let mut slots = Vec::new();

    let mut minute = OPENING_MINUTE;
    while minute <= CLOSING_MINUTE {
        let tick = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)
            .expect("clinic hours stay within a day");
        if !busy.contains(&tick) {
            slots.push(tick);
        }
        minute += SLOT_STEP_MINUTES;
    }

    slots
}
