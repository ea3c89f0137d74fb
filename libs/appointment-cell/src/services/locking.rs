// libs/appointment-cell/src/services/locking.rs
//
// Advisory scheduling locks backed by the `scheduling_locks` table.
// Check-then-act sequences (conflict check + insert, treatment workflow)
// serialize on a lock key so two concurrent requests cannot both pass the
// check for the same doctor-day. Expired locks are lazily cleaned up, so a
// crashed holder cannot wedge a slot forever.

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::postgrest::StoreClient;

use crate::models::AppointmentError;

const LOCK_TIMEOUT_SECONDS: i64 = 30;
const MAX_ACQUIRE_ATTEMPTS: u32 = 3;

pub struct SchedulingLockService {
    store: Arc<StoreClient>,
}

impl SchedulingLockService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Lock key for booking writes: one doctor-day at a time.
    pub fn booking_key(doctor_id: i64, date: NaiveDate) -> String {
        format!("booking_{}_{}", doctor_id, date)
    }

    /// Lock key for the treatment-payment workflow of one appointment.
    pub fn workflow_key(appointment_id: i64) -> String {
        format!("workflow_{}", appointment_id)
    }

    /// Acquire with bounded retry and backoff. Returns ConflictDetected when
    /// the key stays held, so callers surface it like any other clash.
    pub async fn acquire(&self, lock_key: &str) -> Result<(), AppointmentError> {
        for attempt in 1..=MAX_ACQUIRE_ATTEMPTS {
            if self.try_acquire(lock_key).await? {
                debug!("Scheduling lock acquired: {}", lock_key);
                return Ok(());
            }
            if attempt < MAX_ACQUIRE_ATTEMPTS {
                tokio::time::sleep(tokio::time::Duration::from_millis(100 * attempt as u64)).await;
            }
        }

        warn!("Scheduling lock contended, giving up: {}", lock_key);
        Err(AppointmentError::ConflictDetected)
    }

    /// Best-effort release. Failure is only logged: the expiry timestamp
    /// guarantees the lock clears on its own.
    pub async fn release(&self, lock_key: &str) {
        let path = format!("/rest/v1/scheduling_locks?lock_key=eq.{}", lock_key);
        if let Err(e) = self.store.execute(Method::DELETE, &path, None).await {
            warn!("Failed to release scheduling lock {}: {}", lock_key, e);
        } else {
            debug!("Scheduling lock released: {}", lock_key);
        }
    }

    async fn try_acquire(&self, lock_key: &str) -> Result<bool, AppointmentError> {
        let now = Utc::now();
        let lock_row = json!({
            "lock_key": lock_key,
            "acquired_at": now.to_rfc3339(),
            "expires_at": (now + chrono::Duration::seconds(LOCK_TIMEOUT_SECONDS)).to_rfc3339(),
            "holder": format!("api_{}", Uuid::new_v4()),
        });

        // The unique index on lock_key makes this insert the contention point.
        match self
            .store
            .execute(Method::POST, "/rest/v1/scheduling_locks", Some(lock_row))
            .await
        {
            Ok(()) => Ok(true),
            Err(_) => {
                // Held by someone else; clear it if it has expired so the
                // next attempt can win.
                self.cleanup_if_expired(lock_key).await?;
                Ok(false)
            }
        }
    }

    async fn cleanup_if_expired(&self, lock_key: &str) -> Result<bool, AppointmentError> {
        let path = format!(
            "/rest/v1/scheduling_locks?lock_key=eq.{}&select=expires_at",
            lock_key
        );
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let expired = rows
            .first()
            .and_then(|row| row.get("expires_at"))
            .and_then(|v| v.as_str())
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .is_some_and(|expires_at| expires_at.with_timezone(&Utc) < Utc::now());

        if expired {
            debug!("Cleaning up expired scheduling lock: {}", lock_key);
            self.release(lock_key).await;
        }

        Ok(expired)
    }
}
