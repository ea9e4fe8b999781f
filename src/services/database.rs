use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::usage::UsagePeriod;
use crate::utils::error::UsageError;

/// Result of a read-modify-write on a user's current period.
#[derive(Debug)]
pub struct PeriodWrite {
    /// A period that ended and is moved to history.
    pub superseded: Option<UsagePeriod>,
    pub current: UsagePeriod,
}

#[derive(Debug, Default)]
struct UserUsage {
    current: Option<UsagePeriod>,
    history: Vec<UsagePeriod>,
}

/// In-process usage store: one open period per user plus its superseded
/// predecessors.
#[derive(Clone, Default)]
pub struct DatabaseService {
    users: Arc<Mutex<HashMap<Uuid, UserUsage>>>,
}

impl DatabaseService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, UserUsage>>, UsageError> {
        self.users
            .lock()
            .map_err(|_| UsageError::Persistence("usage store lock poisoned".to_string()))
    }

    pub fn get_current(&self, user_id: &Uuid) -> Result<Option<UsagePeriod>, UsageError> {
        let users = self.lock()?;
        Ok(users.get(user_id).and_then(|u| u.current.clone()))
    }

    /// Reads the user's current period, hands it to `f`, and stores what `f`
    /// returns. The whole exchange runs under the store lock, so concurrent
    /// writers for the same user are serialised. Nothing is written if `f`
    /// fails.
    pub fn update_current<F>(&self, user_id: &Uuid, f: F) -> Result<UsagePeriod, UsageError>
    where
        F: FnOnce(Option<UsagePeriod>) -> Result<PeriodWrite, UsageError>,
    {
        let mut users = self.lock()?;
        let existing = users.get(user_id).and_then(|u| u.current.clone());
        let write = f(existing)?;

        let entry = users.entry(*user_id).or_default();
        if let Some(previous) = write.superseded {
            log::info!(
                "Rolling usage period for user {} ({} -> {})",
                user_id,
                previous.period_start.format("%Y-%m"),
                write.current.period_start.format("%Y-%m")
            );
            entry.history.push(previous);
        }
        entry.current = Some(write.current.clone());
        Ok(write.current)
    }

    /// Superseded periods, newest first.
    pub fn get_history(&self, user_id: &Uuid) -> Result<Vec<UsagePeriod>, UsageError> {
        let users = self.lock()?;
        Ok(users
            .get(user_id)
            .map(|u| u.history.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    pub fn list_current(&self) -> Result<Vec<UsagePeriod>, UsageError> {
        let users = self.lock()?;
        Ok(users.values().filter_map(|u| u.current.clone()).collect())
    }

    pub fn health_check(&self) -> Result<(), UsageError> {
        self.lock().map(|_| ())
    }
}
