use chrono::{DateTime, Datelike, TimeZone, Utc};
use uuid::Uuid;

use crate::models::tier::SubscriptionTier;
use crate::models::usage::UsagePeriod;

/// Billing window `[start, end)` for the UTC calendar month containing `now`.
pub fn billing_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let (year, month) = (now.year(), now.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    // First-of-month at midnight is never ambiguous in UTC.
    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    (start, end)
}

/// Outcome of resolving which period a request should act on.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectivePeriod {
    /// The stored period is still open.
    Current(UsagePeriod),
    /// No period stored yet; a fresh one starts now.
    Started(UsagePeriod),
    /// The stored period ended. It is superseded by `next`; any number of
    /// missed months collapse into this single rotation.
    RolledOver {
        previous: UsagePeriod,
        next: UsagePeriod,
    },
}

impl EffectivePeriod {
    pub fn into_period(self) -> UsagePeriod {
        self.split().1
    }

    /// `(superseded, current)`.
    pub fn split(self) -> (Option<UsagePeriod>, UsagePeriod) {
        match self {
            EffectivePeriod::Current(p) | EffectivePeriod::Started(p) => (None, p),
            EffectivePeriod::RolledOver { previous, next } => (Some(previous), next),
        }
    }
}

pub fn effective_period(
    existing: Option<UsagePeriod>,
    user_id: Uuid,
    tier: SubscriptionTier,
    now: DateTime<Utc>,
) -> EffectivePeriod {
    let fresh = || {
        let (start, end) = billing_window(now);
        UsagePeriod::new(user_id, tier, start, end, now)
    };

    match existing {
        None => EffectivePeriod::Started(fresh()),
        Some(period) if !period.is_expired(now) => EffectivePeriod::Current(period),
        Some(previous) => EffectivePeriod::RolledOver {
            previous,
            next: fresh(),
        },
    }
}
