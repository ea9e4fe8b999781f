use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::tier::SubscriptionTier;
use crate::models::usage::UsagePeriod;
use crate::models::warning::WarningKind;
use crate::services::cache::TtlCache;
use crate::services::clock::Clock;
use crate::services::database::DatabaseService;
use crate::services::thresholds::check_usage_warnings;
use crate::utils::error::UsageError;

const DASHBOARD_KEY: &str = "dashboard";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetrics {
    pub generated_at: DateTime<Utc>,
    pub tracked_users: usize,
    pub users_by_tier: BTreeMap<SubscriptionTier, usize>,
    pub users_with_warnings: usize,
    pub users_at_limit: usize,
    pub total_services_used: u64,
    pub total_discounts_saved: Decimal,
}

/// Aggregates over the periods that are still open at `now`.
pub fn compute_metrics(periods: &[UsagePeriod], now: DateTime<Utc>) -> UsageMetrics {
    let mut users_by_tier: BTreeMap<SubscriptionTier, usize> =
        SubscriptionTier::ALL.iter().map(|t| (*t, 0)).collect();
    let mut metrics = UsageMetrics {
        generated_at: now,
        tracked_users: 0,
        users_by_tier: BTreeMap::new(),
        users_with_warnings: 0,
        users_at_limit: 0,
        total_services_used: 0,
        total_discounts_saved: Decimal::ZERO,
    };

    for period in periods.iter().filter(|p| !p.is_expired(now)) {
        metrics.tracked_users += 1;
        *users_by_tier.entry(period.tier).or_default() += 1;
        metrics.total_services_used += u64::from(period.services_used);
        metrics.total_discounts_saved += period.discounts_saved;

        let warnings = check_usage_warnings(period, period.tier);
        if !warnings.is_empty() {
            metrics.users_with_warnings += 1;
        }
        if warnings.iter().any(|w| w.kind == WarningKind::LimitReached) {
            metrics.users_at_limit += 1;
        }
    }

    metrics.users_by_tier = users_by_tier;
    metrics
}

/// Admin dashboard figures, recomputed at most once per TTL.
#[derive(Clone)]
pub struct MetricsService {
    db: DatabaseService,
    clock: Arc<dyn Clock>,
    cache: TtlCache<&'static str, UsageMetrics>,
}

impl MetricsService {
    pub fn new(db: DatabaseService, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        let cache = TtlCache::new(ttl, clock.clone());
        Self { db, clock, cache }
    }

    pub fn dashboard(&self, refresh: bool) -> Result<UsageMetrics, UsageError> {
        if refresh {
            self.cache.invalidate(&DASHBOARD_KEY);
        }
        self.cache.get_or_try_insert_with(DASHBOARD_KEY, || {
            let periods = self.db.list_current()?;
            log::debug!("Recomputing usage metrics over {} periods", periods.len());
            Ok(compute_metrics(&periods, self.clock.now()))
        })
    }
}
