use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::tier::SubscriptionTier;
use crate::models::usage::{ServiceKind, UsagePeriod, UsageSummary, MAX_DISCOUNT_PER_EVENT};
use crate::services::clock::Clock;
use crate::services::database::{DatabaseService, PeriodWrite};
use crate::services::notifier::{UsageEvent, UsageNotifier};
use crate::services::period::{effective_period, EffectivePeriod};
use crate::services::thresholds::check_usage_warnings;
use crate::utils::error::UsageError;

/// Tracks per-user resource consumption against subscription tier limits.
#[derive(Clone)]
pub struct UsageService {
    db: DatabaseService,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn UsageNotifier>,
}

impl UsageService {
    pub fn new(db: DatabaseService, clock: Arc<dyn Clock>, notifier: Arc<dyn UsageNotifier>) -> Self {
        Self { db, clock, notifier }
    }

    /// Counts one completed booking of `service_type` in the user's current
    /// period, opening or rolling the period as needed.
    pub fn track_service_usage(
        &self,
        user_id: Uuid,
        service_type: &str,
        tier: SubscriptionTier,
    ) -> Result<UsagePeriod, UsageError> {
        let now = self.clock.now();
        let kind = ServiceKind::classify(service_type);

        let period = self.db.update_current(&user_id, |existing| {
            let (superseded, mut current) = effective_period(existing, user_id, tier, now).split();
            current.tier = tier;
            current.record_service(kind, now);
            Ok(PeriodWrite { superseded, current })
        })?;

        log::info!(
            "Tracked {} service for user {} ({}): {} used this period",
            service_type,
            user_id,
            tier,
            period.services_used
        );
        self.publish(&period, tier);
        Ok(period)
    }

    /// Adds a discount to the user's savings. The stored total is capped at
    /// the tier's maximum discount.
    pub fn track_discount_usage(
        &self,
        user_id: Uuid,
        amount: Decimal,
        tier: SubscriptionTier,
    ) -> Result<UsagePeriod, UsageError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(UsageError::Validation(format!(
                "Discount amount must not be negative: {}",
                amount
            )));
        }
        if amount > MAX_DISCOUNT_PER_EVENT {
            return Err(UsageError::Validation(format!(
                "Discount amount {} exceeds the per-booking maximum of {}",
                amount, MAX_DISCOUNT_PER_EVENT
            )));
        }

        let now = self.clock.now();
        let limits = tier.limits();

        let period = self.db.update_current(&user_id, |existing| {
            let (superseded, mut current) = effective_period(existing, user_id, tier, now).split();
            current.tier = tier;
            current.record_discount(amount, &limits, now)?;
            Ok(PeriodWrite { superseded, current })
        })?;

        if period.discounts_requested > period.discounts_saved {
            log::info!(
                "Discount for user {} capped at {} ({} requested)",
                user_id,
                period.discounts_saved,
                period.discounts_requested
            );
        }
        self.publish(&period, tier);
        Ok(period)
    }

    /// Current usage with limits and warnings. `tier` overrides the tier
    /// recorded on the period; with neither, STARTER applies.
    pub fn get_usage(
        &self,
        user_id: Uuid,
        tier: Option<SubscriptionTier>,
    ) -> Result<UsageSummary, UsageError> {
        let now = self.clock.now();
        let existing = self.db.get_current(&user_id)?;
        let tier = tier
            .or_else(|| existing.as_ref().map(|p| p.tier))
            .unwrap_or(SubscriptionTier::Starter);

        let usage = match existing {
            Some(period) if period.is_expired(now) => self.db.update_current(&user_id, |existing| {
                let (superseded, current) = effective_period(existing, user_id, tier, now).split();
                Ok(PeriodWrite { superseded, current })
            })?,
            Some(period) => period,
            // Nothing is stored until the first tracked event.
            None => effective_period(None, user_id, tier, now).into_period(),
        };

        let warnings = check_usage_warnings(&usage, tier);
        let status = usage.status(now, &warnings);
        Ok(UsageSummary {
            usage,
            limits: tier.limits(),
            warnings,
            status,
        })
    }

    /// Zeroes the user's counters, or rotates to a fresh period when the
    /// stored one has ended. Returns `None` when the user has no usage yet.
    pub fn reset_usage_for_period(&self, user_id: Uuid) -> Result<Option<UsagePeriod>, UsageError> {
        let now = self.clock.now();

        let result = self.db.update_current(&user_id, |existing| {
            let existing = existing.ok_or_else(|| {
                UsageError::NotFound(format!("No usage period for user {}", user_id))
            })?;
            let tier = existing.tier;
            match effective_period(Some(existing), user_id, tier, now) {
                EffectivePeriod::RolledOver { previous, next } => Ok(PeriodWrite {
                    superseded: Some(previous),
                    current: next,
                }),
                resolved => {
                    let mut current = resolved.into_period();
                    current.clear_counters(now);
                    Ok(PeriodWrite { superseded: None, current })
                }
            }
        });

        match result {
            Ok(period) => {
                log::info!("Reset usage for user {}", user_id);
                self.publish(&period, period.tier);
                Ok(Some(period))
            }
            Err(UsageError::NotFound(msg)) => {
                log::debug!("Reset skipped: {}", msg);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn usage_history(&self, user_id: Uuid) -> Result<Vec<UsagePeriod>, UsageError> {
        self.db.get_history(&user_id)
    }

    fn publish(&self, period: &UsagePeriod, tier: SubscriptionTier) {
        self.notifier.notify(UsageEvent {
            user_id: period.user_id,
            usage: period.clone(),
            warnings: check_usage_warnings(period, tier),
            emitted_at: self.clock.now(),
        });
    }
}
