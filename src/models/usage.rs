use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::tier::{SubscriptionTier, TierLimits};
use crate::models::warning::UsageWarning;
use crate::utils::error::UsageError;

/// Largest discount accepted in a single tracking call.
pub const MAX_DISCOUNT_PER_EVENT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

static SERVICE_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_-]{0,63}$").expect("static regex"));

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ResourceCategory {
    Services,
    PriorityBookings,
    Discounts,
    EmergencyServices,
}

impl ResourceCategory {
    /// Canonical reporting order.
    pub const ALL: [ResourceCategory; 4] = [
        ResourceCategory::Services,
        ResourceCategory::PriorityBookings,
        ResourceCategory::Discounts,
        ResourceCategory::EmergencyServices,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ResourceCategory::Services => "services",
            ResourceCategory::PriorityBookings => "priority bookings",
            ResourceCategory::Discounts => "discounts",
            ResourceCategory::EmergencyServices => "emergency services",
        }
    }
}

/// What kind of booking a tracked service counts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Standard,
    Priority,
    Emergency,
}

impl ServiceKind {
    pub fn classify(service_type: &str) -> Self {
        if service_type.starts_with("emergency") {
            ServiceKind::Emergency
        } else if service_type.starts_with("priority") {
            ServiceKind::Priority
        } else {
            ServiceKind::Standard
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsagePeriod {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tier: SubscriptionTier,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub services_used: u32,
    pub discounts_saved: Decimal,
    pub discounts_requested: Decimal,
    pub priority_bookings: u32,
    pub emergency_services: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    Empty,
    Normal,
    Warning,
    Expired,
}

impl UsagePeriod {
    pub fn new(
        user_id: Uuid,
        tier: SubscriptionTier,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            tier,
            period_start,
            period_end,
            services_used: 0,
            discounts_saved: Decimal::ZERO,
            discounts_requested: Decimal::ZERO,
            priority_bookings: 0,
            emergency_services: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.period_end
    }

    pub fn is_empty(&self) -> bool {
        self.services_used == 0
            && self.priority_bookings == 0
            && self.emergency_services == 0
            && self.discounts_saved.is_zero()
            && self.discounts_requested.is_zero()
    }

    pub fn record_service(&mut self, kind: ServiceKind, now: DateTime<Utc>) {
        self.services_used = self.services_used.saturating_add(1);
        match kind {
            ServiceKind::Priority => {
                self.priority_bookings = self.priority_bookings.saturating_add(1)
            }
            ServiceKind::Emergency => {
                self.emergency_services = self.emergency_services.saturating_add(1)
            }
            ServiceKind::Standard => {}
        }
        self.updated_at = now;
    }

    /// Adds to the discount totals. The stored amount is capped by `limits`;
    /// the uncapped total keeps the excess. Nothing changes if either total
    /// would overflow.
    pub fn record_discount(
        &mut self,
        amount: Decimal,
        limits: &TierLimits,
        now: DateTime<Utc>,
    ) -> Result<(), UsageError> {
        let overflow = || {
            UsageError::Validation(format!("Discount amount {} overflows the period total", amount))
        };
        let requested = self.discounts_requested.checked_add(amount).ok_or_else(overflow)?;
        let saved = self.discounts_saved.checked_add(amount).ok_or_else(overflow)?;

        self.discounts_requested = requested;
        self.discounts_saved = limits.clamp_discount(saved);
        self.updated_at = now;
        Ok(())
    }

    pub fn clear_counters(&mut self, now: DateTime<Utc>) {
        self.services_used = 0;
        self.discounts_saved = Decimal::ZERO;
        self.discounts_requested = Decimal::ZERO;
        self.priority_bookings = 0;
        self.emergency_services = 0;
        self.updated_at = now;
    }

    /// Current consumption of a category, as a decimal for uniform comparison.
    pub fn used(&self, category: ResourceCategory) -> Decimal {
        match category {
            ResourceCategory::Services => Decimal::from(self.services_used),
            ResourceCategory::PriorityBookings => Decimal::from(self.priority_bookings),
            ResourceCategory::Discounts => self.discounts_saved,
            ResourceCategory::EmergencyServices => Decimal::from(self.emergency_services),
        }
    }

    pub fn status(&self, now: DateTime<Utc>, warnings: &[UsageWarning]) -> PeriodStatus {
        if self.is_expired(now) {
            PeriodStatus::Expired
        } else if self.is_empty() {
            PeriodStatus::Empty
        } else if warnings.is_empty() {
            PeriodStatus::Normal
        } else {
            PeriodStatus::Warning
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    #[serde(flatten)]
    pub usage: UsagePeriod,
    pub limits: TierLimits,
    pub warnings: Vec<UsageWarning>,
    pub status: PeriodStatus,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackUsageRequest {
    #[validate(custom = "validate_service_type")]
    pub service_type: String,
    pub subscription_tier: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackDiscountRequest {
    #[validate(custom = "validate_discount_amount")]
    pub discount_amount: Decimal,
    pub subscription_tier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageQuery {
    pub subscription_tier: Option<String>,
}

fn validate_service_type(service_type: &str) -> Result<(), ValidationError> {
    if !SERVICE_TYPE_RE.is_match(service_type) {
        let mut err = ValidationError::new("service_type");
        err.message = Some("serviceType must be a lowercase identifier".into());
        return Err(err);
    }
    Ok(())
}

fn validate_discount_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        let mut err = ValidationError::new("negative_amount");
        err.message = Some("discountAmount must not be negative".into());
        return Err(err);
    }
    if *amount > MAX_DISCOUNT_PER_EVENT {
        let mut err = ValidationError::new("discount_too_large");
        err.message = Some("discountAmount exceeds the per-booking maximum".into());
        return Err(err);
    }
    Ok(())
}
