use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::utils::error::UsageError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionTier {
    Starter,
    Homecare,
    Priority,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 3] = [
        SubscriptionTier::Starter,
        SubscriptionTier::Homecare,
        SubscriptionTier::Priority,
    ];

    /// The next tier up, or `None` for the top tier.
    pub fn next(&self) -> Option<SubscriptionTier> {
        match self {
            SubscriptionTier::Starter => Some(SubscriptionTier::Homecare),
            SubscriptionTier::Homecare => Some(SubscriptionTier::Priority),
            SubscriptionTier::Priority => None,
        }
    }

    pub fn limits(&self) -> TierLimits {
        TierLimits::for_tier(*self)
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionTier::Starter => write!(f, "STARTER"),
            SubscriptionTier::Homecare => write!(f, "HOMECARE"),
            SubscriptionTier::Priority => write!(f, "PRIORITY"),
        }
    }
}

impl FromStr for SubscriptionTier {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STARTER" => Ok(SubscriptionTier::Starter),
            "HOMECARE" => Ok(SubscriptionTier::Homecare),
            "PRIORITY" => Ok(SubscriptionTier::Priority),
            other => Err(UsageError::Validation(format!(
                "Invalid subscription tier: {}",
                other
            ))),
        }
    }
}

/// Per-tier caps. `None` is unlimited, `Some(0)` is no access.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierLimits {
    pub tier: SubscriptionTier,
    pub max_services_per_month: Option<u32>,
    pub max_discount_amount: Option<Decimal>,
    pub max_priority_bookings: Option<u32>,
    pub max_emergency_services: Option<u32>,
}

impl TierLimits {
    /// | Tier | Services | Discount | Priority | Emergency |
    /// |------|----------|----------|----------|-----------|
    /// | Starter | 4 | 25.00 | 0 | 0 |
    /// | Homecare | 8 | 100.00 | 2 | 1 |
    /// | Priority | Unlimited | 300.00 | Unlimited | Unlimited |
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Starter => Self {
                tier,
                max_services_per_month: Some(4),
                max_discount_amount: Some(Decimal::new(25_00, 2)),
                max_priority_bookings: Some(0),
                max_emergency_services: Some(0),
            },
            SubscriptionTier::Homecare => Self {
                tier,
                max_services_per_month: Some(8),
                max_discount_amount: Some(Decimal::new(100_00, 2)),
                max_priority_bookings: Some(2),
                max_emergency_services: Some(1),
            },
            SubscriptionTier::Priority => Self {
                tier,
                max_services_per_month: None,
                max_discount_amount: Some(Decimal::new(300_00, 2)),
                max_priority_bookings: None,
                max_emergency_services: None,
            },
        }
    }

    /// Caps a running discount total at the tier maximum.
    pub fn clamp_discount(&self, amount: Decimal) -> Decimal {
        match self.max_discount_amount {
            Some(max) => amount.min(max),
            None => amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_has_four_services() {
        let limits = TierLimits::for_tier(SubscriptionTier::Starter);
        assert_eq!(limits.max_services_per_month, Some(4));
        assert_eq!(limits.max_emergency_services, Some(0));
    }

    #[test]
    fn homecare_discount_cap_is_one_hundred() {
        let limits = SubscriptionTier::Homecare.limits();
        assert_eq!(limits.max_discount_amount, Some(Decimal::new(100, 0)));
        assert_eq!(limits.max_services_per_month, Some(8));
    }

    #[test]
    fn priority_tier_is_unlimited_for_counts() {
        let limits = SubscriptionTier::Priority.limits();
        assert_eq!(limits.max_services_per_month, None);
        assert_eq!(limits.max_priority_bookings, None);
        assert_eq!(limits.max_emergency_services, None);
    }

    #[test]
    fn tiers_are_ordered_and_chain_upwards() {
        assert!(SubscriptionTier::Starter < SubscriptionTier::Homecare);
        assert_eq!(SubscriptionTier::Starter.next(), Some(SubscriptionTier::Homecare));
        assert_eq!(SubscriptionTier::Homecare.next(), Some(SubscriptionTier::Priority));
        assert_eq!(SubscriptionTier::Priority.next(), None);
    }

    #[test]
    fn tier_parsing_is_case_insensitive() {
        assert_eq!("homecare".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::Homecare);
        assert_eq!(" PRIORITY ".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::Priority);
        assert!(matches!(
            "GOLD".parse::<SubscriptionTier>(),
            Err(UsageError::Validation(_))
        ));
    }

    #[test]
    fn clamp_discount_respects_cap() {
        let limits = SubscriptionTier::Homecare.limits();
        assert_eq!(limits.clamp_discount(Decimal::new(120, 0)), Decimal::new(100, 0));
        assert_eq!(limits.clamp_discount(Decimal::new(40, 0)), Decimal::new(40, 0));
    }
}
