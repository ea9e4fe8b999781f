use rust_decimal::Decimal;

use crate::models::tier::{SubscriptionTier, TierLimits};
use crate::models::usage::{ResourceCategory, UsagePeriod};
use crate::models::warning::{Severity, UsageWarning, WarningKind};

/// Percentage of a limit at which a category starts warning.
pub const WARNING_THRESHOLD_PERCENT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

fn limit_for(limits: &TierLimits, category: ResourceCategory) -> Option<Decimal> {
    match category {
        ResourceCategory::Services => limits.max_services_per_month.map(Decimal::from),
        ResourceCategory::PriorityBookings => limits.max_priority_bookings.map(Decimal::from),
        ResourceCategory::Discounts => limits.max_discount_amount,
        ResourceCategory::EmergencyServices => limits.max_emergency_services.map(Decimal::from),
    }
}

/// Warnings for `usage` under `tier`, most severe first. Pure: identical
/// inputs always produce identical output.
pub fn check_usage_warnings(usage: &UsagePeriod, tier: SubscriptionTier) -> Vec<UsageWarning> {
    let limits = tier.limits();
    let next_limits = tier.next().map(|t| t.limits());

    let mut warnings = Vec::new();
    for category in ResourceCategory::ALL {
        let Some(limit) = limit_for(&limits, category) else {
            continue;
        };
        let used = usage.used(category);
        let Some(severity) = severity_for(used, limit) else {
            continue;
        };
        let percentage = percentage_of(used, limit);

        if severity == Severity::Warning {
            warnings.push(UsageWarning {
                kind: WarningKind::ApproachingLimit,
                severity,
                category,
                current_usage: used,
                limit,
                percentage,
                suggested_tier: None,
                message: format!(
                    "You have used {}% of your {} allowance",
                    percentage.unwrap_or_default().round_dp(0),
                    category.label()
                ),
            });
            continue;
        }

        warnings.push(UsageWarning {
            kind: WarningKind::LimitReached,
            severity,
            category,
            current_usage: used,
            limit,
            percentage,
            suggested_tier: None,
            message: format!("You have reached your {} limit for this period", category.label()),
        });

        if let Some(next) = next_limits.as_ref() {
            let accommodates = match limit_for(next, category) {
                None => true,
                Some(next_limit) => used <= next_limit,
            };
            if accommodates {
                warnings.push(UsageWarning {
                    kind: WarningKind::UpgradeSuggested,
                    severity,
                    category,
                    current_usage: used,
                    limit,
                    percentage,
                    suggested_tier: Some(next.tier),
                    message: format!(
                        "Upgrade to {} for more {}",
                        next.tier,
                        category.label()
                    ),
                });
            }
        }
    }

    // Stable sort keeps canonical category order and LIMIT_REACHED before
    // UPGRADE_SUGGESTED within one severity.
    warnings.sort_by(|a, b| b.severity.cmp(&a.severity));
    warnings
}

/// `None` below the warning threshold. A zero limit means no access, so
/// only non-zero usage of it is reported.
fn severity_for(used: Decimal, limit: Decimal) -> Option<Severity> {
    if limit.is_zero() {
        return (used > Decimal::ZERO).then_some(Severity::Exceeded);
    }
    let percentage = used * Decimal::ONE_HUNDRED / limit;
    if used > limit {
        Some(Severity::Exceeded)
    } else if used == limit {
        Some(Severity::Critical)
    } else if percentage >= WARNING_THRESHOLD_PERCENT {
        Some(Severity::Warning)
    } else {
        None
    }
}

fn percentage_of(used: Decimal, limit: Decimal) -> Option<Decimal> {
    if limit.is_zero() {
        return None;
    }
    Some((used * Decimal::ONE_HUNDRED / limit).round_dp(2))
}
