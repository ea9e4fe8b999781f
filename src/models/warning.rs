use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::tier::SubscriptionTier;
use crate::models::usage::ResourceCategory;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    ApproachingLimit,
    LimitReached,
    UpgradeSuggested,
}

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
    Exceeded,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageWarning {
    pub kind: WarningKind,
    pub severity: Severity,
    pub category: ResourceCategory,
    pub current_usage: Decimal,
    pub limit: Decimal,
    /// Share of the limit used. Absent when the limit is zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_tier: Option<SubscriptionTier>,
    pub message: String,
}
