//! Point tables for lead scoring.

use crate::types::{ActivityKind, Seniority};

pub const INDUSTRY_MAX: f64 = 15.0;
pub const COMPANY_SIZE_MAX: f64 = 15.0;
pub const SENIORITY_MAX: f64 = 10.0;
pub const ENGAGEMENT_MAX: f64 = 20.0;
pub const INTENT_MAX: f64 = 20.0;
pub const RECENCY_MAX: f64 = 10.0;
pub const ACCOUNT_MAX: f64 = 10.0;

const ADJACENT_INDUSTRY_POINTS: f64 = 8.0;

/// Base weights at or above this count toward intent.
pub const INTENT_WEIGHT_FLOOR: f64 = 15.0;
/// Base weights at or above this (and below intent) count toward engagement
/// at full value; lighter signals count at half.
pub const ENGAGEMENT_WEIGHT_FLOOR: f64 = 5.0;
pub const LIGHT_SIGNAL_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndustryFit {
    Target,
    Adjacent,
    Other,
    Unknown,
}

pub fn industry_fit(industry: Option<&str>, target: &[String], adjacent: &[String]) -> IndustryFit {
    let Some(industry) = industry.map(str::trim).filter(|s| !s.is_empty()) else {
        return IndustryFit::Unknown;
    };
    if target.iter().any(|t| t.eq_ignore_ascii_case(industry)) {
        IndustryFit::Target
    } else if adjacent.iter().any(|a| a.eq_ignore_ascii_case(industry)) {
        IndustryFit::Adjacent
    } else {
        IndustryFit::Other
    }
}

pub fn industry_points(fit: IndustryFit) -> f64 {
    match fit {
        IndustryFit::Target => INDUSTRY_MAX,
        IndustryFit::Adjacent => ADJACENT_INDUSTRY_POINTS,
        IndustryFit::Other | IndustryFit::Unknown => 0.0,
    }
}

pub fn company_size_points(employees: Option<u32>) -> f64 {
    match employees {
        Some(200..=5000) => 15.0,
        Some(50..=199) | Some(5001..=20_000) => 10.0,
        Some(10..=49) => 5.0,
        Some(_) => 2.0,
        None => 0.0,
    }
}

pub fn seniority_points(seniority: Seniority) -> f64 {
    match seniority {
        Seniority::CLevel => 10.0,
        Seniority::Vp => 8.0,
        Seniority::Director => 6.0,
        Seniority::Manager => 4.0,
        Seniority::Individual => 2.0,
        Seniority::Unknown => 0.0,
    }
}

pub fn activity_weight(kind: ActivityKind) -> f64 {
    match kind {
        ActivityKind::DemoRequest | ActivityKind::ContactSales => 25.0,
        ActivityKind::FreeTrialSignup => 20.0,
        ActivityKind::PricingPageView => 15.0,
        ActivityKind::WebinarAttended => 10.0,
        ActivityKind::ContentDownload => 8.0,
        ActivityKind::EmailClick | ActivityKind::EventRegistration => 5.0,
        ActivityKind::EmailOpen => 2.0,
        ActivityKind::PageView => 1.0,
    }
}

/// Decay multiplier for an activity `age_days` old.
pub fn decay_factor(age_days: i64) -> f64 {
    match age_days {
        i64::MIN..=7 => 1.0,
        8..=14 => 0.9,
        15..=30 => 0.7,
        31..=60 => 0.5,
        61..=90 => 0.3,
        _ => 0.1,
    }
}

/// Points for days since the most recent activity.
pub fn recency_points(days_since_last: Option<i64>) -> f64 {
    match days_since_last {
        Some(d) if d <= 7 => 10.0,
        Some(d) if d <= 14 => 8.0,
        Some(d) if d <= 30 => 5.0,
        Some(d) if d <= 60 => 2.0,
        _ => 0.0,
    }
}

pub fn account_points(engaged_contacts: u32) -> f64 {
    match engaged_contacts {
        5.. => 10.0,
        3..=4 => 6.0,
        2 => 3.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_buckets() {
        assert_eq!(decay_factor(-3), 1.0);
        assert_eq!(decay_factor(0), 1.0);
        assert_eq!(decay_factor(7), 1.0);
        assert_eq!(decay_factor(8), 0.9);
        assert_eq!(decay_factor(14), 0.9);
        assert_eq!(decay_factor(30), 0.7);
        assert_eq!(decay_factor(60), 0.5);
        assert_eq!(decay_factor(90), 0.3);
        assert_eq!(decay_factor(91), 0.1);
        assert_eq!(decay_factor(10_000), 0.1);
    }

    #[test]
    fn test_company_size_bands() {
        assert_eq!(company_size_points(None), 0.0);
        assert_eq!(company_size_points(Some(3)), 2.0);
        assert_eq!(company_size_points(Some(10)), 5.0);
        assert_eq!(company_size_points(Some(50)), 10.0);
        assert_eq!(company_size_points(Some(200)), 15.0);
        assert_eq!(company_size_points(Some(5000)), 15.0);
        assert_eq!(company_size_points(Some(5001)), 10.0);
        assert_eq!(company_size_points(Some(50_000)), 2.0);
    }

    #[test]
    fn test_industry_matching_is_case_insensitive() {
        let target = vec!["saas".to_string()];
        let adjacent = vec!["retail".to_string()];
        assert_eq!(industry_fit(Some("SaaS"), &target, &adjacent), IndustryFit::Target);
        assert_eq!(industry_fit(Some(" Retail "), &target, &adjacent), IndustryFit::Adjacent);
        assert_eq!(industry_fit(Some("mining"), &target, &adjacent), IndustryFit::Other);
        assert_eq!(industry_fit(Some(""), &target, &adjacent), IndustryFit::Unknown);
        assert_eq!(industry_fit(None, &target, &adjacent), IndustryFit::Unknown);
    }

    #[test]
    fn test_account_and_recency_tables() {
        assert_eq!(account_points(0), 0.0);
        assert_eq!(account_points(1), 0.0);
        assert_eq!(account_points(2), 3.0);
        assert_eq!(account_points(4), 6.0);
        assert_eq!(account_points(12), 10.0);
        assert_eq!(recency_points(None), 0.0);
        assert_eq!(recency_points(Some(2)), 10.0);
        assert_eq!(recency_points(Some(20)), 5.0);
        assert_eq!(recency_points(Some(61)), 0.0);
    }
}
