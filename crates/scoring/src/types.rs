use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Inputs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    CLevel,
    Vp,
    Director,
    Manager,
    Individual,
    #[default]
    Unknown,
}

/// Tracked prospect activity, each with a fixed base weight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    DemoRequest,
    ContactSales,
    FreeTrialSignup,
    PricingPageView,
    WebinarAttended,
    ContentDownload,
    EmailClick,
    EventRegistration,
    EmailOpen,
    PageView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub employee_count: Option<u32>,
    #[serde(default)]
    pub seniority: Seniority,
    #[serde(default)]
    pub activities: Vec<ActivityEvent>,
    /// Other contacts at the same account that have engaged.
    #[serde(default)]
    pub account_engaged_contacts: Option<u32>,
}

// ─── Outputs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Industry,
    CompanySize,
    Seniority,
    Engagement,
    Intent,
    Recency,
    Account,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub category: ScoreCategory,
    pub points: f64,
    pub max_points: f64,
    pub reason: String,
}

impl ScoreComponent {
    pub(crate) fn new(
        category: ScoreCategory,
        points: f64,
        max_points: f64,
        reason: String,
    ) -> Self {
        Self {
            category,
            points: points.clamp(0.0, max_points),
            max_points,
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 80.0 {
            Grade::A
        } else if pct >= 60.0 {
            Grade::B
        } else if pct >= 40.0 {
            Grade::C
        } else if pct >= 20.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeadStage {
    SalesReady,
    MarketingQualified,
    Nurture,
    Cold,
}

impl LeadStage {
    pub fn recommend(pct: f64, high_intent: bool) -> Self {
        if pct >= 70.0 && high_intent {
            LeadStage::SalesReady
        } else if pct >= 50.0 || high_intent {
            LeadStage::MarketingQualified
        } else if pct >= 25.0 {
            LeadStage::Nurture
        } else {
            LeadStage::Cold
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadScore {
    pub lead_id: String,
    pub components: Vec<ScoreComponent>,
    pub total: f64,
    pub max_total: f64,
    pub percentage: f64,
    pub grade: Grade,
    pub stage: LeadStage,
    pub scored_at: DateTime<Utc>,
}

impl LeadScore {
    pub fn component(&self, category: ScoreCategory) -> Option<&ScoreComponent> {
        self.components.iter().find(|c| c.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_seniority_is_unknown() {
        assert_eq!(Seniority::default(), Seniority::Unknown);
        assert_eq!(Lead::default().seniority, Seniority::Unknown);
    }

    #[test]
    fn test_grade_steps() {
        assert_eq!(Grade::from_percentage(100.0), Grade::A);
        assert_eq!(Grade::from_percentage(80.0), Grade::A);
        assert_eq!(Grade::from_percentage(79.9), Grade::B);
        assert_eq!(Grade::from_percentage(60.0), Grade::B);
        assert_eq!(Grade::from_percentage(40.0), Grade::C);
        assert_eq!(Grade::from_percentage(20.0), Grade::D);
        assert_eq!(Grade::from_percentage(19.9), Grade::F);
    }

    #[test]
    fn test_stage_requires_intent_for_sales() {
        assert_eq!(LeadStage::recommend(90.0, true), LeadStage::SalesReady);
        assert_eq!(LeadStage::recommend(90.0, false), LeadStage::MarketingQualified);
        assert_eq!(LeadStage::recommend(10.0, true), LeadStage::MarketingQualified);
        assert_eq!(LeadStage::recommend(30.0, false), LeadStage::Nurture);
        assert_eq!(LeadStage::recommend(5.0, false), LeadStage::Cold);
    }

    #[test]
    fn test_component_points_are_capped() {
        let c = ScoreComponent::new(ScoreCategory::Intent, 37.5, 20.0, String::new());
        assert_eq!(c.points, 20.0);
    }
}
