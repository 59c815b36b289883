use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CampaignError;

// ─── Experimentation ────────────────────────────────────────────────────

/// Caller-chosen variant identifier, unique within one experiment.
pub type VariantId = String;

/// One arm of an A/B/n experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub name: String,
    /// Traffic share in [0, 1]. Weights need not sum to 1.
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub sample_size: u64,
    #[serde(default)]
    pub conversions: u64,
    #[serde(default)]
    pub revenue: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Variant {
    pub fn new(id: impl Into<VariantId>, name: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weight,
            sample_size: 0,
            conversions: 0,
            revenue: 0.0,
        }
    }

    /// Snapshot with pre-filled counters.
    pub fn with_counts(mut self, sample_size: u64, conversions: u64) -> Self {
        self.sample_size = sample_size;
        self.conversions = conversions;
        self
    }

    /// Conversions divided by samples; 0 when nothing has been sampled.
    pub fn conversion_rate(&self) -> f64 {
        if self.sample_size == 0 {
            0.0
        } else {
            self.conversions as f64 / self.sample_size as f64
        }
    }

    /// Count one exposure, optionally converted. Counters only grow.
    pub fn record(&mut self, converted: bool, revenue: f64) {
        self.sample_size += 1;
        if converted {
            self.conversions += 1;
            self.revenue += revenue.max(0.0);
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    Draft,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl ExperimentStatus {
    pub fn can_transition_to(&self, next: ExperimentStatus) -> bool {
        use ExperimentStatus::*;
        matches!(
            (self, next),
            (Draft, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Completed)
                | (Paused, Completed)
                | (Draft, Cancelled)
                | (Running, Cancelled)
                | (Paused, Cancelled)
        )
    }
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExperimentStatus::Draft => "draft",
            ExperimentStatus::Running => "running",
            ExperimentStatus::Paused => "paused",
            ExperimentStatus::Completed => "completed",
            ExperimentStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A/B/n experiment definition. `variants[0]` is the control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ExperimentStatus,
    pub variants: Vec<Variant>,
    pub metric: String,
    pub min_sample_size: u64,
    pub confidence_level: f64,
    pub winner: Option<VariantId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Experiment {
    pub fn control(&self) -> Option<&Variant> {
        self.variants.first()
    }

    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    pub fn total_samples(&self) -> u64 {
        self.variants.iter().map(|v| v.sample_size).sum()
    }
}

// ─── Attribution ────────────────────────────────────────────────────────

/// One recorded marketing interaction on a customer's path to conversion.
/// Attribution uses list position, so callers supply touchpoints in
/// ascending time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Touchpoint {
    pub channel: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub campaign_id: Option<Uuid>,
    #[serde(default)]
    pub interaction_type: Option<String>,
}

impl Touchpoint {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            timestamp: None,
            campaign_id: None,
            interaction_type: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AttributionModel {
    FirstTouch,
    LastTouch,
    Linear,
    TimeDecay,
    PositionBased,
}

impl AttributionModel {
    pub const ALL: [AttributionModel; 5] = [
        AttributionModel::FirstTouch,
        AttributionModel::LastTouch,
        AttributionModel::Linear,
        AttributionModel::TimeDecay,
        AttributionModel::PositionBased,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributionModel::FirstTouch => "first_touch",
            AttributionModel::LastTouch => "last_touch",
            AttributionModel::Linear => "linear",
            AttributionModel::TimeDecay => "time_decay",
            AttributionModel::PositionBased => "position_based",
        }
    }
}

impl fmt::Display for AttributionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributionModel {
    type Err = CampaignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        AttributionModel::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| CampaignError::UnknownAttributionModel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_rate_zero_samples() {
        let v = Variant::new("control", "Control", 0.5);
        assert_eq!(v.conversion_rate(), 0.0);
    }

    #[test]
    fn test_record_only_grows() {
        let mut v = Variant::new("b", "Variant B", 0.5);
        v.record(false, 0.0);
        v.record(true, 20.0);
        v.record(true, -5.0);
        assert_eq!(v.sample_size, 3);
        assert_eq!(v.conversions, 2);
        assert!((v.revenue - 20.0).abs() < 1e-12);
        assert!((v.conversion_rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_status_transitions() {
        use ExperimentStatus::*;
        assert!(Draft.can_transition_to(Running));
        assert!(Paused.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Running));
        assert!(!Draft.can_transition_to(Paused));
        assert!(!Cancelled.can_transition_to(Draft));
    }

    #[test]
    fn test_parse_attribution_model() {
        assert_eq!(
            "time-decay".parse::<AttributionModel>().unwrap(),
            AttributionModel::TimeDecay
        );
        assert_eq!(
            " Position_Based ".parse::<AttributionModel>().unwrap(),
            AttributionModel::PositionBased
        );
        let err = "u_shaped".parse::<AttributionModel>().unwrap_err();
        assert!(matches!(err, CampaignError::UnknownAttributionModel(name) if name == "u_shaped"));
    }

    #[test]
    fn test_model_serde_names() {
        let json = serde_json::to_string(&AttributionModel::FirstTouch).unwrap();
        assert_eq!(json, "\"first_touch\"");
        for model in AttributionModel::ALL {
            let parsed: AttributionModel =
                serde_json::from_str(&format!("\"{}\"", model.as_str())).unwrap();
            assert_eq!(parsed, model);
        }
    }
}
