use std::path::Path;

use serde::Deserialize;

use crate::error::{CampaignError, CampaignResult};

/// Root application configuration. Loaded from an optional TOML file, then
/// environment variables with the prefix `CAMPAIGN_INSIGHTS__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub experimentation: ExperimentationConfig,
    #[serde(default)]
    pub attribution: AttributionConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

// ─── Experimentation Config ─────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentationConfig {
    /// Control samples required before significance is evaluated.
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: u64,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

fn default_min_sample_size() -> u64 {
    100
}
fn default_confidence_level() -> f64 {
    0.95
}

impl Default for ExperimentationConfig {
    fn default() -> Self {
        Self {
            min_sample_size: default_min_sample_size(),
            confidence_level: default_confidence_level(),
        }
    }
}

// ─── Attribution Config ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AttributionConfig {
    /// Model name, parsed with `AttributionModel::from_str`.
    #[serde(default = "default_attribution_model")]
    pub default_model: String,
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

fn default_attribution_model() -> String {
    "linear".to_string()
}
fn default_window_days() -> u32 {
    30
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            default_model: default_attribution_model(),
            window_days: default_window_days(),
        }
    }
}

// ─── Scoring Config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_target_industries")]
    pub target_industries: Vec<String>,
    #[serde(default = "default_adjacent_industries")]
    pub adjacent_industries: Vec<String>,
    /// Intent points a lead must exceed before it can be routed to sales.
    #[serde(default = "default_intent_threshold")]
    pub intent_threshold: f64,
    #[serde(default = "default_include_account_score")]
    pub include_account_score: bool,
}

fn default_target_industries() -> Vec<String> {
    vec!["saas".to_string(), "fintech".to_string(), "ecommerce".to_string()]
}
fn default_adjacent_industries() -> Vec<String> {
    vec!["retail".to_string(), "media".to_string(), "healthcare".to_string()]
}
fn default_intent_threshold() -> f64 {
    10.0
}
fn default_include_account_score() -> bool {
    true
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            target_industries: default_target_industries(),
            adjacent_industries: default_adjacent_industries(),
            intent_threshold: default_intent_threshold(),
            include_account_score: default_include_account_score(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and environment variables.
    pub fn load(path: Option<&Path>) -> CampaignResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("CAMPAIGN_INSIGHTS")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("scoring.target_industries")
                .with_list_parse_key("scoring.adjacent_industries"),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CampaignResult<()> {
        let level = self.experimentation.confidence_level;
        if !(level > 0.0 && level < 1.0) {
            return Err(CampaignError::Config(format!(
                "experimentation.confidence_level must be in (0, 1), got {level}"
            )));
        }
        if self.scoring.intent_threshold < 0.0 {
            return Err(CampaignError::Config(
                "scoring.intent_threshold must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.experimentation.min_sample_size, 100);
        assert!((config.experimentation.confidence_level - 0.95).abs() < 1e-12);
        assert_eq!(config.attribution.default_model, "linear");
        assert_eq!(config.attribution.window_days, 30);
        assert!(config.scoring.include_account_score);
    }

    #[test]
    fn test_rejects_out_of_range_confidence() {
        let mut config = AppConfig::default();
        config.experimentation.confidence_level = 1.0;
        assert!(matches!(config.validate(), Err(CampaignError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("CAMPAIGN_INSIGHTS__EXPERIMENTATION__CONFIDENCE_LEVEL", "0.99");
        std::env::set_var("CAMPAIGN_INSIGHTS__SCORING__TARGET_INDUSTRIES", "b2b,gaming");
        let loaded = AppConfig::load(None);
        std::env::remove_var("CAMPAIGN_INSIGHTS__EXPERIMENTATION__CONFIDENCE_LEVEL");
        std::env::remove_var("CAMPAIGN_INSIGHTS__SCORING__TARGET_INDUSTRIES");

        let config = loaded.unwrap();
        assert!((config.experimentation.confidence_level - 0.99).abs() < 1e-12);
        assert_eq!(config.experimentation.min_sample_size, 100);
        assert_eq!(config.scoring.target_industries, vec!["b2b", "gaming"]);
        assert_eq!(config.scoring.adjacent_industries.len(), 3);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"experimentation": {"min_sample_size": 500}}"#).unwrap();
        assert_eq!(config.experimentation.min_sample_size, 500);
        assert!((config.experimentation.confidence_level - 0.95).abs() < 1e-12);
        assert_eq!(config.scoring.target_industries.len(), 3);
    }
}
