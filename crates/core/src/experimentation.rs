//! Experiment registry: lifecycle, variant assignment and event recording.
//!
//! Each experiment lives in its own `DashMap` entry, so recording an event
//! holds that entry's write lock and writes to one experiment are
//! serialized. Significance checks evaluate a cloned snapshot.

use std::collections::HashSet;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ExperimentationConfig;
use crate::error::{CampaignError, CampaignResult};
use crate::significance::{SignificanceEngine, SignificanceResult};
use crate::types::{Experiment, ExperimentStatus, Variant, VariantId};

/// Request to create an experiment. Thresholds fall back to config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExperiment {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub variants: Vec<Variant>,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default)]
    pub min_sample_size: Option<u64>,
    #[serde(default)]
    pub confidence_level: Option<f64>,
}

fn default_metric() -> String {
    "conversion_rate".to_string()
}

/// One exposure of a user to a variant.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExposureEvent {
    pub converted: bool,
    #[serde(default)]
    pub revenue: f64,
}

impl ExposureEvent {
    pub fn impression() -> Self {
        Self::default()
    }

    pub fn conversion(revenue: f64) -> Self {
        Self {
            converted: true,
            revenue,
        }
    }
}

/// Experimentation engine for A/B/n testing
pub struct ExperimentEngine {
    experiments: DashMap<Uuid, Experiment>,
    defaults: ExperimentationConfig,
}

impl ExperimentEngine {
    pub fn new(defaults: ExperimentationConfig) -> Self {
        Self {
            experiments: DashMap::new(),
            defaults,
        }
    }

    pub fn create_experiment(&self, request: NewExperiment) -> CampaignResult<Uuid> {
        if request.variants.is_empty() {
            return Err(CampaignError::Validation(
                "experiment needs at least one variant".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for variant in &request.variants {
            if !seen.insert(variant.id.as_str()) {
                return Err(CampaignError::Validation(format!(
                    "duplicate variant id: {}",
                    variant.id
                )));
            }
            if !(0.0..=1.0).contains(&variant.weight) {
                return Err(CampaignError::Validation(format!(
                    "variant {} weight {} outside [0, 1]",
                    variant.id, variant.weight
                )));
            }
        }
        let confidence_level = request
            .confidence_level
            .unwrap_or(self.defaults.confidence_level);
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(CampaignError::Validation(format!(
                "confidence level must be in (0, 1), got {confidence_level}"
            )));
        }

        let now = Utc::now();
        let experiment = Experiment {
            id: Uuid::new_v4(),
            name: request.name,
            description: request.description,
            status: ExperimentStatus::Draft,
            variants: request
                .variants
                .into_iter()
                .map(|v| Variant::new(v.id, v.name, v.weight))
                .collect(),
            metric: request.metric,
            min_sample_size: request
                .min_sample_size
                .unwrap_or(self.defaults.min_sample_size),
            confidence_level,
            winner: None,
            created_at: now,
            updated_at: now,
        };
        let id = experiment.id;
        info!(
            experiment_id = %id,
            name = %experiment.name,
            variants = experiment.variants.len(),
            "Experiment created"
        );
        self.experiments.insert(id, experiment);
        Ok(id)
    }

    pub fn get_experiment(&self, id: &Uuid) -> Option<Experiment> {
        self.experiments.get(id).map(|e| e.clone())
    }

    pub fn list_experiments(&self) -> Vec<Experiment> {
        let mut all: Vec<Experiment> = self.experiments.iter().map(|e| e.clone()).collect();
        all.sort_by_key(|e| e.created_at);
        all
    }

    pub fn transition(&self, id: &Uuid, next: ExperimentStatus) -> CampaignResult<()> {
        let mut experiment = self
            .experiments
            .get_mut(id)
            .ok_or(CampaignError::ExperimentNotFound(*id))?;
        if !experiment.status.can_transition_to(next) {
            return Err(CampaignError::InvalidStatusTransition {
                from: experiment.status.to_string(),
                to: next.to_string(),
            });
        }
        info!(
            experiment_id = %id,
            from = %experiment.status,
            to = %next,
            "Experiment status changed"
        );
        experiment.status = next;
        experiment.updated_at = Utc::now();
        Ok(())
    }

    pub fn start(&self, id: &Uuid) -> CampaignResult<()> {
        self.transition(id, ExperimentStatus::Running)
    }

    pub fn pause(&self, id: &Uuid) -> CampaignResult<()> {
        self.transition(id, ExperimentStatus::Paused)
    }

    pub fn complete(&self, id: &Uuid) -> CampaignResult<()> {
        self.transition(id, ExperimentStatus::Completed)
    }

    /// Deterministic variant assignment for a running experiment.
    pub fn assign_variant(&self, experiment_id: &Uuid, user_id: &str) -> Option<VariantId> {
        let experiment = self.experiments.get(experiment_id)?;
        if experiment.status != ExperimentStatus::Running {
            return None;
        }
        let total_weight: f64 = experiment.variants.iter().map(|v| v.weight).sum();
        if total_weight <= 0.0 {
            return experiment.variants.first().map(|v| v.id.clone());
        }

        let normalized = (hash_user(user_id) % 10_000) as f64 / 10_000.0;
        let mut cumulative = 0.0;
        for variant in &experiment.variants {
            cumulative += variant.weight / total_weight;
            if normalized < cumulative {
                return Some(variant.id.clone());
            }
        }
        experiment.variants.last().map(|v| v.id.clone())
    }

    /// Record one exposure (and optional conversion) against a variant.
    pub fn record_event(
        &self,
        experiment_id: &Uuid,
        variant_id: &str,
        event: ExposureEvent,
    ) -> CampaignResult<()> {
        let mut experiment = self
            .experiments
            .get_mut(experiment_id)
            .ok_or(CampaignError::ExperimentNotFound(*experiment_id))?;
        if experiment.status != ExperimentStatus::Running {
            return Err(CampaignError::Validation(format!(
                "experiment {} is {}, not running",
                experiment_id, experiment.status
            )));
        }
        let variant = experiment
            .variants
            .iter_mut()
            .find(|v| v.id == variant_id)
            .ok_or_else(|| CampaignError::VariantNotFound {
                experiment_id: *experiment_id,
                variant_id: variant_id.to_string(),
            })?;
        variant.record(event.converted, event.revenue);
        experiment.updated_at = Utc::now();
        metrics::counter!("experiments.events_recorded").increment(1);
        Ok(())
    }

    /// Evaluate significance on the current counters.
    ///
    /// Declares the winner on first significant result; a declared winner
    /// is kept even if later samples weaken the result.
    pub fn check_significance(&self, experiment_id: &Uuid) -> CampaignResult<SignificanceResult> {
        let snapshot = self
            .get_experiment(experiment_id)
            .ok_or(CampaignError::ExperimentNotFound(*experiment_id))?;
        let engine = SignificanceEngine::new(snapshot.min_sample_size, snapshot.confidence_level);
        let result = engine.try_evaluate(&snapshot.variants)?;
        metrics::counter!("experiments.significance_checks").increment(1);
        debug!(
            experiment_id = %experiment_id,
            total_samples = snapshot.total_samples(),
            confidence = result.confidence,
            "Significance checked"
        );

        if let Some(winner) = &result.winner {
            if let Some(mut experiment) = self.experiments.get_mut(experiment_id) {
                if experiment.winner.is_none() {
                    info!(
                        experiment_id = %experiment_id,
                        winner = %winner,
                        confidence = result.confidence,
                        "Experiment winner declared"
                    );
                    experiment.winner = Some(winner.clone());
                    experiment.updated_at = Utc::now();
                    metrics::counter!("experiments.winners_declared").increment(1);
                }
            }
        }
        Ok(result)
    }
}

impl Default for ExperimentEngine {
    fn default() -> Self {
        Self::new(ExperimentationConfig::default())
    }
}

/// FNV-1a over the user id bytes.
fn hash_user(user_id: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in user_id.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
