//! Synthetic traffic generator. Workers assign visitors, draw conversions
//! and record them into a shared `ExperimentEngine` concurrently.

use std::sync::Arc;

use anyhow::{bail, Context};
use campaign_core::config::AppConfig;
use campaign_core::{ExperimentEngine, ExposureEvent, NewExperiment, SignificanceResult, Variant};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub control_rate: f64,
    pub variant_rates: Vec<f64>,
    pub visitors: u64,
    pub workers: u64,
    pub seed: u64,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub visitors: u64,
    pub workers: u64,
    pub true_rates: Vec<(String, f64)>,
    pub result: SignificanceResult,
}

pub async fn run(config: &AppConfig, params: SimulationParams) -> anyhow::Result<SimulationReport> {
    let rates: Vec<f64> = std::iter::once(params.control_rate)
        .chain(params.variant_rates.iter().copied())
        .collect();
    if let Some(bad) = rates.iter().find(|r| !(0.0..=1.0).contains(*r)) {
        bail!("conversion rate {bad} outside [0, 1]");
    }
    if params.workers == 0 {
        bail!("at least one worker is required");
    }
    // Workers beyond one per visitor would sit idle.
    let workers = params.workers.min(params.visitors.max(1));

    let engine = Arc::new(ExperimentEngine::new(config.experimentation.clone()));
    let weight = 1.0 / rates.len() as f64;
    let variants: Vec<Variant> = rates
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i == 0 {
                Variant::new("control", "Control", weight)
            } else {
                Variant::new(format!("variant-{i}"), format!("Variant {i}"), weight)
            }
        })
        .collect();
    let true_rates: Vec<(String, f64)> = variants
        .iter()
        .map(|v| v.id.clone())
        .zip(rates.iter().copied())
        .collect();

    let experiment_id = engine.create_experiment(NewExperiment {
        name: "simulation".to_string(),
        description: format!("{} visitors across {workers} workers", params.visitors),
        variants,
        metric: "conversion_rate".to_string(),
        min_sample_size: None,
        confidence_level: None,
    })?;
    engine.start(&experiment_id)?;
    info!(
        %experiment_id,
        visitors = params.visitors,
        workers,
        "Simulation started"
    );

    let per_worker = params.visitors / workers;
    let remainder = params.visitors % workers;
    let mut handles = Vec::with_capacity(workers as usize);
    for worker in 0..workers {
        let engine = Arc::clone(&engine);
        let rates = true_rates.clone();
        let count = per_worker + u64::from(worker < remainder);
        let seed = params.seed.wrapping_add(worker);
        handles.push(tokio::spawn(async move {
            let mut rng = StdRng::seed_from_u64(seed);
            for n in 0..count {
                let user_id = format!("sim-{worker}-{n}");
                let Some(variant_id) = engine.assign_variant(&experiment_id, &user_id) else {
                    continue;
                };
                let rate = rates
                    .iter()
                    .find(|(id, _)| *id == variant_id)
                    .map(|(_, r)| *r)
                    .unwrap_or(0.0);
                let event = if rng.gen_bool(rate) {
                    ExposureEvent::conversion(1.0)
                } else {
                    ExposureEvent::impression()
                };
                engine.record_event(&experiment_id, &variant_id, event)?;
            }
            debug!(worker, visitors = count, "Worker finished");
            Ok::<_, campaign_core::CampaignError>(())
        }));
    }
    for handle in handles {
        handle.await.context("simulation worker panicked")??;
    }

    let result = engine.check_significance(&experiment_id)?;
    info!(
        is_significant = result.is_significant,
        confidence = result.confidence,
        winner = ?result.winner,
        "Simulation evaluated"
    );
    engine.complete(&experiment_id)?;

    Ok(SimulationReport {
        visitors: params.visitors,
        workers,
        true_rates,
        result,
    })
}
