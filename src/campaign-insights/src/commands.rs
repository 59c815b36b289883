use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;
use campaign_core::config::AppConfig;
use campaign_core::{AttributionModel, SignificanceEngine, Touchpoint, Variant};
use campaign_reporting::{attribute, ConversionPath, RevenueAttributionEngine};
use campaign_scoring::{Lead, LeadScorer};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
struct SignificanceInput {
    variants: Vec<Variant>,
    #[serde(default)]
    min_sample_size: Option<u64>,
    #[serde(default)]
    confidence_level: Option<f64>,
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let mut raw = String::new();
    if path.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read stdin")?;
    } else {
        raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
    }
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)?;
    writeln!(handle)?;
    Ok(())
}

fn resolve_model(config: &AppConfig, requested: Option<&str>) -> anyhow::Result<AttributionModel> {
    let name = requested.unwrap_or(config.attribution.default_model.as_str());
    Ok(name.parse::<AttributionModel>()?)
}

pub fn cmd_significance(
    config: &AppConfig,
    input: &Path,
    min_sample_size: Option<u64>,
    confidence_level: Option<f64>,
) -> anyhow::Result<()> {
    let request: SignificanceInput = read_json(input)?;
    let engine = SignificanceEngine::new(
        min_sample_size
            .or(request.min_sample_size)
            .unwrap_or(config.experimentation.min_sample_size),
        confidence_level
            .or(request.confidence_level)
            .unwrap_or(config.experimentation.confidence_level),
    );
    let result = engine.try_evaluate(&request.variants)?;
    info!(
        variants = request.variants.len(),
        is_significant = result.is_significant,
        confidence = result.confidence,
        winner = ?result.winner,
        "Significance evaluated"
    );
    print_json(&result)
}

pub fn cmd_attribute(
    config: &AppConfig,
    input: &Path,
    model: Option<&str>,
    all_models: bool,
) -> anyhow::Result<()> {
    let touchpoints: Vec<Touchpoint> = read_json(input)?;
    if all_models {
        let by_model: BTreeMap<AttributionModel, _> = AttributionModel::ALL
            .into_iter()
            .map(|m| (m, attribute(&touchpoints, m)))
            .collect();
        return print_json(&by_model);
    }
    let model = resolve_model(config, model)?;
    let credits = attribute(&touchpoints, model);
    info!(
        model = %model,
        touchpoints = touchpoints.len(),
        channels = credits.len(),
        "Path attributed"
    );
    print_json(&credits)
}

pub fn cmd_revenue(
    config: &AppConfig,
    input: &Path,
    model: Option<&str>,
    all_models: bool,
    window_days: Option<u32>,
    as_of: DateTime<Utc>,
) -> anyhow::Result<()> {
    let paths: Vec<ConversionPath> = read_json(input)?;
    let engine =
        RevenueAttributionEngine::new(window_days.unwrap_or(config.attribution.window_days));
    for path in paths {
        engine.record_conversion(path);
    }
    info!(conversions = engine.conversion_count(), "Conversions loaded");

    if all_models {
        return print_json(&engine.compare_models(as_of));
    }
    let model = resolve_model(config, model)?;
    print_json(&engine.channel_report(model, as_of))
}

pub fn cmd_score(
    config: &AppConfig,
    input: &Path,
    as_of: DateTime<Utc>,
    no_account: bool,
) -> anyhow::Result<()> {
    let leads: Vec<Lead> = read_json(input)?;
    let mut scoring = config.scoring.clone();
    if no_account {
        scoring.include_account_score = false;
    }
    let scores = LeadScorer::new(scoring).score_batch(&leads, as_of);
    info!(leads = scores.len(), "Leads scored");
    print_json(&scores)
}
