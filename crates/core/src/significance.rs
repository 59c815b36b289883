//! Statistical significance for A/B/n experiments.
//!
//! Compares the best-performing challenger against the control
//! (`variants[0]`) with a pooled two-proportion z-test. Evaluation is pure:
//! it reads a snapshot of variant counters and never mutates them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ExperimentationConfig;
use crate::error::{CampaignError, CampaignResult};
use crate::stats;
use crate::types::{Variant, VariantId};

/// Why an evaluation did or did not reach the z-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceOutcome {
    /// Fewer than two variants to compare.
    InsufficientVariants,
    /// Control has fewer samples than the configured minimum.
    BelowMinimumSample,
    /// Neither control nor best challenger has converted.
    NoConversions,
    /// Control or the best challenger has no samples.
    EmptyVariant,
    /// Pooled rate is 0 or 1, so the standard error vanishes.
    ZeroVariance,
    /// The z-test ran.
    Evaluated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub id: VariantId,
    pub name: String,
    pub is_control: bool,
    pub sample_size: u64,
    pub conversions: u64,
    pub conversion_rate: f64,
    /// Relative lift over control; `None` for the control itself or when the
    /// control rate is zero.
    pub lift_vs_control: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceResult {
    pub is_significant: bool,
    pub confidence: f64,
    pub winner: Option<VariantId>,
    pub outcome: SignificanceOutcome,
    pub z_score: Option<f64>,
    pub best_variant_id: Option<VariantId>,
    pub control_rate: f64,
    pub best_rate: f64,
    pub relative_lift: Option<f64>,
    pub variants: Vec<VariantSummary>,
}

impl SignificanceResult {
    fn not_significant(outcome: SignificanceOutcome, variants: Vec<VariantSummary>) -> Self {
        Self {
            is_significant: false,
            confidence: 0.0,
            winner: None,
            outcome,
            z_score: None,
            best_variant_id: None,
            control_rate: 0.0,
            best_rate: 0.0,
            relative_lift: None,
            variants,
        }
    }

    /// `(is_significant, confidence, winner)`.
    pub fn verdict(&self) -> (bool, f64, Option<&str>) {
        (self.is_significant, self.confidence, self.winner.as_deref())
    }
}

/// Two-proportion z-test evaluator with fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignificanceEngine {
    pub min_sample_size: u64,
    pub confidence_level: f64,
}

impl SignificanceEngine {
    pub fn new(min_sample_size: u64, confidence_level: f64) -> Self {
        Self {
            min_sample_size,
            confidence_level,
        }
    }

    pub fn from_config(config: &ExperimentationConfig) -> Self {
        Self::new(config.min_sample_size, config.confidence_level)
    }

    /// Validate inputs, then evaluate.
    ///
    /// Fails with `CampaignError::Validation` when the confidence level is
    /// outside (0, 1) or any variant reports more conversions than samples.
    pub fn try_evaluate(&self, variants: &[Variant]) -> CampaignResult<SignificanceResult> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(CampaignError::Validation(format!(
                "confidence level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if let Some(v) = variants.iter().find(|v| v.conversions > v.sample_size) {
            return Err(CampaignError::Validation(format!(
                "variant {} has {} conversions but only {} samples",
                v.id, v.conversions, v.sample_size
            )));
        }
        Ok(self.evaluate(variants))
    }

    /// Evaluate whether the best challenger beats control.
    ///
    /// Never panics. Insufficient data yields a not-significant result with
    /// confidence 0. Assumes `conversions <= sample_size` for every variant;
    /// use [`try_evaluate`](Self::try_evaluate) to check that first.
    pub fn evaluate(&self, variants: &[Variant]) -> SignificanceResult {
        let summaries = summarize(variants);

        let (control, challengers) = match variants.split_first() {
            Some((control, rest)) if !rest.is_empty() => (control, rest),
            _ => {
                return SignificanceResult::not_significant(
                    SignificanceOutcome::InsufficientVariants,
                    summaries,
                )
            }
        };

        if control.sample_size < self.min_sample_size {
            debug!(
                control_samples = control.sample_size,
                required = self.min_sample_size,
                "Control below minimum sample size"
            );
            return SignificanceResult::not_significant(
                SignificanceOutcome::BelowMinimumSample,
                summaries,
            );
        }

        let best = best_challenger(challengers);
        let p1 = control.conversion_rate();
        let p2 = best.conversion_rate();
        let relative_lift = (p1 > 0.0).then(|| (p2 - p1) / p1);

        let short_circuit = |outcome| SignificanceResult {
            best_variant_id: Some(best.id.clone()),
            control_rate: p1,
            best_rate: p2,
            relative_lift,
            ..SignificanceResult::not_significant(outcome, summaries.clone())
        };

        if control.conversions == 0 && best.conversions == 0 {
            return short_circuit(SignificanceOutcome::NoConversions);
        }
        if control.sample_size == 0 || best.sample_size == 0 {
            return short_circuit(SignificanceOutcome::EmptyVariant);
        }

        let z = match stats::two_proportion_z(
            control.conversions,
            control.sample_size,
            best.conversions,
            best.sample_size,
        ) {
            Some(z) => z,
            None => return short_circuit(SignificanceOutcome::ZeroVariance),
        };

        let confidence = stats::two_sided_confidence(z);
        let is_significant = confidence >= self.confidence_level;
        let winner = (is_significant && p2 > p1).then(|| best.id.clone());

        debug!(
            best_variant = %best.id,
            control_rate = p1,
            best_rate = p2,
            z_score = z,
            confidence,
            is_significant,
            "Significance evaluated"
        );

        SignificanceResult {
            is_significant,
            confidence,
            winner,
            outcome: SignificanceOutcome::Evaluated,
            z_score: Some(z),
            best_variant_id: Some(best.id.clone()),
            control_rate: p1,
            best_rate: p2,
            relative_lift,
            variants: summaries,
        }
    }
}

impl Default for SignificanceEngine {
    fn default() -> Self {
        Self::from_config(&ExperimentationConfig::default())
    }
}

/// Highest conversion rate wins; ties keep the earliest challenger.
fn best_challenger(challengers: &[Variant]) -> &Variant {
    let mut best = &challengers[0];
    for variant in &challengers[1..] {
        if variant.conversion_rate() > best.conversion_rate() {
            best = variant;
        }
    }
    best
}

fn summarize(variants: &[Variant]) -> Vec<VariantSummary> {
    let control_rate = variants.first().map(Variant::conversion_rate).unwrap_or(0.0);
    variants
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let rate = v.conversion_rate();
            VariantSummary {
                id: v.id.clone(),
                name: v.name.clone(),
                is_control: i == 0,
                sample_size: v.sample_size,
                conversions: v.conversions,
                conversion_rate: rate,
                lift_vs_control: (i > 0 && control_rate > 0.0)
                    .then(|| (rate - control_rate) / control_rate),
            }
        })
        .collect()
}
