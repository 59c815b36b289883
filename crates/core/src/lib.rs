//! Core types and statistical engines for campaign experimentation.

pub mod config;
pub mod error;
pub mod experimentation;
pub mod significance;
pub mod stats;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
pub use experimentation::{ExperimentEngine, ExposureEvent, NewExperiment};
pub use significance::{SignificanceEngine, SignificanceOutcome, SignificanceResult};
pub use types::{AttributionModel, Experiment, ExperimentStatus, Touchpoint, Variant, VariantId};
