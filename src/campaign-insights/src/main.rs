//! Campaign Insights: A/B significance, multi-touch attribution and lead
//! scoring over JSON exports.
//!
//! Results are written to stdout as JSON; logs go to stderr.

mod commands;
mod simulate;

use std::path::PathBuf;

use campaign_core::config::AppConfig;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "campaign-insights")]
#[command(about = "Experiment significance, attribution and lead scoring for campaign data")]
#[command(version)]
struct Cli {
    /// Optional TOML config file
    #[arg(long, global = true, env = "CAMPAIGN_INSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate significance for a set of variant counters (variants[0] is control)
    Significance {
        /// JSON file, or `-` for stdin
        input: PathBuf,

        /// Minimum control samples (overrides config)
        #[arg(long)]
        min_sample_size: Option<u64>,

        /// Confidence threshold in (0, 1) (overrides config)
        #[arg(long)]
        confidence_level: Option<f64>,
    },

    /// Attribute one conversion path across channels
    Attribute {
        /// JSON array of touchpoints in ascending time order, or `-` for stdin
        input: PathBuf,

        /// first_touch, last_touch, linear, time_decay, position_based
        #[arg(short, long)]
        model: Option<String>,

        /// Report credits under every model
        #[arg(long, conflicts_with = "model")]
        all_models: bool,
    },

    /// Roll conversion paths up into per-channel revenue
    Revenue {
        /// JSON array of conversion paths, or `-` for stdin
        input: PathBuf,

        #[arg(short, long)]
        model: Option<String>,

        /// Report under every model
        #[arg(long, conflicts_with = "model")]
        all_models: bool,

        /// Attribution window in days (overrides config)
        #[arg(long)]
        window_days: Option<u32>,

        /// End of the attribution window, RFC 3339 (default: now)
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
    },

    /// Score leads and recommend a funnel stage
    Score {
        /// JSON array of leads, or `-` for stdin
        input: PathBuf,

        /// Scoring reference time, RFC 3339 (default: now)
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,

        /// Leave out the account-level component
        #[arg(long)]
        no_account: bool,
    },

    /// Simulate concurrent traffic into an experiment and evaluate it
    Simulate {
        /// Control conversion rate
        #[arg(long, default_value_t = 0.05)]
        control_rate: f64,

        /// Challenger conversion rate (repeatable)
        #[arg(long = "variant-rate", default_values_t = vec![0.06])]
        variant_rates: Vec<f64>,

        /// Total visitors across all workers
        #[arg(long, default_value_t = 20_000)]
        visitors: u64,

        /// Concurrent recording tasks
        #[arg(long, default_value_t = 8)]
        workers: u64,

        /// RNG seed for reproducible runs
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campaign_insights=info,campaign_core=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    info!(
        min_sample_size = config.experimentation.min_sample_size,
        confidence_level = config.experimentation.confidence_level,
        default_model = %config.attribution.default_model,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Significance {
            input,
            min_sample_size,
            confidence_level,
        } => commands::cmd_significance(&config, &input, min_sample_size, confidence_level),
        Commands::Attribute {
            input,
            model,
            all_models,
        } => commands::cmd_attribute(&config, &input, model.as_deref(), all_models),
        Commands::Revenue {
            input,
            model,
            all_models,
            window_days,
            as_of,
        } => commands::cmd_revenue(
            &config,
            &input,
            model.as_deref(),
            all_models,
            window_days,
            as_of.unwrap_or_else(Utc::now),
        ),
        Commands::Score {
            input,
            as_of,
            no_account,
        } => commands::cmd_score(&config, &input, as_of.unwrap_or_else(Utc::now), no_account),
        Commands::Simulate {
            control_rate,
            variant_rates,
            visitors,
            workers,
            seed,
        } => {
            let params = simulate::SimulationParams {
                control_rate,
                variant_rates,
                visitors,
                workers,
                seed,
            };
            let result = simulate::run(&config, params).await?;
            commands::print_json(&result)
        }
    }
}
