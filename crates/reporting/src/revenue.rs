//! Revenue attribution: accumulates converted paths and rolls their
//! credit up into per-channel conversions and revenue.

use std::collections::HashMap;

use campaign_core::config::AttributionConfig;
use campaign_core::types::{AttributionModel, Touchpoint};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::attribution::attribute;

/// One customer's converted path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionPath {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub revenue: f64,
    pub touchpoints: Vec<Touchpoint>,
    pub converted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAttribution {
    pub channel: String,
    /// Sum of fractional credit across conversions.
    pub attributed_conversions: f64,
    pub attributed_revenue: f64,
    pub touchpoints: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelReport {
    pub model: AttributionModel,
    pub window_days: u32,
    pub conversions: u64,
    pub unattributed_conversions: u64,
    pub total_revenue: f64,
    pub channels: Vec<ChannelAttribution>,
    pub computed_at: DateTime<Utc>,
}

pub struct RevenueAttributionEngine {
    conversions: DashMap<String, Vec<ConversionPath>>,
    attribution_window_days: u32,
}

impl RevenueAttributionEngine {
    pub fn new(attribution_window_days: u32) -> Self {
        Self {
            conversions: DashMap::new(),
            attribution_window_days,
        }
    }

    pub fn from_config(config: &AttributionConfig) -> Self {
        Self::new(config.window_days)
    }

    pub fn record_conversion(&self, path: ConversionPath) {
        metrics::counter!("attribution.conversions_recorded").increment(1);
        self.conversions
            .entry(path.user_id.clone())
            .or_default()
            .push(path);
    }

    pub fn conversion_count(&self) -> usize {
        self.conversions.iter().map(|e| e.value().len()).sum()
    }

    /// Per-channel rollup for conversions inside the window ending at `now`.
    pub fn channel_report(&self, model: AttributionModel, now: DateTime<Utc>) -> ChannelReport {
        let cutoff = now - Duration::days(self.attribution_window_days as i64);
        let mut rows: HashMap<String, ChannelAttribution> = HashMap::new();
        let mut conversions = 0u64;
        let mut unattributed = 0u64;
        let mut total_revenue = 0.0;

        for entry in self.conversions.iter() {
            for conversion in entry.value() {
                if conversion.converted_at < cutoff || conversion.converted_at > now {
                    continue;
                }
                conversions += 1;
                total_revenue += conversion.revenue;

                if conversion.touchpoints.is_empty() {
                    unattributed += 1;
                    continue;
                }
                for tp in &conversion.touchpoints {
                    channel_row(&mut rows, &tp.channel).touchpoints += 1;
                }
                for (channel, credit) in attribute(&conversion.touchpoints, model) {
                    let row = channel_row(&mut rows, &channel);
                    row.attributed_conversions += credit;
                    row.attributed_revenue += credit * conversion.revenue;
                }
            }
        }

        let mut channels: Vec<ChannelAttribution> = rows.into_values().collect();
        channels.sort_by(|a, b| {
            b.attributed_revenue
                .total_cmp(&a.attributed_revenue)
                .then_with(|| a.channel.cmp(&b.channel))
        });

        debug!(
            model = %model,
            conversions,
            unattributed,
            channels = channels.len(),
            "Channel attribution computed"
        );

        ChannelReport {
            model,
            window_days: self.attribution_window_days,
            conversions,
            unattributed_conversions: unattributed,
            total_revenue,
            channels,
            computed_at: now,
        }
    }

    /// Channel reports under every model, for side-by-side comparison.
    pub fn compare_models(&self, now: DateTime<Utc>) -> Vec<ChannelReport> {
        AttributionModel::ALL
            .into_iter()
            .map(|model| self.channel_report(model, now))
            .collect()
    }
}

fn channel_row<'a>(
    rows: &'a mut HashMap<String, ChannelAttribution>,
    channel: &str,
) -> &'a mut ChannelAttribution {
    rows.entry(channel.to_string())
        .or_insert_with(|| ChannelAttribution {
            channel: channel.to_string(),
            attributed_conversions: 0.0,
            attributed_revenue: 0.0,
            touchpoints: 0,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversion(
        user: &str,
        revenue: f64,
        channels: &[&str],
        at: DateTime<Utc>,
    ) -> ConversionPath {
        ConversionPath {
            id: Uuid::new_v4(),
            user_id: user.to_string(),
            revenue,
            touchpoints: channels.iter().map(|c| Touchpoint::new(*c)).collect(),
            converted_at: at,
        }
    }

    fn row<'a>(report: &'a ChannelReport, channel: &str) -> &'a ChannelAttribution {
        report.channels.iter().find(|c| c.channel == channel).unwrap()
    }

    #[test]
    fn test_linear_revenue_rollup() {
        let now = Utc::now();
        let engine = RevenueAttributionEngine::new(30);
        engine.record_conversion(conversion("u1", 100.0, &["email", "search"], now));
        engine.record_conversion(conversion("u2", 50.0, &["search"], now - Duration::days(2)));

        let report = engine.channel_report(AttributionModel::Linear, now);
        assert_eq!(report.conversions, 2);
        assert!((report.total_revenue - 150.0).abs() < 1e-9);
        assert!((row(&report, "search").attributed_revenue - 100.0).abs() < 1e-9);
        assert!((row(&report, "search").attributed_conversions - 1.5).abs() < 1e-9);
        assert!((row(&report, "email").attributed_revenue - 50.0).abs() < 1e-9);
        assert_eq!(row(&report, "search").touchpoints, 2);
        assert_eq!(report.channels[0].channel, "search");
    }

    #[test]
    fn test_window_excludes_old_conversions() {
        let now = Utc::now();
        let engine = RevenueAttributionEngine::new(7);
        engine.record_conversion(conversion("u1", 10.0, &["email"], now - Duration::days(8)));
        engine.record_conversion(conversion("u1", 20.0, &["social"], now - Duration::days(1)));

        let report = engine.channel_report(AttributionModel::LastTouch, now);
        assert_eq!(engine.conversion_count(), 2);
        assert_eq!(report.conversions, 1);
        assert_eq!(report.channels.len(), 1);
        assert_eq!(report.channels[0].channel, "social");
    }

    #[test]
    fn test_window_from_config() {
        let engine = RevenueAttributionEngine::from_config(&AttributionConfig::default());
        let report = engine.channel_report(AttributionModel::Linear, Utc::now());
        assert_eq!(report.window_days, 30);
        assert_eq!(report.conversions, 0);
    }

    #[test]
    fn test_empty_paths_are_unattributed() {
        let now = Utc::now();
        let engine = RevenueAttributionEngine::new(30);
        engine.record_conversion(conversion("u1", 40.0, &[], now));
        let report = engine.channel_report(AttributionModel::FirstTouch, now);
        assert_eq!(report.conversions, 1);
        assert_eq!(report.unattributed_conversions, 1);
        assert!(report.channels.is_empty());
    }

    #[test]
    fn test_compare_models_conserves_revenue() {
        let now = Utc::now();
        let engine = RevenueAttributionEngine::new(30);
        let full_path = ["display", "email", "search", "direct"];
        engine.record_conversion(conversion("u1", 120.0, &full_path, now));
        engine.record_conversion(conversion("u2", 80.0, &["social", "email"], now));

        let reports = engine.compare_models(now);
        assert_eq!(reports.len(), 5);
        for report in &reports {
            let revenue: f64 = report.channels.iter().map(|c| c.attributed_revenue).sum();
            let credited: f64 = report.channels.iter().map(|c| c.attributed_conversions).sum();
            assert!((revenue - 200.0).abs() < 1e-9, "{}", report.model);
            assert!((credited - 2.0).abs() < 1e-9, "{}", report.model);
        }
    }
}
