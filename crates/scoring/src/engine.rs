//! Lead scoring engine: fit, behavioral and account scores rolled up into
//! a grade and a routing stage.

use campaign_core::config::ScoringConfig;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::rules::{self, IndustryFit};
use crate::types::{Grade, Lead, LeadScore, LeadStage, ScoreCategory, ScoreComponent};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BehaviorTotals {
    engagement: f64,
    intent: f64,
    activities: usize,
    days_since_last: Option<i64>,
}

pub struct LeadScorer {
    config: ScoringConfig,
}

impl LeadScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, lead: &Lead, now: DateTime<Utc>) -> LeadScore {
        let mut components = self.fit_components(lead);
        components.extend(self.behavioral_components(lead, now));
        if self.config.include_account_score {
            components.push(self.account_component(lead));
        }

        let total: f64 = components.iter().map(|c| c.points).sum();
        let max_total: f64 = components.iter().map(|c| c.max_points).sum();
        let percentage = if max_total > 0.0 {
            total / max_total * 100.0
        } else {
            0.0
        };
        let intent = components
            .iter()
            .find(|c| c.category == ScoreCategory::Intent)
            .map(|c| c.points)
            .unwrap_or(0.0);
        let grade = Grade::from_percentage(percentage);
        let stage = LeadStage::recommend(percentage, intent > self.config.intent_threshold);

        metrics::counter!("scoring.leads_scored").increment(1);
        debug!(lead_id = %lead.id, total, percentage, ?grade, ?stage, "Lead scored");

        LeadScore {
            lead_id: lead.id.clone(),
            components,
            total,
            max_total,
            percentage,
            grade,
            stage,
            scored_at: now,
        }
    }

    /// Score every lead, highest total first.
    pub fn score_batch(&self, leads: &[Lead], now: DateTime<Utc>) -> Vec<LeadScore> {
        let mut scores: Vec<LeadScore> = leads.iter().map(|l| self.score(l, now)).collect();
        scores.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.lead_id.cmp(&b.lead_id))
        });
        scores
    }

    fn fit_components(&self, lead: &Lead) -> Vec<ScoreComponent> {
        let fit = rules::industry_fit(
            lead.industry.as_deref(),
            &self.config.target_industries,
            &self.config.adjacent_industries,
        );
        let industry_reason = match (fit, lead.industry.as_deref()) {
            (IndustryFit::Target, Some(name)) => format!("{name} is a target industry"),
            (IndustryFit::Adjacent, Some(name)) => {
                format!("{name} is adjacent to target industries")
            }
            (IndustryFit::Other, Some(name)) => format!("{name} is outside the ICP"),
            _ => "industry unknown".to_string(),
        };

        let size_reason = match lead.employee_count {
            Some(n) => format!("{n} employees"),
            None => "company size unknown".to_string(),
        };

        vec![
            ScoreComponent::new(
                ScoreCategory::Industry,
                rules::industry_points(fit),
                rules::INDUSTRY_MAX,
                industry_reason,
            ),
            ScoreComponent::new(
                ScoreCategory::CompanySize,
                rules::company_size_points(lead.employee_count),
                rules::COMPANY_SIZE_MAX,
                size_reason,
            ),
            ScoreComponent::new(
                ScoreCategory::Seniority,
                rules::seniority_points(lead.seniority),
                rules::SENIORITY_MAX,
                format!("seniority {:?}", lead.seniority),
            ),
        ]
    }

    fn behavioral_components(&self, lead: &Lead, now: DateTime<Utc>) -> Vec<ScoreComponent> {
        let totals = behavior_totals(lead, now);
        let recency_reason = match totals.days_since_last {
            Some(days) => format!("last active {days} days ago"),
            None => "no recorded activity".to_string(),
        };
        vec![
            ScoreComponent::new(
                ScoreCategory::Engagement,
                totals.engagement,
                rules::ENGAGEMENT_MAX,
                format!(
                    "{:.1} decayed engagement points over {} activities",
                    totals.engagement, totals.activities
                ),
            ),
            ScoreComponent::new(
                ScoreCategory::Intent,
                totals.intent,
                rules::INTENT_MAX,
                format!("{:.1} decayed intent points", totals.intent),
            ),
            ScoreComponent::new(
                ScoreCategory::Recency,
                rules::recency_points(totals.days_since_last),
                rules::RECENCY_MAX,
                recency_reason,
            ),
        ]
    }

    fn account_component(&self, lead: &Lead) -> ScoreComponent {
        let contacts = lead.account_engaged_contacts.unwrap_or(0);
        ScoreComponent::new(
            ScoreCategory::Account,
            rules::account_points(contacts),
            rules::ACCOUNT_MAX,
            format!("{contacts} engaged contacts at account"),
        )
    }
}

impl Default for LeadScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

fn behavior_totals(lead: &Lead, now: DateTime<Utc>) -> BehaviorTotals {
    let mut totals = BehaviorTotals::default();
    for activity in &lead.activities {
        // Future timestamps count as today.
        let age_days = (now - activity.occurred_at).num_days().max(0);
        let base = rules::activity_weight(activity.kind);
        let decayed = base * rules::decay_factor(age_days);

        if base >= rules::INTENT_WEIGHT_FLOOR {
            totals.intent += decayed;
        } else if base >= rules::ENGAGEMENT_WEIGHT_FLOOR {
            totals.engagement += decayed;
        } else {
            totals.engagement += decayed * rules::LIGHT_SIGNAL_FACTOR;
        }

        totals.activities += 1;
        totals.days_since_last = Some(match totals.days_since_last {
            Some(current) => current.min(age_days),
            None => age_days,
        });
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivityEvent, ActivityKind, Seniority};
    use chrono::Duration;

    fn activity(kind: ActivityKind, days_ago: i64, now: DateTime<Utc>) -> ActivityEvent {
        ActivityEvent {
            kind,
            occurred_at: now - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_behavior_bucketing_and_decay() {
        let now = Utc::now();
        let lead = Lead {
            id: "lead-1".to_string(),
            activities: vec![
                activity(ActivityKind::PricingPageView, 2, now),  // intent 15
                activity(ActivityKind::DemoRequest, 20, now),     // intent 25 * 0.7
                activity(ActivityKind::WebinarAttended, 10, now), // engagement 10 * 0.9
                activity(ActivityKind::EmailOpen, 45, now),       // engagement 2 * 0.5 * 0.5
            ],
            ..Default::default()
        };
        let totals = behavior_totals(&lead, now);
        assert!((totals.intent - 32.5).abs() < 1e-9);
        assert!((totals.engagement - 9.5).abs() < 1e-9);
        assert_eq!(totals.days_since_last, Some(2));
        assert_eq!(totals.activities, 4);
    }

    #[test]
    fn test_future_activity_counts_as_fresh() {
        let now = Utc::now();
        let lead = Lead {
            id: "lead-2".to_string(),
            activities: vec![activity(ActivityKind::EmailClick, -3, now)],
            ..Default::default()
        };
        let totals = behavior_totals(&lead, now);
        assert_eq!(totals.days_since_last, Some(0));
        assert!((totals.engagement - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_hot_lead_is_sales_ready() {
        let now = Utc::now();
        let lead = Lead {
            id: "hot".to_string(),
            industry: Some("SaaS".to_string()),
            employee_count: Some(800),
            seniority: Seniority::Vp,
            activities: vec![
                activity(ActivityKind::DemoRequest, 1, now),
                activity(ActivityKind::WebinarAttended, 3, now),
                activity(ActivityKind::ContentDownload, 4, now),
            ],
            account_engaged_contacts: Some(3),
            ..Default::default()
        };
        let score = LeadScorer::default().score(&lead, now);
        // 15 + 15 + 8 + 18 + 20 + 10 + 6
        assert!((score.total - 92.0).abs() < 1e-9);
        assert!((score.max_total - 100.0).abs() < 1e-9);
        assert_eq!(score.grade, Grade::A);
        assert_eq!(score.stage, LeadStage::SalesReady);
        assert_eq!(score.component(ScoreCategory::Intent).unwrap().points, 20.0);
    }

    #[test]
    fn test_cold_lead() {
        let now = Utc::now();
        let lead = Lead {
            id: "cold".to_string(),
            industry: Some("mining".to_string()),
            ..Default::default()
        };
        let score = LeadScorer::default().score(&lead, now);
        assert_eq!(score.total, 0.0);
        assert_eq!(score.grade, Grade::F);
        assert_eq!(score.stage, LeadStage::Cold);
        assert_eq!(score.components.len(), 7);
    }

    #[test]
    fn test_account_component_optional() {
        let now = Utc::now();
        let scorer = LeadScorer::new(ScoringConfig {
            include_account_score: false,
            ..ScoringConfig::default()
        });
        let score = scorer.score(&Lead { id: "x".to_string(), ..Default::default() }, now);
        assert!(score.component(ScoreCategory::Account).is_none());
        assert!((score.max_total - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_batch_sorted_by_total() {
        let now = Utc::now();
        let leads = vec![
            Lead { id: "low".to_string(), ..Default::default() },
            Lead {
                id: "high".to_string(),
                industry: Some("fintech".to_string()),
                seniority: Seniority::CLevel,
                ..Default::default()
            },
        ];
        let scores = LeadScorer::default().score_batch(&leads, now);
        assert_eq!(scores[0].lead_id, "high");
        assert_eq!(scores[1].lead_id, "low");
    }
}
