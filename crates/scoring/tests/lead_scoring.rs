//! Lead scoring from JSON payloads as they arrive from the CRM export.

#[cfg(test)]
mod tests {
    use campaign_scoring::{Grade, Lead, LeadScorer, LeadStage, ScoreCategory};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_score_leads_from_json() {
        let payload = r#"[
            {
                "id": "lead-ops",
                "email": "ops@example.com",
                "industry": "retail",
                "employee_count": 120,
                "seniority": "director",
                "activities": [
                    {"kind": "webinar_attended", "occurred_at": "2026-10-01T10:00:00Z"},
                    {"kind": "pricing_page_view", "occurred_at": "2026-10-10T10:00:00Z"}
                ],
                "account_engaged_contacts": 2
            },
            {
                "id": "lead-unknown"
            }
        ]"#;
        let leads: Vec<Lead> = serde_json::from_str(payload).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 12, 10, 0, 0).unwrap();
        let scores = LeadScorer::default().score_batch(&leads, now);

        let ops = &scores[0];
        assert_eq!(ops.lead_id, "lead-ops");
        // industry 8, size 10, seniority 6, engagement 10 * 0.9, intent 15,
        // recency 10, account 3
        assert!((ops.total - 61.0).abs() < 1e-9, "total {}", ops.total);
        assert_eq!(ops.grade, Grade::B);
        assert_eq!(ops.stage, LeadStage::MarketingQualified);
        assert_eq!(ops.component(ScoreCategory::Recency).unwrap().points, 10.0);

        let unknown = &scores[1];
        assert_eq!(unknown.total, 0.0);
        assert_eq!(unknown.stage, LeadStage::Cold);
        assert!(unknown
            .components
            .iter()
            .all(|c| !c.reason.is_empty()));
    }

    #[test]
    fn test_score_serializes_snake_case() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let score = LeadScorer::default().score(
            &Lead {
                id: "l".to_string(),
                ..Default::default()
            },
            now,
        );
        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(json["stage"], "cold");
        assert_eq!(json["components"][1]["category"], "company_size");
    }
}
