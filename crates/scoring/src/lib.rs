//! Lead scoring: ICP fit, decayed behavioral signals and account
//! engagement, graded and mapped to a funnel stage.

pub mod engine;
pub mod rules;
pub mod types;

pub use engine::LeadScorer;
pub use types::{
    ActivityEvent, ActivityKind, Grade, Lead, LeadScore, LeadStage, ScoreCategory, ScoreComponent,
    Seniority,
};
