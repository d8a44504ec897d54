//! Campaign decisioning: rule evaluation, scoring, strategy aggregation, segmentation,
//! conversion prediction, and communication planning.
//!
//! Everything here is a pure function of its inputs except [`service::DecisionService`], which
//! fetches from the store once per call and emits audit records.

pub mod domain;
pub mod insights;
pub mod performance;
pub mod planner;
pub mod prediction;
pub mod repository;
pub mod router;
pub mod rules;
pub mod scoring;
pub mod segmentation;
pub mod service;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use domain::{
    AnalyticsEvent, AnalyticsEventKind, Campaign, CampaignId, CampaignType, Candidate,
    CandidateId, CandidateStatus, Channel, OutreachAction, PriorityTag, ValidationError,
};
pub use insights::{Narrative, NarrativeSource};
pub use performance::{PerformanceMetrics, PerformanceReport, Timeframe};
pub use planner::{
    plan_communication, CampaignGoals, CommunicationPlan, ContactWindow, FollowUpStep,
    MessageDraft,
};
pub use prediction::{predict_conversion, ConversionForecast, ConversionPrediction, ProspectProfile};
pub use repository::{
    AnalyticsSink, CampaignStore, DecisionEvent, DecisionKind, GenerationError, SinkError,
    StoreError, TextGenerator,
};
pub use router::decision_router;
pub use rules::{default_rules, Comparison, Condition, Predicate, Rule, RuleEngine};
pub use scoring::{estimated_conversion_rate, priority_score};
pub use segmentation::{
    identify_segments, segment_population, targeting_recommendation, Segment, SegmentAttribute,
    TargetingRecommendation,
};
pub use service::{
    CommunicationPlanView, DecisionService, DecisionServiceError, TargetingReport,
};
pub use strategy::{
    build_strategy, Effectiveness, Efficiency, Recommendation, Strategy, Timeline, TimelinePhase,
};
