use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AnalyticsEvent, Campaign, CampaignId, Candidate, CandidateId};

/// Read-only access to campaign records held by the hosted store.
pub trait CampaignStore: Send + Sync {
    fn fetch_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, StoreError>;
    fn fetch_candidates(&self, campaign_id: &CampaignId) -> Result<Vec<Candidate>, StoreError>;
    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<Candidate>, StoreError>;
    fn fetch_analytics(&self, campaign_id: &CampaignId)
        -> Result<Vec<AnalyticsEvent>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Fire-and-forget destination for decision audit records.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: DecisionEvent) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("analytics sink unavailable: {0}")]
    Transport(String),
}

/// Which top-level call produced a decision record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    EvaluateCandidate,
    GenerateStrategy,
}

/// Audit record written once per decision call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub campaign_id: CampaignId,
    pub candidate_id: Option<CandidateId>,
    pub event_type: String,
    pub channel: String,
    pub status: String,
    pub action: DecisionKind,
    pub result: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl DecisionEvent {
    pub fn decision_made(
        campaign_id: CampaignId,
        candidate_id: Option<CandidateId>,
        action: DecisionKind,
        result: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            campaign_id,
            candidate_id,
            event_type: "decision_made".to_string(),
            channel: "decision_engine".to_string(),
            status: "success".to_string(),
            action,
            result,
            timestamp,
        }
    }
}

/// Opaque text generation used for narration and message bodies.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, context: &serde_json::Value)
        -> Result<String, GenerationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("text generation not configured")]
    NotConfigured,
    #[error("text generation failed: {0}")]
    Backend(String),
}
