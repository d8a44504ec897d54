use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::outreach::domain::{
    AnalyticsEvent, AnalyticsEventKind, Campaign, CampaignId, Candidate, CandidateId,
    CandidateStatus, PriorityTag,
};
use crate::workflows::outreach::repository::{
    AnalyticsSink, CampaignStore, DecisionEvent, GenerationError, SinkError, StoreError,
    TextGenerator,
};
use crate::workflows::outreach::rules::default_rules;
use crate::workflows::outreach::service::DecisionService;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub(super) fn campaign() -> Campaign {
    Campaign {
        id: CampaignId("camp-fall".to_string()),
        name: "Fall intake".to_string(),
        target_course: Some("Computer Science".to_string()),
        target_city: Some("Pune".to_string()),
        campaign_type: Some("enrollment".to_string()),
    }
}

/// Fresh lead with an email address and nothing sent yet.
pub(super) fn email_lead(id: &str) -> Candidate {
    let mut candidate = Candidate::new(id, format!("Lead {id}"));
    candidate.email = Some(format!("{id}@example.com"));
    candidate.campaign_id = Some(campaign().id);
    candidate.status = Some(CandidateStatus::Pending);
    candidate
}

/// High-priority lead without contact details.
pub(super) fn high_priority_lead(id: &str) -> Candidate {
    let mut candidate = Candidate::new(id, format!("Priority {id}"));
    candidate.campaign_id = Some(campaign().id);
    candidate.priority = PriorityTag::High;
    candidate
}

pub(super) fn unopened_email(id: &str, sent_days_ago: i64) -> Candidate {
    let mut candidate = email_lead(id);
    candidate.email_sent = true;
    candidate.email_sent_at = Some(days_ago(sent_days_ago));
    candidate.status = Some(CandidateStatus::EmailSent);
    candidate
}

pub(super) fn conversion_event(candidate: &str, days: i64) -> AnalyticsEvent {
    AnalyticsEvent {
        campaign_id: campaign().id,
        candidate_id: Some(CandidateId(candidate.to_string())),
        event_type: AnalyticsEventKind::Conversion,
        channel: Some("email".to_string()),
        timestamp: days_ago(days),
    }
}

pub(super) fn engagement_event(candidate: &str, days: i64) -> AnalyticsEvent {
    AnalyticsEvent {
        event_type: AnalyticsEventKind::Engagement,
        ..conversion_event(candidate, days)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) campaigns: Arc<Mutex<HashMap<CampaignId, Campaign>>>,
    pub(super) candidates: Arc<Mutex<Vec<Candidate>>>,
    pub(super) analytics: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl MemoryStore {
    pub(super) fn with(campaign: Campaign, candidates: Vec<Candidate>) -> Self {
        let store = Self::default();
        store
            .campaigns
            .lock()
            .expect("store mutex poisoned")
            .insert(campaign.id.clone(), campaign);
        *store.candidates.lock().expect("store mutex poisoned") = candidates;
        store
    }

    pub(super) fn add_events(&self, events: Vec<AnalyticsEvent>) {
        self.analytics
            .lock()
            .expect("store mutex poisoned")
            .extend(events);
    }
}

impl CampaignStore for MemoryStore {
    fn fetch_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, StoreError> {
        let guard = self.campaigns.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn fetch_candidates(&self, campaign_id: &CampaignId) -> Result<Vec<Candidate>, StoreError> {
        let guard = self.candidates.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|candidate| candidate.campaign_id.as_ref() == Some(campaign_id))
            .cloned()
            .collect())
    }

    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<Candidate>, StoreError> {
        let guard = self.candidates.lock().expect("store mutex poisoned");
        Ok(guard.iter().find(|candidate| &candidate.id == id).cloned())
    }

    fn fetch_analytics(&self, campaign_id: &CampaignId) -> Result<Vec<AnalyticsEvent>, StoreError> {
        let guard = self.analytics.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|event| &event.campaign_id == campaign_id)
            .cloned()
            .collect())
    }
}

/// Knows the campaign but fails when asked for its candidates.
pub(super) struct CandidatesOfflineStore;

impl CampaignStore for CandidatesOfflineStore {
    fn fetch_campaign(&self, _id: &CampaignId) -> Result<Option<Campaign>, StoreError> {
        Ok(Some(campaign()))
    }

    fn fetch_candidates(&self, _campaign_id: &CampaignId) -> Result<Vec<Candidate>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch_candidate(&self, _id: &CandidateId) -> Result<Option<Candidate>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch_analytics(&self, _campaign_id: &CampaignId) -> Result<Vec<AnalyticsEvent>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySink {
    events: Arc<Mutex<Vec<DecisionEvent>>>,
}

impl MemorySink {
    pub(super) fn events(&self) -> Vec<DecisionEvent> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }
}

impl AnalyticsSink for MemorySink {
    fn record(&self, event: DecisionEvent) -> Result<(), SinkError> {
        self.events.lock().expect("sink mutex poisoned").push(event);
        Ok(())
    }
}

pub(super) struct BrokenSink;

impl AnalyticsSink for BrokenSink {
    fn record(&self, _event: DecisionEvent) -> Result<(), SinkError> {
        Err(SinkError::Transport("connection refused".to_string()))
    }
}

/// Replies with a fixed text and remembers every prompt.
#[derive(Default, Clone)]
pub(super) struct ScriptedGenerator {
    reply: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    pub(super) fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Arc::default(),
        }
    }

    pub(super) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("generator mutex poisoned").clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str, _context: &Value) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .expect("generator mutex poisoned")
            .push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

pub(super) struct OfflineGenerator;

impl TextGenerator for OfflineGenerator {
    fn generate(&self, _prompt: &str, _context: &Value) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

pub(super) type TestService = DecisionService<MemoryStore, MemorySink, OfflineGenerator>;

pub(super) fn build_service(candidates: Vec<Candidate>) -> (TestService, MemoryStore, MemorySink) {
    let store = MemoryStore::with(campaign(), candidates);
    let sink = MemorySink::default();
    let service = DecisionService::new(
        Arc::new(store.clone()),
        Arc::new(sink.clone()),
        Arc::new(OfflineGenerator),
        default_rules(),
    );
    (service, store, sink)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn approx(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}
