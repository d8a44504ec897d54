use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use outreach_ai::error::AppError;
use outreach_ai::workflows::outreach::{
    AnalyticsEvent, AnalyticsSink, Campaign, CampaignId, CampaignStore, Candidate, CandidateId,
    DecisionEvent, GenerationError, SinkError, StoreError, TextGenerator,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// One campaign with its candidates and analytics history, as stored on disk.
#[derive(Debug, Deserialize)]
pub(crate) struct CampaignFixture {
    pub(crate) campaign: Campaign,
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    #[serde(default)]
    pub(crate) analytics: Vec<AnalyticsEvent>,
}

impl CampaignFixture {
    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCampaignStore {
    campaigns: Arc<Mutex<HashMap<CampaignId, Campaign>>>,
    candidates: Arc<Mutex<Vec<Candidate>>>,
    analytics: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl InMemoryCampaignStore {
    /// Candidates without a campaign reference are attached to the fixture's campaign.
    pub(crate) fn seed(&self, fixture: CampaignFixture) {
        let CampaignFixture {
            campaign,
            candidates,
            analytics,
        } = fixture;
        let campaign_id = campaign.id.clone();

        self.candidates
            .lock()
            .expect("store mutex poisoned")
            .extend(candidates.into_iter().map(|mut candidate| {
                if candidate.campaign_id.is_none() {
                    candidate.campaign_id = Some(campaign_id.clone());
                }
                candidate
            }));
        self.analytics
            .lock()
            .expect("store mutex poisoned")
            .extend(analytics);
        self.campaigns
            .lock()
            .expect("store mutex poisoned")
            .insert(campaign_id, campaign);
    }

    pub(crate) fn from_fixture(fixture: CampaignFixture) -> Self {
        let store = Self::default();
        store.seed(fixture);
        store
    }
}

impl CampaignStore for InMemoryCampaignStore {
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

/// Writes decision records to the log and keeps them for inspection.
#[derive(Default, Clone)]
pub(crate) struct TracingAnalyticsSink {
    events: Arc<Mutex<Vec<DecisionEvent>>>,
}

impl AnalyticsSink for TracingAnalyticsSink {
    fn record(&self, event: DecisionEvent) -> Result<(), SinkError> {
        info!(
            target: "decision_audit",
            campaign_id = %event.campaign_id,
            candidate_id = event.candidate_id.as_ref().map(|id| id.0.as_str()),
            action = ?event.action,
            "decision recorded"
        );
        let mut guard = self.events.lock().expect("sink mutex poisoned");
        guard.push(event);
        Ok(())
    }
}

impl TracingAnalyticsSink {
    pub(crate) fn events(&self) -> Vec<DecisionEvent> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }
}

/// Stand-in used when no hosted text generation backend is wired into the binary.
#[derive(Default, Clone, Copy)]
pub(crate) struct OfflineTextGenerator;

impl TextGenerator for OfflineTextGenerator {
    fn generate(
        &self,
        _prompt: &str,
        _context: &serde_json::Value,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
