use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::domain::{
    AnalyticsEvent, CampaignId, CampaignType, Candidate, CandidateId, OutreachAction,
    ValidationError,
};
use super::insights::{narrate, Narrative};
use super::performance::{measure, PerformanceReport, Timeframe};
use super::planner::{
    draft_messages, plan_communication, CampaignGoals, CommunicationPlan, MessageDraft,
};
use super::prediction::{predict_conversion, ConversionForecast, ProspectProfile};
use super::repository::{
    AnalyticsSink, CampaignStore, DecisionEvent, DecisionKind, StoreError, TextGenerator,
};
use super::rules::{Rule, RuleEngine};
use super::segmentation::{
    high_performing, segment_population, status_distribution, targeting_recommendation, Segment,
    TargetingRecommendation,
};
use super::strategy::{build_strategy, Strategy};

/// Facade composing the store, rule engine, scoring, and enrichment collaborators.
pub struct DecisionService<S, K, G> {
    store: Arc<S>,
    sink: Arc<K>,
    generator: Arc<G>,
    engine: Arc<RuleEngine>,
}

/// Segment analysis plus the recommended targeting split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetingReport {
    pub campaign_id: CampaignId,
    pub current_segments: BTreeMap<String, usize>,
    pub high_performing: Vec<Segment>,
    pub recommendation: TargetingRecommendation,
    pub narrative: Narrative,
}

/// Communication plan with the drafted message bodies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunicationPlanView {
    pub plan: CommunicationPlan,
    pub drafts: Vec<MessageDraft>,
}

impl<S, K, G> DecisionService<S, K, G>
where
    S: CampaignStore + 'static,
    K: AnalyticsSink + 'static,
    G: TextGenerator + 'static,
{
    pub fn new(store: Arc<S>, sink: Arc<K>, generator: Arc<G>, rules: Vec<Rule>) -> Self {
        Self {
            store,
            sink,
            generator,
            engine: Arc::new(RuleEngine::new(rules)),
        }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn evaluate_candidate(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
    ) -> Result<Vec<OutreachAction>, DecisionServiceError> {
        self.evaluate_candidate_at(campaign_id, candidate_id, Utc::now())
    }

    /// Recommended actions for one stored candidate, in rule-priority order.
    pub fn evaluate_candidate_at(
        &self,
        campaign_id: &CampaignId,
        candidate_id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutreachAction>, DecisionServiceError> {
        let candidate = self
            .store
            .fetch_candidate(candidate_id)?
            .ok_or_else(|| DecisionServiceError::CandidateNotFound(candidate_id.clone()))?;
        let campaign = self
            .store
            .fetch_campaign(campaign_id)?
            .ok_or_else(|| DecisionServiceError::CampaignNotFound(campaign_id.clone()))?;

        let actions = self.engine.evaluate_at(&candidate, &campaign, now);
        info!(
            %campaign_id,
            %candidate_id,
            actions = actions.len(),
            "candidate evaluated"
        );

        self.audit(DecisionEvent::decision_made(
            campaign_id.clone(),
            Some(candidate_id.clone()),
            DecisionKind::EvaluateCandidate,
            json!({
                "candidate_id": candidate_id,
                "recommended_actions": actions,
            }),
            now,
        ));

        Ok(actions)
    }

    pub fn generate_strategy(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Strategy, DecisionServiceError> {
        self.generate_strategy_at(campaign_id, Utc::now())
    }

    /// Either a complete strategy or an error; there is no partial result.
    pub fn generate_strategy_at(
        &self,
        campaign_id: &CampaignId,
        now: DateTime<Utc>,
    ) -> Result<Strategy, DecisionServiceError> {
        let campaign = self
            .store
            .fetch_campaign(campaign_id)?
            .ok_or_else(|| DecisionServiceError::CampaignNotFound(campaign_id.clone()))?;
        let candidates = self.store.fetch_candidates(campaign_id)?;

        let strategy = build_strategy(&self.engine, &campaign, &candidates, now);
        info!(
            %campaign_id,
            candidates = strategy.total_candidates,
            average_conversion_rate = strategy.effectiveness.average_conversion_rate,
            "strategy generated"
        );

        self.audit(DecisionEvent::decision_made(
            campaign_id.clone(),
            None,
            DecisionKind::GenerateStrategy,
            serde_json::to_value(&strategy).unwrap_or_default(),
            now,
        ));

        Ok(strategy)
    }

    /// High-performing segments for a stored campaign.
    pub fn identify_segments(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Vec<Segment>, DecisionServiceError> {
        let (candidates, analytics) = self.load_history(campaign_id)?;
        let population = segment_population(&candidates, &analytics);
        Ok(high_performing(&population))
    }

    pub fn optimize_targeting(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<TargetingReport, DecisionServiceError> {
        let (candidates, analytics) = self.load_history(campaign_id)?;
        let population = segment_population(&candidates, &analytics);
        let high_performing = high_performing(&population);
        let recommendation = targeting_recommendation(&high_performing, &population);
        let current_segments = status_distribution(&candidates);

        let prompt = format!(
            "Recommend targeting refinements for a campaign of {} candidates with {} tracked events. \
             Cover audience segmentation, priority groups, and expected impact.",
            candidates.len(),
            analytics.len()
        );
        let narrative = narrate(
            self.generator.as_ref(),
            &prompt,
            &json!({
                "current_segments": current_segments,
                "high_performing": high_performing,
            }),
        );

        info!(
            %campaign_id,
            segments = population.len(),
            high_performing = high_performing.len(),
            "targeting analysed"
        );

        Ok(TargetingReport {
            campaign_id: campaign_id.clone(),
            current_segments,
            high_performing,
            recommendation,
            narrative,
        })
    }

    pub fn analyze_performance(
        &self,
        campaign_id: &CampaignId,
        timeframe: Option<&str>,
    ) -> Result<PerformanceReport, DecisionServiceError> {
        self.analyze_performance_at(campaign_id, timeframe, Utc::now())
    }

    pub fn analyze_performance_at(
        &self,
        campaign_id: &CampaignId,
        timeframe: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PerformanceReport, DecisionServiceError> {
        let timeframe = match timeframe {
            Some(raw) => Timeframe::parse(raw)?,
            None => Timeframe::default(),
        };
        let campaign = self
            .store
            .fetch_campaign(campaign_id)?
            .ok_or_else(|| DecisionServiceError::CampaignNotFound(campaign_id.clone()))?;
        let candidates = self.store.fetch_candidates(campaign_id)?;
        let analytics = self.store.fetch_analytics(campaign_id)?;

        let metrics = measure(candidates.len(), &analytics, timeframe, now);
        let prompt = format!(
            "Analyse campaign '{}' ({}): {} candidates, {} engaged, {} conversions over {}. \
             Provide actionable insights and recommendations.",
            campaign.name,
            campaign.campaign_type.as_deref().unwrap_or("n/a"),
            metrics.total_candidates,
            metrics.engaged,
            metrics.conversions,
            timeframe.label()
        );
        let narrative = narrate(self.generator.as_ref(), &prompt, &json!({ "metrics": metrics }));

        Ok(PerformanceReport {
            campaign_id: campaign_id.clone(),
            timeframe: timeframe.label(),
            metrics,
            narrative,
        })
    }

    /// Scores ad-hoc prospects; invalid input is rejected before any scoring.
    pub fn predict_conversion(
        &self,
        prospects: &[ProspectProfile],
        campaign_type: &str,
    ) -> Result<ConversionForecast, DecisionServiceError> {
        let predictions = predict_conversion(prospects, campaign_type)?;
        let campaign_type = CampaignType::parse(campaign_type)?;

        let prompt = format!(
            "Predict conversion outcomes for a {} campaign with {} candidates. Name the key \
             factors and the expected timeline.",
            campaign_type.label(),
            predictions.len()
        );
        let sample: Vec<_> = predictions.iter().take(5).collect();
        let narrative = narrate(self.generator.as_ref(), &prompt, &json!({ "sample": sample }));

        Ok(ConversionForecast::new(campaign_type, predictions, narrative))
    }

    pub fn plan_communication(
        &self,
        candidate: &Candidate,
        goals: &CampaignGoals,
    ) -> CommunicationPlanView {
        let plan = plan_communication(candidate, goals);
        let drafts = draft_messages(&plan, candidate, goals, self.generator.as_ref());
        CommunicationPlanView { plan, drafts }
    }

    fn load_history(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<(Vec<Candidate>, Vec<AnalyticsEvent>), DecisionServiceError> {
        if self.store.fetch_campaign(campaign_id)?.is_none() {
            return Err(DecisionServiceError::CampaignNotFound(campaign_id.clone()));
        }
        let candidates = self.store.fetch_candidates(campaign_id)?;
        let analytics = self.store.fetch_analytics(campaign_id)?;
        Ok((candidates, analytics))
    }

    fn audit(&self, event: DecisionEvent) {
        if let Err(error) = self.sink.record(event) {
            warn!(%error, "failed to record decision event");
        }
    }
}

/// Error raised by the decision service.
#[derive(Debug, thiserror::Error)]
pub enum DecisionServiceError {
    #[error("campaign {0} not found")]
    CampaignNotFound(CampaignId),
    #[error("candidate {0} not found")]
    CandidateNotFound(CandidateId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
