use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Campaign, CampaignId, Candidate, CandidateId, Channel, OutreachAction};
use super::rules::RuleEngine;
use super::scoring::{estimated_conversion_rate, priority_score};

/// Per-candidate output of the rule engine and scoring module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub candidate_id: CandidateId,
    pub name: String,
    pub recommended_actions: Vec<OutreachAction>,
    pub priority: u8,
    pub estimated_conversion_rate: f64,
}

impl Recommendation {
    pub fn phase(&self) -> TimelinePhase {
        TimelinePhase::for_priority(self.priority)
    }
}

/// Campaign-wide plan handed to the execution layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub campaign_id: CampaignId,
    pub total_candidates: usize,
    pub recommendations: Vec<Recommendation>,
    pub channel_priority: Vec<Channel>,
    pub estimated_timeline: Timeline,
    pub effectiveness: Effectiveness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelinePhase {
    Immediate,
    ShortTerm,
    LongTerm,
}

impl TimelinePhase {
    pub fn for_priority(priority: u8) -> Self {
        if priority > 80 {
            TimelinePhase::Immediate
        } else if priority > 60 {
            TimelinePhase::ShortTerm
        } else {
            TimelinePhase::LongTerm
        }
    }

    pub fn duration_label(&self) -> &'static str {
        match self {
            TimelinePhase::Immediate => "1-2 hours",
            TimelinePhase::ShortTerm => "1-3 days",
            TimelinePhase::LongTerm => "1-2 weeks",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCounts {
    pub immediate: usize,
    pub short_term: usize,
    pub long_term: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub immediate: String,
    pub short_term: String,
    pub long_term: String,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            immediate: TimelinePhase::Immediate.duration_label().to_string(),
            short_term: TimelinePhase::ShortTerm.duration_label().to_string(),
            long_term: TimelinePhase::LongTerm.duration_label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub phases: PhaseCounts,
    pub estimated_duration: PhaseDurations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Efficiency {
    High,
    Medium,
    Low,
}

impl Efficiency {
    pub fn for_average(average: f64) -> Self {
        if average > 0.3 {
            Efficiency::High
        } else if average > 0.2 {
            Efficiency::Medium
        } else {
            Efficiency::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effectiveness {
    pub average_conversion_rate: f64,
    pub expected_conversions: u32,
    pub efficiency: Efficiency,
}

/// Runs the rule engine and scoring module over every candidate and aggregates the result.
///
/// Recommendations follow the order of `candidates`.
pub fn build_strategy(
    engine: &RuleEngine,
    campaign: &Campaign,
    candidates: &[Candidate],
    now: DateTime<Utc>,
) -> Strategy {
    let recommendations: Vec<Recommendation> = candidates
        .iter()
        .map(|candidate| recommend(engine, candidate, campaign, now))
        .collect();

    Strategy {
        campaign_id: campaign.id.clone(),
        total_candidates: candidates.len(),
        channel_priority: channel_priority(&recommendations),
        estimated_timeline: timeline(&recommendations),
        effectiveness: effectiveness(&recommendations),
        recommendations,
    }
}

pub fn recommend(
    engine: &RuleEngine,
    candidate: &Candidate,
    campaign: &Campaign,
    now: DateTime<Utc>,
) -> Recommendation {
    let recommended_actions = engine.evaluate_at(candidate, campaign, now);
    let estimated_conversion_rate = estimated_conversion_rate(&recommended_actions);

    Recommendation {
        candidate_id: candidate.id.clone(),
        name: candidate.name.clone(),
        priority: priority_score(candidate, campaign),
        estimated_conversion_rate,
        recommended_actions,
    }
}

/// Channels ranked by the summed priority of the recommendations that use them.
///
/// Matching is by substring on the action name, so `multi_channel_blast` feeds no bucket. Ties
/// keep email, voice, whatsapp order.
pub fn channel_priority(recommendations: &[Recommendation]) -> Vec<Channel> {
    let mut scores: Vec<(Channel, u64)> = Channel::ALL
        .iter()
        .map(|channel| {
            let total = recommendations
                .iter()
                .flat_map(|rec| {
                    rec.recommended_actions
                        .iter()
                        .filter(|action| channel.carries(**action))
                        .map(move |_| u64::from(rec.priority))
                })
                .sum();
            (*channel, total)
        })
        .collect();

    scores.sort_by(|a, b| b.1.cmp(&a.1));
    scores.into_iter().map(|(channel, _)| channel).collect()
}

pub fn timeline(recommendations: &[Recommendation]) -> Timeline {
    let mut phases = PhaseCounts::default();
    for rec in recommendations {
        match rec.phase() {
            TimelinePhase::Immediate => phases.immediate += 1,
            TimelinePhase::ShortTerm => phases.short_term += 1,
            TimelinePhase::LongTerm => phases.long_term += 1,
        }
    }

    Timeline {
        phases,
        estimated_duration: PhaseDurations::default(),
    }
}

/// An empty campaign reports a zero average and `Low` efficiency.
pub fn effectiveness(recommendations: &[Recommendation]) -> Effectiveness {
    let total: f64 = recommendations
        .iter()
        .map(|rec| rec.estimated_conversion_rate)
        .sum();
    let average = if recommendations.is_empty() {
        0.0
    } else {
        total / recommendations.len() as f64
    };

    Effectiveness {
        average_conversion_rate: average,
        expected_conversions: total.round() as u32,
        efficiency: Efficiency::for_average(average),
    }
}
