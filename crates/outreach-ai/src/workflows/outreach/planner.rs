use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::domain::{Candidate, CandidateId, Channel, OutreachAction};
use super::insights::NarrativeSource;
use super::repository::TextGenerator;

const PREFERRED_DAYS: [&str; 3] = ["Tuesday", "Wednesday", "Thursday"];
const WORKING_HOURS: &str = "18:00-20:00";
const DEFAULT_HOURS: &str = "10:00-12:00";

/// Fixed follow-up cadence as (day offset, channel, action).
const CADENCE: [(u32, Channel, OutreachAction); 4] = [
    (0, Channel::Email, OutreachAction::SendEmail),
    (2, Channel::Voice, OutreachAction::MakeVoiceCall),
    (5, Channel::Whatsapp, OutreachAction::SendWhatsapp),
    (10, Channel::Email, OutreachAction::SendEmail),
];

/// What the campaign is trying to achieve with this candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignGoals {
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub call_to_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactWindow {
    pub preferred_days: Vec<String>,
    pub preferred_hours: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpStep {
    pub day: u32,
    pub channel: Channel,
    pub action: OutreachAction,
}

/// Channel set, timing, and cadence for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationPlan {
    pub candidate_id: CandidateId,
    pub objective: String,
    pub channel_strategy: Vec<Channel>,
    pub contact_window: ContactWindow,
    pub follow_up: Vec<FollowUpStep>,
}

pub fn plan_communication(candidate: &Candidate, goals: &CampaignGoals) -> CommunicationPlan {
    let mut channel_strategy = Vec::new();
    if candidate.has_email() {
        channel_strategy.push(Channel::Email);
    }
    if candidate.has_phone() {
        channel_strategy.push(Channel::Voice);
        channel_strategy.push(Channel::Whatsapp);
    }

    CommunicationPlan {
        candidate_id: candidate.id.clone(),
        objective: goals.objective.clone(),
        channel_strategy,
        contact_window: contact_window(candidate),
        follow_up: CADENCE
            .iter()
            .map(|(day, channel, action)| FollowUpStep {
                day: *day,
                channel: *channel,
                action: *action,
            })
            .collect(),
    }
}

fn contact_window(candidate: &Candidate) -> ContactWindow {
    let working = candidate
        .course()
        .is_some_and(|course| course.to_ascii_lowercase().contains("working"));

    ContactWindow {
        preferred_days: PREFERRED_DAYS.iter().map(|day| day.to_string()).collect(),
        preferred_hours: if working { WORKING_HOURS } else { DEFAULT_HOURS }.to_string(),
    }
}

/// Body text for one follow-up step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub day: u32,
    pub channel: Channel,
    pub body: String,
    pub source: NarrativeSource,
}

/// Requests a body for every step; a failed request falls back to a fixed template.
pub fn draft_messages(
    plan: &CommunicationPlan,
    candidate: &Candidate,
    goals: &CampaignGoals,
    generator: &dyn TextGenerator,
) -> Vec<MessageDraft> {
    plan.follow_up
        .iter()
        .map(|step| {
            let prompt = format!(
                "Write a short {} message for day {} of an admissions follow-up. Objective: {}",
                step.channel.label(),
                step.day,
                goals.objective
            );
            let context = json!({
                "candidate": {
                    "name": candidate.name,
                    "course": candidate.course(),
                    "city": candidate.city(),
                },
                "call_to_action": goals.call_to_action,
            });

            match generator.generate(&prompt, &context) {
                Ok(body) if !body.trim().is_empty() => MessageDraft {
                    day: step.day,
                    channel: step.channel,
                    body: body.trim().to_string(),
                    source: NarrativeSource::Generated,
                },
                Ok(_) => fallback_draft(step, candidate),
                Err(error) => {
                    warn!(
                        candidate_id = %candidate.id,
                        day = step.day,
                        %error,
                        "message generation failed; using template"
                    );
                    fallback_draft(step, candidate)
                }
            }
        })
        .collect()
}

fn fallback_draft(step: &FollowUpStep, candidate: &Candidate) -> MessageDraft {
    let course = candidate.course().unwrap_or("our programmes");
    let body = match step.channel {
        Channel::Email => format!(
            "Hi {}, thanks for your interest in {course}. Reply to this email and our admissions \
             team will walk you through the next steps.",
            candidate.name
        ),
        Channel::Voice => format!(
            "Call script: introduce the admissions team, confirm {}'s interest in {course}, and \
             offer a counselling session.",
            candidate.name
        ),
        Channel::Whatsapp => format!(
            "Hi {}! Quick follow-up from the admissions team about {course}. Reply here with any \
             questions.",
            candidate.name
        ),
    };

    MessageDraft {
        day: step.day,
        channel: step.channel,
        body,
        source: NarrativeSource::Fallback,
    }
}
