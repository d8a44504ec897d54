//! Campaign-level scoring used by the strategy aggregator.
//!
//! These formulas differ from the ad-hoc model in [`super::prediction`] on purpose; the two feed
//! different call paths and are kept apart.

use super::domain::{Campaign, Candidate, OutreachAction};

const PRIORITY_BASE: u8 = 50;
const PRIORITY_CAP: u8 = 100;

const CONVERSION_BASE_RATE: f64 = 0.15;
const CONVERSION_CAP: f64 = 0.95;

/// Outreach priority in `[50, 100]`.
pub fn priority_score(candidate: &Candidate, campaign: &Campaign) -> u8 {
    let mut score = PRIORITY_BASE;

    if candidate.has_email() {
        score += 20;
    }
    if candidate.has_phone() {
        score += 15;
    }
    if matches_target(candidate.course(), campaign.target_course()) {
        score += 25;
    }
    if matches_target(candidate.city(), campaign.target_city()) {
        score += 10;
    }

    score.min(PRIORITY_CAP)
}

fn matches_target(value: Option<&str>, target: Option<&str>) -> bool {
    matches!((value, target), (Some(value), Some(target)) if value == target)
}

/// Weight each action adds to the conversion multiplier.
pub fn action_weight(action: OutreachAction) -> f64 {
    match action {
        OutreachAction::SendEmail => 0.3,
        OutreachAction::MakeVoiceCall => 0.5,
        OutreachAction::SendWhatsapp => 0.2,
        OutreachAction::MultiChannelBlast => 0.8,
    }
}

/// Estimated conversion probability for a planned action set, in `[0.15, 0.95]`.
///
/// Weights add onto a single multiplier (they do not compound) and each distinct action counts
/// once no matter how often it appears.
pub fn estimated_conversion_rate(actions: &[OutreachAction]) -> f64 {
    let multiplier = [
        OutreachAction::SendEmail,
        OutreachAction::MakeVoiceCall,
        OutreachAction::SendWhatsapp,
        OutreachAction::MultiChannelBlast,
    ]
    .into_iter()
    .filter(|action| actions.contains(action))
    .map(action_weight)
    .fold(1.0, |acc, weight| acc + weight);

    (CONVERSION_BASE_RATE * multiplier).min(CONVERSION_CAP)
}
