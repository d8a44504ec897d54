use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{Campaign, Candidate, CandidateStatus, PriorityTag};

/// Boolean expression tree evaluated against a candidate and its campaign.
///
/// `all` and `any` short-circuit left to right, so a guard placed before a field access keeps
/// the access from being evaluated at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Always,
    Predicate(Predicate),
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    pub fn predicate(predicate: Predicate) -> Self {
        Condition::Predicate(predicate)
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    pub fn evaluate(&self, context: &EvaluationContext<'_>) -> Result<bool, ConditionError> {
        match self {
            Condition::Always => Ok(true),
            Condition::Predicate(predicate) => predicate.evaluate(context),
            Condition::Not(inner) => inner.evaluate(context).map(|value| !value),
            Condition::All(terms) => {
                for term in terms {
                    if !term.evaluate(context)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any(terms) => {
                for term in terms {
                    if term.evaluate(context)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

/// Closed set of named checks a rule may combine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    HasEmail,
    HasPhone,
    EmailSent,
    EmailOpened,
    CallAnswered,
    WhatsappSent,
    WhatsappRead,
    ResponseReceived,
    IsHighPriority,
    StatusIs { status: CandidateStatus },
    CourseMatchesCampaign,
    CityMatchesCampaign,
    DaysSinceEmailSent { comparison: Comparison, days: i64 },
}

impl Predicate {
    fn evaluate(&self, context: &EvaluationContext<'_>) -> Result<bool, ConditionError> {
        let candidate = context.candidate;
        let outcome = match self {
            Predicate::HasEmail => candidate.has_email(),
            Predicate::HasPhone => candidate.has_phone(),
            Predicate::EmailSent => candidate.email_sent,
            Predicate::EmailOpened => candidate.email_opened,
            Predicate::CallAnswered => candidate.call_answered,
            Predicate::WhatsappSent => candidate.whatsapp_sent,
            Predicate::WhatsappRead => candidate.whatsapp_read,
            Predicate::ResponseReceived => candidate.response_received,
            Predicate::IsHighPriority => candidate.priority == PriorityTag::High,
            Predicate::StatusIs { status } => candidate.status.as_ref() == Some(status),
            Predicate::CourseMatchesCampaign => {
                let target = context
                    .campaign
                    .target_course()
                    .ok_or(ConditionError::MissingField {
                        field: "campaign.target_course",
                    })?;
                candidate.course() == Some(target)
            }
            Predicate::CityMatchesCampaign => {
                let target = context
                    .campaign
                    .target_city()
                    .ok_or(ConditionError::MissingField {
                        field: "campaign.target_city",
                    })?;
                candidate.city() == Some(target)
            }
            Predicate::DaysSinceEmailSent { comparison, days } => {
                let sent_at = candidate.email_sent_at.ok_or(ConditionError::MissingField {
                    field: "candidate.email_sent_at",
                })?;
                comparison.holds(context.days_since(sent_at), *days)
            }
        };
        Ok(outcome)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    AtLeast,
    AtMost,
    Exactly,
    MoreThan,
    LessThan,
}

impl Comparison {
    pub fn holds(&self, actual: i64, expected: i64) -> bool {
        match self {
            Comparison::AtLeast => actual >= expected,
            Comparison::AtMost => actual <= expected,
            Comparison::Exactly => actual == expected,
            Comparison::MoreThan => actual > expected,
            Comparison::LessThan => actual < expected,
        }
    }
}

/// Inputs visible to a condition: the candidate, its campaign, and the evaluation instant.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub candidate: &'a Candidate,
    pub campaign: &'a Campaign,
    pub now: DateTime<Utc>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(candidate: &'a Candidate, campaign: &'a Campaign, now: DateTime<Utc>) -> Self {
        Self {
            candidate,
            campaign,
            now,
        }
    }

    pub fn days_since(&self, moment: DateTime<Utc>) -> i64 {
        days_since(moment, self.now)
    }
}

/// Whole days elapsed between `moment` and `now`, truncated toward zero.
pub fn days_since(moment: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - moment).num_days()
}

/// Parses an RFC 3339 timestamp and measures it against `now`.
pub fn days_since_str(raw: &str, now: DateTime<Utc>) -> Result<i64, ConditionError> {
    let moment = DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|_| ConditionError::InvalidTimestamp(raw.to_string()))?;
    Ok(days_since(moment.with_timezone(&Utc), now))
}

/// Failure while evaluating one rule; the engine treats it as a non-match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("condition references missing field '{field}'")]
    MissingField { field: &'static str },
    #[error("'{0}' is not an RFC 3339 timestamp")]
    InvalidTimestamp(String),
}
