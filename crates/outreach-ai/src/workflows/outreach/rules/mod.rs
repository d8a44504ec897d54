mod condition;

pub use condition::{
    days_since, days_since_str, Comparison, Condition, ConditionError, EvaluationContext,
    Predicate,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{Campaign, Candidate, OutreachAction};

/// Condition to action pairing. Lower `priority` values are evaluated first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub condition: Condition,
    pub action: OutreachAction,
    pub priority: i32,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Built-in rule set shipped with the engine, in declaration order.
pub fn default_rules() -> Vec<Rule> {
    use Predicate::*;

    vec![
        Rule {
            id: "email_first".to_string(),
            condition: Condition::All(vec![
                Condition::predicate(HasEmail),
                Condition::negate(Condition::predicate(EmailSent)),
            ]),
            action: OutreachAction::SendEmail,
            priority: 1,
            enabled: true,
        },
        Rule {
            id: "voice_followup".to_string(),
            condition: Condition::All(vec![
                Condition::predicate(EmailSent),
                Condition::negate(Condition::predicate(EmailOpened)),
                Condition::predicate(DaysSinceEmailSent {
                    comparison: Comparison::AtLeast,
                    days: 2,
                }),
            ]),
            action: OutreachAction::MakeVoiceCall,
            priority: 2,
            enabled: true,
        },
        Rule {
            id: "whatsapp_engagement".to_string(),
            condition: Condition::All(vec![
                Condition::predicate(HasPhone),
                Condition::predicate(EmailOpened),
                Condition::negate(Condition::predicate(ResponseReceived)),
            ]),
            action: OutreachAction::SendWhatsapp,
            priority: 3,
            enabled: true,
        },
        Rule {
            id: "high_priority_immediate".to_string(),
            condition: Condition::predicate(IsHighPriority),
            action: OutreachAction::MultiChannelBlast,
            priority: 0,
            enabled: true,
        },
    ]
}

/// Ordered rule set producing the applicable actions for one candidate.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl RuleEngine {
    /// Disabled rules are dropped; the rest are sorted by priority, ties keeping input order.
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut rules: Vec<Rule> = rules.into_iter().filter(|rule| rule.enabled).collect();
        rules.sort_by_key(|rule| rule.priority);
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn evaluate(&self, candidate: &Candidate, campaign: &Campaign) -> Vec<OutreachAction> {
        self.evaluate_at(candidate, campaign, Utc::now())
    }

    /// Every matching rule contributes its action; duplicates are kept.
    pub fn evaluate_at(
        &self,
        candidate: &Candidate,
        campaign: &Campaign,
        now: DateTime<Utc>,
    ) -> Vec<OutreachAction> {
        let context = EvaluationContext::new(candidate, campaign, now);

        self.rules
            .iter()
            .filter_map(|rule| match rule.condition.evaluate(&context) {
                Ok(true) => Some(rule.action),
                Ok(false) => None,
                Err(error) => {
                    warn!(
                        rule_id = %rule.id,
                        candidate_id = %candidate.id,
                        %error,
                        "rule evaluation failed; treating as no match"
                    );
                    None
                }
            })
            .collect()
    }
}
