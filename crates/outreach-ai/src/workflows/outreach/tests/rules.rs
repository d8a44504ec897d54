use chrono::Duration;

use super::common::{campaign, days_ago, email_lead, high_priority_lead, now, unopened_email};
use crate::workflows::outreach::domain::{Candidate, OutreachAction, PriorityTag};
use crate::workflows::outreach::rules::{
    days_since, days_since_str, default_rules, Comparison, Condition, ConditionError,
    EvaluationContext, Predicate, Rule, RuleEngine,
};

fn rule(id: &str, condition: Condition, action: OutreachAction, priority: i32) -> Rule {
    Rule {
        id: id.to_string(),
        condition,
        action,
        priority,
        enabled: true,
    }
}

#[test]
fn fresh_lead_with_email_gets_first_email() {
    let engine = RuleEngine::default();
    let actions = engine.evaluate_at(&email_lead("c-1"), &campaign(), now());
    assert_eq!(actions, vec![OutreachAction::SendEmail]);
}

#[test]
fn unopened_email_after_three_days_triggers_voice_followup() {
    let engine = RuleEngine::default();
    let actions = engine.evaluate_at(&unopened_email("c-2", 3), &campaign(), now());
    assert!(actions.contains(&OutreachAction::MakeVoiceCall));
    assert!(!actions.contains(&OutreachAction::SendEmail));
}

#[test]
fn voice_followup_waits_two_full_days() {
    let engine = RuleEngine::default();
    let mut candidate = unopened_email("c-3", 0);
    candidate.email_sent_at = Some(now() - Duration::hours(47));

    let actions = engine.evaluate_at(&candidate, &campaign(), now());
    assert!(actions.is_empty());
}

#[test]
fn high_priority_blast_comes_first() {
    let engine = RuleEngine::default();
    let mut candidate = email_lead("c-4");
    candidate.priority = PriorityTag::High;

    let actions = engine.evaluate_at(&candidate, &campaign(), now());
    assert_eq!(
        actions,
        vec![OutreachAction::MultiChannelBlast, OutreachAction::SendEmail]
    );

    let bare = engine.evaluate_at(&high_priority_lead("c-5"), &campaign(), now());
    assert_eq!(bare, vec![OutreachAction::MultiChannelBlast]);
}

#[test]
fn opened_email_with_phone_moves_to_whatsapp() {
    let engine = RuleEngine::default();
    let mut candidate = unopened_email("c-6", 4);
    candidate.email_opened = true;
    candidate.phone = Some("+91 98200 00000".to_string());

    let actions = engine.evaluate_at(&candidate, &campaign(), now());
    assert_eq!(actions, vec![OutreachAction::SendWhatsapp]);

    candidate.response_received = true;
    assert!(engine.evaluate_at(&candidate, &campaign(), now()).is_empty());
}

#[test]
fn missing_send_timestamp_skips_voice_rule() {
    let engine = RuleEngine::default();
    let mut candidate = unopened_email("c-7", 5);
    candidate.email_sent_at = None;

    assert!(engine.evaluate_at(&candidate, &campaign(), now()).is_empty());
}

#[test]
fn blank_email_counts_as_missing() {
    let engine = RuleEngine::default();
    let mut candidate = Candidate::new("c-8", "Blank");
    candidate.email = Some("   ".to_string());

    assert!(engine.evaluate_at(&candidate, &campaign(), now()).is_empty());
}

#[test]
fn evaluation_is_deterministic_for_fixed_inputs() {
    let engine = RuleEngine::default();
    let mut candidate = unopened_email("c-9", 6);
    candidate.priority = PriorityTag::High;

    let first = engine.evaluate_at(&candidate, &campaign(), now());
    let second = engine.evaluate_at(&candidate, &campaign(), now());
    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![OutreachAction::MultiChannelBlast, OutreachAction::MakeVoiceCall]
    );
}

#[test]
fn engine_orders_by_priority_and_keeps_ties_stable() {
    let mut disabled = rule("off", Condition::Always, OutreachAction::SendEmail, -5);
    disabled.enabled = false;
    let engine = RuleEngine::new(vec![
        rule("late", Condition::Always, OutreachAction::SendWhatsapp, 9),
        rule("tie_a", Condition::Always, OutreachAction::MakeVoiceCall, 4),
        disabled,
        rule("tie_b", Condition::Always, OutreachAction::SendEmail, 4),
    ]);

    let ids: Vec<&str> = engine.rules().iter().map(|rule| rule.id.as_str()).collect();
    assert_eq!(ids, vec!["tie_a", "tie_b", "late"]);

    let actions = engine.evaluate_at(&Candidate::new("c-10", "Any"), &campaign(), now());
    assert_eq!(
        actions,
        vec![
            OutreachAction::MakeVoiceCall,
            OutreachAction::SendEmail,
            OutreachAction::SendWhatsapp,
        ]
    );
}

#[test]
fn duplicate_actions_from_different_rules_are_kept() {
    let engine = RuleEngine::new(vec![
        rule("a", Condition::Always, OutreachAction::SendEmail, 1),
        rule("b", Condition::predicate(Predicate::HasEmail), OutreachAction::SendEmail, 2),
    ]);

    let actions = engine.evaluate_at(&email_lead("c-11"), &campaign(), now());
    assert_eq!(actions, vec![OutreachAction::SendEmail, OutreachAction::SendEmail]);
}

#[test]
fn all_short_circuits_before_missing_field() {
    let candidate = email_lead("c-12");
    let campaign = campaign();
    let context = EvaluationContext::new(&candidate, &campaign, now());

    let guarded = Condition::All(vec![
        Condition::predicate(Predicate::EmailSent),
        Condition::predicate(Predicate::DaysSinceEmailSent {
            comparison: Comparison::AtLeast,
            days: 1,
        }),
    ]);
    assert_eq!(guarded.evaluate(&context), Ok(false));

    let unguarded = Condition::predicate(Predicate::DaysSinceEmailSent {
        comparison: Comparison::AtLeast,
        days: 1,
    });
    assert_eq!(
        unguarded.evaluate(&context),
        Err(ConditionError::MissingField {
            field: "candidate.email_sent_at"
        })
    );
}

#[test]
fn course_match_requires_a_campaign_target() {
    let mut candidate = email_lead("c-13");
    candidate.course = Some("Computer Science".to_string());
    let mut untargeted = campaign();
    untargeted.target_course = None;

    let matching = Condition::predicate(Predicate::CourseMatchesCampaign);
    let targeted = campaign();
    assert_eq!(
        matching.evaluate(&EvaluationContext::new(&candidate, &targeted, now())),
        Ok(true)
    );
    assert!(matching
        .evaluate(&EvaluationContext::new(&candidate, &untargeted, now()))
        .is_err());
}

#[test]
fn days_since_truncates_and_round_trips() {
    assert_eq!(days_since(days_ago(3), now()), 3);
    assert_eq!(days_since(now() - Duration::hours(71), now()), 2);
    assert_eq!(days_since(now() + Duration::hours(30), now()), -1);

    for days in [0_i64, 1, 2, 7, 45] {
        let stamp = (now() - Duration::days(days)).to_rfc3339();
        assert_eq!(days_since_str(&stamp, now()), Ok(days));
    }
    assert!(matches!(
        days_since_str("yesterday", now()),
        Err(ConditionError::InvalidTimestamp(_))
    ));
}

#[test]
fn rule_set_round_trips_through_json() {
    let raw = r#"[
        {
            "id": "status_nudge",
            "condition": {"all": [
                {"predicate": {"kind": "status_is", "status": "interested"}},
                {"not": {"predicate": {"kind": "response_received"}}}
            ]},
            "action": "send_whatsapp",
            "priority": 5
        }
    ]"#;
    let rules: Vec<Rule> = serde_json::from_str(raw).expect("parse rules");
    assert_eq!(rules.len(), 1);
    assert!(rules[0].enabled);

    let encoded = serde_json::to_string(&default_rules()).expect("encode defaults");
    let decoded: Vec<Rule> = serde_json::from_str(&encoded).expect("decode defaults");
    assert_eq!(decoded, default_rules());
}
