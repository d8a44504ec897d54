use super::common::{conversion_event, email_lead};
use crate::workflows::outreach::domain::{Candidate, CandidateStatus};
use crate::workflows::outreach::segmentation::{
    high_performing, identify_segments, segment_population, status_distribution,
    targeting_recommendation, SegmentAttribute, UNKNOWN_VALUE,
};

fn student(id: &str, course: &str, city: Option<&str>, converted: bool) -> Candidate {
    let mut candidate = email_lead(id);
    candidate.course = Some(course.to_string());
    candidate.city = city.map(str::to_string);
    candidate.response_received = converted;
    candidate
}

/// Six design students (two converted) and four law students (three converted).
fn cohort() -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for i in 0..6 {
        candidates.push(student(&format!("d-{i}"), "Design", Some("Pune"), i < 2));
    }
    for i in 0..4 {
        candidates.push(student(&format!("l-{i}"), "Law", None, i < 3));
    }
    candidates
}

#[test]
fn small_segment_is_never_high_performing() {
    let segments = identify_segments(&cohort(), &[]);

    assert!(segments
        .iter()
        .all(|segment| !(segment.attribute == SegmentAttribute::Course && segment.value == "Law")));
    let design = segments
        .iter()
        .find(|segment| segment.attribute == SegmentAttribute::Course && segment.value == "Design")
        .expect("design segment");
    assert_eq!(design.size, 6);
    assert_eq!(design.conversions, 2);
}

#[test]
fn high_performers_sorted_by_rate_descending() {
    let segments = identify_segments(&cohort(), &[]);
    assert!(!segments.is_empty());
    for pair in segments.windows(2) {
        assert!(pair[0].conversion_rate >= pair[1].conversion_rate);
    }
    assert!(segments.iter().all(|segment| segment.size >= 5));
}

#[test]
fn every_candidate_lands_in_one_group_per_attribute() {
    let candidates = cohort();
    let population = segment_population(&candidates, &[]);

    for attribute in SegmentAttribute::ALL {
        let total: usize = population
            .iter()
            .filter(|segment| segment.attribute == attribute)
            .map(|segment| segment.size)
            .sum();
        assert_eq!(total, candidates.len(), "{attribute:?} groups do not cover the cohort");
    }

    let unknown_city = population
        .iter()
        .find(|segment| segment.attribute == SegmentAttribute::City && segment.value == UNKNOWN_VALUE)
        .expect("unknown city group");
    assert_eq!(unknown_city.size, 4);
}

#[test]
fn conversion_events_count_towards_segment_rate() {
    let candidates: Vec<_> = (0..5)
        .map(|i| student(&format!("c-{i}"), "Physics", Some("Delhi"), false))
        .collect();
    let events = vec![conversion_event("c-0", 1), conversion_event("c-1", 2)];

    let segments = identify_segments(&candidates, &events);
    let physics = segments
        .iter()
        .find(|segment| segment.value == "Physics")
        .expect("physics segment");
    assert_eq!(physics.conversions, 2);
    assert!((physics.conversion_rate - 0.4).abs() < 1e-9);
}

#[test]
fn recommendation_splits_targets_and_avoid_uses_population() {
    let mut candidates = cohort();
    for i in 0..5 {
        candidates.push(student(&format!("a-{i}"), "Art", Some("Goa"), false));
    }
    let population = segment_population(&candidates, &[]);
    let high = high_performing(&population);
    let recommendation = targeting_recommendation(&high, &population);

    assert!(recommendation
        .primary_targets
        .iter()
        .all(|segment| segment.conversion_rate > 0.4));
    assert!(recommendation
        .secondary_targets
        .iter()
        .any(|segment| segment.value == "Design"));
    assert!(recommendation
        .avoid
        .iter()
        .any(|segment| segment.value == "Art" && segment.size == 5));
    assert!(recommendation.avoid.iter().all(|segment| segment.conversion_rate < 0.1));
}

#[test]
fn status_distribution_labels_missing_status_unknown() {
    let mut candidates = cohort();
    candidates[0].status = Some(CandidateStatus::Interested);
    candidates[1].status = None;

    let distribution = status_distribution(&candidates);
    assert_eq!(distribution.get("interested"), Some(&1));
    assert_eq!(distribution.get(UNKNOWN_VALUE), Some(&1));
    assert_eq!(distribution.values().sum::<usize>(), candidates.len());
}

#[test]
fn custom_status_labels_group_regardless_of_spacing_or_case() {
    let mut candidates = cohort();
    candidates[0].status = Some(CandidateStatus::from("Alumni ".to_string()));
    candidates[1].status = Some(CandidateStatus::from("alumni".to_string()));
    candidates[2].status = Some(CandidateStatus::from(" ALUMNI".to_string()));

    let distribution = status_distribution(&candidates);
    assert_eq!(distribution.get("alumni"), Some(&3));
    assert!(!distribution.contains_key("Alumni "));

    let population = segment_population(&candidates, &[]);
    let alumni: Vec<_> = population
        .iter()
        .filter(|segment| {
            segment.attribute == SegmentAttribute::Status
                && segment.value.eq_ignore_ascii_case("alumni")
        })
        .collect();
    assert_eq!(alumni.len(), 1);
    assert_eq!(alumni[0].size, 3);
}
