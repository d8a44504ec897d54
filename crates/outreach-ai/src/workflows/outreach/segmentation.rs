use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::domain::{AnalyticsEvent, AnalyticsEventKind, Candidate, CandidateId};

const HIGH_PERFORMING_MIN_RATE: f64 = 0.2;
const HIGH_PERFORMING_MIN_SIZE: usize = 5;
const PRIMARY_TARGET_RATE: f64 = 0.4;
const SECONDARY_TARGET_RATE: f64 = 0.25;
const AVOID_RATE: f64 = 0.1;

/// Label used when a candidate has no value for the segmenting attribute.
pub const UNKNOWN_VALUE: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentAttribute {
    Course,
    City,
    Status,
}

impl SegmentAttribute {
    pub const ALL: [SegmentAttribute; 3] = [
        SegmentAttribute::Course,
        SegmentAttribute::City,
        SegmentAttribute::Status,
    ];

    pub fn value_of(&self, candidate: &Candidate) -> String {
        let value = match self {
            SegmentAttribute::Course => candidate.course(),
            SegmentAttribute::City => candidate.city(),
            SegmentAttribute::Status => candidate.status.as_ref().map(|status| status.label()),
        };
        value.unwrap_or(UNKNOWN_VALUE).to_string()
    }
}

/// Candidates sharing one attribute value, with their observed conversion rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub attribute: SegmentAttribute,
    pub value: String,
    pub candidate_ids: Vec<CandidateId>,
    pub size: usize,
    pub conversions: usize,
    pub conversion_rate: f64,
}

impl Segment {
    pub fn is_high_performing(&self) -> bool {
        self.conversion_rate > HIGH_PERFORMING_MIN_RATE && self.size >= HIGH_PERFORMING_MIN_SIZE
    }
}

/// Every (attribute, value) group. Each candidate lands in exactly one group per attribute.
pub fn segment_population(candidates: &[Candidate], analytics: &[AnalyticsEvent]) -> Vec<Segment> {
    let converted = converted_candidates(candidates, analytics);

    let mut segments = Vec::new();
    for attribute in SegmentAttribute::ALL {
        let mut groups: BTreeMap<String, Vec<&Candidate>> = BTreeMap::new();
        for candidate in candidates {
            groups
                .entry(attribute.value_of(candidate))
                .or_default()
                .push(candidate);
        }

        for (value, members) in groups {
            let size = members.len();
            let conversions = members
                .iter()
                .filter(|candidate| converted.contains(&candidate.id))
                .count();
            segments.push(Segment {
                attribute,
                value,
                candidate_ids: members.iter().map(|candidate| candidate.id.clone()).collect(),
                size,
                conversions,
                conversion_rate: conversions as f64 / size as f64,
            });
        }
    }
    segments
}

/// High-performing segments (rate above 0.2 and at least five members), best first.
pub fn identify_segments(candidates: &[Candidate], analytics: &[AnalyticsEvent]) -> Vec<Segment> {
    high_performing(&segment_population(candidates, analytics))
}

pub fn high_performing(population: &[Segment]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = population
        .iter()
        .filter(|segment| segment.is_high_performing())
        .cloned()
        .collect();
    segments.sort_by(|a, b| b.conversion_rate.total_cmp(&a.conversion_rate));
    segments
}

/// A candidate is converted when it has responded or a conversion event names it.
fn converted_candidates(
    candidates: &[Candidate],
    analytics: &[AnalyticsEvent],
) -> HashSet<CandidateId> {
    let mut converted: HashSet<CandidateId> = candidates
        .iter()
        .filter(|candidate| candidate.is_converted())
        .map(|candidate| candidate.id.clone())
        .collect();
    converted.extend(
        analytics
            .iter()
            .filter(|event| event.event_type == AnalyticsEventKind::Conversion)
            .filter_map(|event| event.candidate_id.clone()),
    );
    converted
}

/// Which segments to pursue and which to stay away from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetingRecommendation {
    pub primary_targets: Vec<Segment>,
    pub secondary_targets: Vec<Segment>,
    pub avoid: Vec<Segment>,
}

/// Primary and secondary targets come from the high performers; `avoid` is drawn from the whole
/// population, including groups too small to be high performers.
pub fn targeting_recommendation(
    high_performing: &[Segment],
    population: &[Segment],
) -> TargetingRecommendation {
    let primary_targets = high_performing
        .iter()
        .filter(|segment| segment.conversion_rate > PRIMARY_TARGET_RATE)
        .cloned()
        .collect();
    let secondary_targets = high_performing
        .iter()
        .filter(|segment| {
            segment.conversion_rate > SECONDARY_TARGET_RATE
                && segment.conversion_rate <= PRIMARY_TARGET_RATE
        })
        .cloned()
        .collect();
    let avoid = population
        .iter()
        .filter(|segment| segment.conversion_rate < AVOID_RATE)
        .cloned()
        .collect();

    TargetingRecommendation {
        primary_targets,
        secondary_targets,
        avoid,
    }
}

/// Candidate counts per status label.
pub fn status_distribution(candidates: &[Candidate]) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    for candidate in candidates {
        *distribution
            .entry(SegmentAttribute::Status.value_of(candidate))
            .or_insert(0) += 1;
    }
    distribution
}
