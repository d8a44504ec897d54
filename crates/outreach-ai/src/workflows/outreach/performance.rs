use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::domain::{AnalyticsEvent, AnalyticsEventKind, CampaignId, ValidationError};
use super::insights::Narrative;

/// Look-back window written as `<days>d`, e.g. `30d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeframe {
    days: u32,
}

impl Default for Timeframe {
    fn default() -> Self {
        Self { days: 30 }
    }
}

impl Timeframe {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTimeframe(raw.to_string());
        let digits = raw.trim().strip_suffix('d').ok_or_else(invalid)?;
        let days = digits.parse::<u32>().map_err(|_| invalid())?;
        if days == 0 {
            return Err(invalid());
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn label(&self) -> String {
        format!("{}d", self.days)
    }

    pub fn contains(&self, moment: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        moment <= now && now - moment <= Duration::days(i64::from(self.days))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub total_candidates: usize,
    pub engaged: usize,
    pub conversions: usize,
    pub engagement_rate: f64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub campaign_id: CampaignId,
    pub timeframe: String,
    pub metrics: PerformanceMetrics,
    pub narrative: Narrative,
}

/// Engagement and conversion counts over events that fall inside the window.
pub fn measure(
    total_candidates: usize,
    analytics: &[AnalyticsEvent],
    timeframe: Timeframe,
    now: DateTime<Utc>,
) -> PerformanceMetrics {
    let mut engaged = 0;
    let mut conversions = 0;
    for event in analytics
        .iter()
        .filter(|event| timeframe.contains(event.timestamp, now))
    {
        match event.event_type {
            AnalyticsEventKind::Engagement => engaged += 1,
            AnalyticsEventKind::Conversion => conversions += 1,
            AnalyticsEventKind::DecisionMade | AnalyticsEventKind::Other => {}
        }
    }

    let rate = |count: usize| {
        if total_candidates == 0 {
            0.0
        } else {
            count as f64 / total_candidates as f64
        }
    };

    PerformanceMetrics {
        total_candidates,
        engaged,
        conversions,
        engagement_rate: rate(engaged),
        conversion_rate: rate(conversions),
    }
}
