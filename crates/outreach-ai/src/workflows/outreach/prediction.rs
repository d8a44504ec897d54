//! Lightweight conversion model for what-if analysis on records that may not exist in the store.

use serde::{Deserialize, Serialize};

use super::domain::{present, CampaignType, Candidate, ValidationError};
use super::insights::Narrative;

const BASE_RATE: f64 = 0.15;
const BASE_CONFIDENCE: f64 = 0.5;
const CAP: f64 = 0.95;

/// Ad-hoc candidate description accepted by the predictor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProspectProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ProspectProfile {
    fn reference(&self) -> String {
        present(&self.id)
            .map(str::to_string)
            .unwrap_or_else(|| self.name.trim().to_string())
    }

    fn is_active(&self) -> bool {
        present(&self.status).is_some_and(|status| status.eq_ignore_ascii_case("active"))
    }
}

impl From<&Candidate> for ProspectProfile {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: Some(candidate.id.0.clone()),
            name: candidate.name.clone(),
            email: candidate.email.clone(),
            phone: candidate.phone.clone(),
            course: candidate.course.clone(),
            city: candidate.city.clone(),
            status: candidate
                .status
                .as_ref()
                .map(|status| status.label().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionPrediction {
    pub candidate: String,
    pub predicted_rate: f64,
    pub confidence: f64,
    pub factors: Vec<String>,
}

/// Aggregate view over a batch of predictions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionForecast {
    pub campaign_type: CampaignType,
    pub candidate_count: usize,
    pub average_rate: f64,
    pub expected_conversions: u32,
    pub predictions: Vec<ConversionPrediction>,
    pub narrative: Narrative,
}

impl ConversionForecast {
    pub fn new(
        campaign_type: CampaignType,
        predictions: Vec<ConversionPrediction>,
        narrative: Narrative,
    ) -> Self {
        let total: f64 = predictions.iter().map(|p| p.predicted_rate).sum();
        let average_rate = if predictions.is_empty() {
            0.0
        } else {
            total / predictions.len() as f64
        };

        Self {
            campaign_type,
            candidate_count: predictions.len(),
            average_rate,
            expected_conversions: total.round() as u32,
            predictions,
            narrative,
        }
    }
}

/// Validates the whole batch first, then scores each prospect.
pub fn predict_conversion(
    prospects: &[ProspectProfile],
    campaign_type: &str,
) -> Result<Vec<ConversionPrediction>, ValidationError> {
    let campaign_type = CampaignType::parse(campaign_type)?;
    validate(prospects)?;

    Ok(prospects
        .iter()
        .map(|prospect| predict_one(prospect, &campaign_type))
        .collect())
}

fn validate(prospects: &[ProspectProfile]) -> Result<(), ValidationError> {
    match prospects
        .iter()
        .position(|prospect| prospect.name.trim().is_empty())
    {
        Some(index) => Err(ValidationError::MissingField {
            index,
            field: "name",
        }),
        None => Ok(()),
    }
}

pub fn campaign_type_factor(campaign_type: &CampaignType) -> f64 {
    match campaign_type {
        CampaignType::Enrollment => 1.2,
        CampaignType::Event => 0.8,
        CampaignType::Information => 0.6,
        CampaignType::Other(_) => 1.0,
    }
}

fn predict_one(prospect: &ProspectProfile, campaign_type: &CampaignType) -> ConversionPrediction {
    let has_email = present(&prospect.email).is_some();
    let has_phone = present(&prospect.phone).is_some();
    let has_course = present(&prospect.course).is_some();
    let has_city = present(&prospect.city).is_some();

    let mut factors = Vec::new();
    let mut score = BASE_RATE;
    if has_email {
        score += 0.1;
        factors.push("Email address on file".to_string());
    }
    if has_phone {
        score += 0.08;
        factors.push("Phone number on file".to_string());
    }
    if has_course {
        score += 0.12;
        factors.push("Declared course interest".to_string());
    }
    if has_city {
        score += 0.05;
        factors.push("Known city".to_string());
    }

    let type_factor = campaign_type_factor(campaign_type);
    if (type_factor - 1.0).abs() > f64::EPSILON {
        factors.push(format!(
            "{} campaign adjusts the rate x{type_factor:.1}",
            campaign_type.label()
        ));
    }
    let predicted_rate = (score * type_factor).min(CAP);

    let mut confidence = BASE_CONFIDENCE;
    if has_email && has_phone {
        confidence += 0.2;
    }
    if has_course {
        confidence += 0.15;
    }
    if has_city {
        confidence += 0.1;
    }
    if prospect.is_active() {
        confidence += 0.05;
        factors.push("Currently active".to_string());
    }

    ConversionPrediction {
        candidate: prospect.reference(),
        predicted_rate,
        confidence: confidence.min(CAP),
        factors,
    }
}
