use serde::{Deserialize, Serialize};
use tracing::warn;

use super::repository::TextGenerator;

const FALLBACK_INSIGHT: &str = "Narrated insights unavailable; figures above are computed directly";
const FALLBACK_RECOMMENDATION: &str =
    "Configure the text generation service to receive narrated recommendations";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Generated,
    Fallback,
}

/// Free-text commentary attached to a numeric result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub source: NarrativeSource,
}

impl Narrative {
    pub fn fallback() -> Self {
        Self {
            insights: vec![FALLBACK_INSIGHT.to_string()],
            recommendations: vec![FALLBACK_RECOMMENDATION.to_string()],
            source: NarrativeSource::Fallback,
        }
    }
}

#[derive(Deserialize)]
struct GeneratedNarrative {
    #[serde(default)]
    insights: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Asks the generator for commentary. Never fails: any error yields [`Narrative::fallback`].
///
/// Replies are expected to carry `{"insights": [...], "recommendations": [...]}`, possibly inside
/// a code fence or surrounded by prose. Anything else is kept line by line as insights.
pub fn narrate(generator: &dyn TextGenerator, prompt: &str, context: &serde_json::Value) -> Narrative {
    let text = match generator.generate(prompt, context) {
        Ok(text) => text,
        Err(error) => {
            warn!(%error, "text generation failed; using fallback narrative");
            return Narrative::fallback();
        }
    };

    if let Some(parsed) = embedded_object(&text)
        .and_then(|body| serde_json::from_str::<GeneratedNarrative>(body).ok())
    {
        return Narrative {
            insights: parsed.insights,
            recommendations: parsed.recommendations,
            source: NarrativeSource::Generated,
        };
    }

    let insights: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if insights.is_empty() {
        return Narrative::fallback();
    }

    Narrative {
        insights,
        recommendations: Vec::new(),
        source: NarrativeSource::Generated,
    }
}

/// Slice from the first `{` to the last `}` of a reply.
fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
