use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for candidate records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Identifier wrapper for campaigns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CampaignId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prospective student tracked through one campaign's outreach funnel.
///
/// Touch flags are written by the delivery layer after each attempt; the decisioning core only
/// reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<CampaignId>,
    #[serde(default)]
    pub email_sent: bool,
    #[serde(default)]
    pub email_sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email_opened: bool,
    #[serde(default)]
    pub call_answered: bool,
    #[serde(default)]
    pub whatsapp_sent: bool,
    #[serde(default)]
    pub whatsapp_read: bool,
    #[serde(default)]
    pub response_received: bool,
    #[serde(default)]
    pub status: Option<CandidateStatus>,
    #[serde(default)]
    pub priority: PriorityTag,
}

impl Candidate {
    /// Minimal record with every touch flag cleared.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CandidateId(id.into()),
            name: name.into(),
            email: None,
            phone: None,
            city: None,
            course: None,
            campaign_id: None,
            email_sent: false,
            email_sent_at: None,
            email_opened: false,
            call_answered: false,
            whatsapp_sent: false,
            whatsapp_read: false,
            response_received: false,
            status: None,
            priority: PriorityTag::Normal,
        }
    }

    pub fn email(&self) -> Option<&str> {
        present(&self.email)
    }

    pub fn phone(&self) -> Option<&str> {
        present(&self.phone)
    }

    pub fn city(&self) -> Option<&str> {
        present(&self.city)
    }

    pub fn course(&self) -> Option<&str> {
        present(&self.course)
    }

    pub fn has_email(&self) -> bool {
        self.email().is_some()
    }

    pub fn has_phone(&self) -> bool {
        self.phone().is_some()
    }

    /// A candidate counts as converted once any response has been received.
    pub fn is_converted(&self) -> bool {
        self.response_received
    }
}

/// Blank strings are treated the same as missing values.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Funnel status recorded on a candidate. Unknown labels are kept trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CandidateStatus {
    Pending,
    Active,
    EmailSent,
    VoiceCalled,
    WhatsappSent,
    Interested,
    Enrolled,
    Failed,
    Other(String),
}

impl CandidateStatus {
    pub fn label(&self) -> &str {
        match self {
            CandidateStatus::Pending => "pending",
            CandidateStatus::Active => "active",
            CandidateStatus::EmailSent => "email_sent",
            CandidateStatus::VoiceCalled => "voice_called",
            CandidateStatus::WhatsappSent => "whatsapp_sent",
            CandidateStatus::Interested => "interested",
            CandidateStatus::Enrolled => "enrolled",
            CandidateStatus::Failed => "failed",
            CandidateStatus::Other(label) => label,
        }
    }
}

impl From<String> for CandidateStatus {
    fn from(value: String) -> Self {
        let label = value.trim().to_ascii_lowercase();
        match label.as_str() {
            "pending" => CandidateStatus::Pending,
            "active" => CandidateStatus::Active,
            "email_sent" => CandidateStatus::EmailSent,
            "voice_called" => CandidateStatus::VoiceCalled,
            "whatsapp_sent" => CandidateStatus::WhatsappSent,
            "interested" => CandidateStatus::Interested,
            "enrolled" => CandidateStatus::Enrolled,
            "failed" => CandidateStatus::Failed,
            _ => CandidateStatus::Other(label),
        }
    }
}

impl From<CandidateStatus> for String {
    fn from(value: CandidateStatus) -> Self {
        value.label().to_string()
    }
}

/// Optional priority tag; only `"high"` carries meaning, everything else is normal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum PriorityTag {
    High,
    #[default]
    Normal,
}

impl From<Option<String>> for PriorityTag {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("high") => PriorityTag::High,
            _ => PriorityTag::Normal,
        }
    }
}

impl From<PriorityTag> for String {
    fn from(value: PriorityTag) -> Self {
        match value {
            PriorityTag::High => "high".to_string(),
            PriorityTag::Normal => "normal".to_string(),
        }
    }
}

/// Container for candidates plus the optional match criteria used when scoring them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    #[serde(default)]
    pub target_course: Option<String>,
    #[serde(default)]
    pub target_city: Option<String>,
    #[serde(default, rename = "type")]
    pub campaign_type: Option<String>,
}

impl Campaign {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CampaignId(id.into()),
            name: name.into(),
            target_course: None,
            target_city: None,
            campaign_type: None,
        }
    }

    pub fn target_course(&self) -> Option<&str> {
        present(&self.target_course)
    }

    pub fn target_city(&self) -> Option<&str> {
        present(&self.target_city)
    }
}

/// Campaign category used as a multiplier key when predicting conversions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum CampaignType {
    Enrollment,
    Event,
    Information,
    Other(String),
}

impl CampaignType {
    /// Accepts any single lowercase-able token; known labels map to their variants.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_ascii_lowercase();
        let well_formed = !normalized.is_empty()
            && normalized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !well_formed {
            return Err(ValidationError::InvalidCampaignType(raw.to_string()));
        }

        Ok(match normalized.as_str() {
            "enrollment" => CampaignType::Enrollment,
            "event" => CampaignType::Event,
            "information" => CampaignType::Information,
            _ => CampaignType::Other(normalized),
        })
    }

    pub fn label(&self) -> &str {
        match self {
            CampaignType::Enrollment => "enrollment",
            CampaignType::Event => "event",
            CampaignType::Information => "information",
            CampaignType::Other(label) => label,
        }
    }
}

impl From<CampaignType> for String {
    fn from(value: CampaignType) -> Self {
        value.label().to_string()
    }
}

/// Outreach action a rule can recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachAction {
    SendEmail,
    MakeVoiceCall,
    SendWhatsapp,
    MultiChannelBlast,
}

impl OutreachAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutreachAction::SendEmail => "send_email",
            OutreachAction::MakeVoiceCall => "make_voice_call",
            OutreachAction::SendWhatsapp => "send_whatsapp",
            OutreachAction::MultiChannelBlast => "multi_channel_blast",
        }
    }
}

impl fmt::Display for OutreachAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outreach medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Voice,
    Whatsapp,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Email, Channel::Voice, Channel::Whatsapp];

    /// Substring that identifies actions delivered over this channel.
    pub fn keyword(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Voice => "voice",
            Channel::Whatsapp => "whatsapp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Email => "Email",
            Channel::Voice => "Voice call",
            Channel::Whatsapp => "WhatsApp",
        }
    }

    pub fn carries(&self, action: OutreachAction) -> bool {
        action.as_str().contains(self.keyword())
    }
}

/// Historical analytics record emitted by the delivery layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub campaign_id: CampaignId,
    #[serde(default)]
    pub candidate_id: Option<CandidateId>,
    pub event_type: AnalyticsEventKind,
    #[serde(default)]
    pub channel: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventKind {
    Engagement,
    Conversion,
    DecisionMade,
    #[serde(other)]
    Other,
}

/// Input rejected before any scoring work begins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("campaign type '{0}' is not a valid identifier")]
    InvalidCampaignType(String),
    #[error("candidate at index {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },
    #[error("timeframe '{0}' must look like '30d'")]
    InvalidTimeframe(String),
}
