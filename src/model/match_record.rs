use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

/// A single match listing as emitted in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub home: String,
    pub away: String,
    pub home_logo: String,
    pub away_logo: String,
    /// Kickoff time as printed by the site, in the site's local timezone.
    pub time_local: String,
    pub status: MatchStatus,
    pub status_text: String,
    pub result_text: String,
    pub channel: Option<String>,
    pub commentator: Option<String>,
    pub competition: Option<String>,
    pub match_url: Option<String>,
    /// Which strategy or extractor produced this record.
    pub source: String,
}

/// Closed set of match states.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum MatchStatus {
    #[default]
    #[serde(rename = "NS")]
    #[strum(serialize = "NS")]
    NotStarted,
    #[serde(rename = "LIVE")]
    #[strum(serialize = "LIVE")]
    Live,
    #[serde(rename = "FT")]
    #[strum(serialize = "FT")]
    Finished,
}

impl MatchStatus {
    /// The phrase the site prints for this state.
    pub fn canonical_phrase(self) -> &'static str {
        match self {
            MatchStatus::NotStarted => "لم تبدأ بعد",
            MatchStatus::Live => "مباشر",
            MatchStatus::Finished => "انتهت",
        }
    }
}

/// Field values picked from one card before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCard {
    pub home: String,
    pub away: String,
    pub home_logo: String,
    pub away_logo: String,
    pub time_local: String,
    pub status_text: String,
    pub result_text: String,
    pub channel: String,
    pub commentator: String,
    pub competition: String,
    pub match_url: Option<String>,
}
