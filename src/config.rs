//! Scrape settings with built-in defaults and an environment overlay.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use crate::render::RenderOptions;

pub const DEFAULT_URL: &str = "https://www.yalla1shoot.com/matches-today_3/";
pub const DEFAULT_FALLBACK_URL: &str = "https://www.yallakora.com/match-center";
pub const DEFAULT_OUTPUT_DIR: &str = "matches";
pub const FEED_FILE_NAME: &str = "today.json";

/// Site-local offset from UTC. Asia/Baghdad has no daylight saving.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 3;

pub const ENV_URL: &str = "FORCE_URL";
pub const ENV_FALLBACK_URL: &str = "FALLBACK_URL";
pub const ENV_OUTPUT_DIR: &str = "MATCHDAY_OUTPUT_DIR";
pub const ENV_SUPPRESS_RESULT_TEXT: &str = "SUPPRESS_RESULT_TEXT";
pub const ENV_CARD_DIR: &str = "MATCHDAY_CARD_DIR";

/// Whether scores picked from cards are written to the feed.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResultTextMode {
    #[default]
    Extract,
    /// Always emit an empty `result_text`.
    Suppress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub url: String,
    pub fallback_url: String,
    pub output_dir: PathBuf,
    pub utc_offset_hours: i32,
    pub result_text: ResultTextMode,
    /// Treat a failed primary render as an empty page instead of aborting.
    pub tolerate_render_errors: bool,
    /// Save every matched card root here. Disabled when unset.
    pub card_capture_dir: Option<PathBuf>,
    pub render: RenderOptions,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            result_text: ResultTextMode::default(),
            tolerate_render_errors: false,
            card_capture_dir: None,
            render: RenderOptions::default(),
        }
    }
}

impl ScrapeConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`. Empty values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_URL) {
            config.url = url.trim().to_string();
        }
        if let Some(url) = get(ENV_FALLBACK_URL) {
            config.fallback_url = url.trim().to_string();
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir.trim());
        }
        if get(ENV_SUPPRESS_RESULT_TEXT).is_some_and(|v| is_truthy(&v)) {
            config.result_text = ResultTextMode::Suppress;
        }
        if let Some(dir) = get(ENV_CARD_DIR) {
            config.card_capture_dir = Some(PathBuf::from(dir.trim()));
        }
        config
    }

    pub fn feed_path(&self) -> PathBuf {
        self.output_dir.join(FEED_FILE_NAME)
    }

    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    /// Calendar date at the site for the instant `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.utc_offset()).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
