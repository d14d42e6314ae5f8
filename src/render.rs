//! The page acquisition seam.
//!
//! Extraction works on a fully rendered snapshot. Producing that snapshot
//! (navigation, readiness waits, lazy-load scrolling, screenshots) belongs to
//! a [`PageRenderer`]. [`HttpRenderer`] is the plain-HTTP implementation used
//! for the fallback page and for targets that render server-side; a
//! browser-backed renderer implements the same trait.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::error::{MatchdayError, Result};
use crate::extract::get_document;

const DESKTOP_CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127 Safari/537.36";

/// A rendered page snapshot.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Final URL, used as the base for relative links and images.
    pub url: Url,
    pub html: String,
    /// Full-page PNG, when the renderer can produce one.
    pub screenshot_png: Option<Vec<u8>>,
}

/// Limits and environment the extraction expects a renderer to honor.
///
/// [`HttpRenderer`] reads only `navigation_timeout_ms`, `user_agent`,
/// `locale` and `ignore_https_errors`. The readiness waits, scrolling,
/// viewport and timezone settings are for browser-backed renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub navigation_timeout_ms: u64,
    /// How long to wait for network idle after DOM content is loaded.
    pub network_idle_timeout_ms: u64,
    /// How long to wait for `wait_for_selector` to appear.
    pub marker_timeout_ms: u64,
    pub wait_for_selector: Option<String>,
    /// Scroll step and pause used to trigger lazy loading before snapshotting.
    pub scroll_step_px: u32,
    pub scroll_pause_ms: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    pub locale: String,
    pub timezone: String,
    pub ignore_https_errors: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 60_000,
            network_idle_timeout_ms: 20_000,
            marker_timeout_ms: 60_000,
            wait_for_selector: Some(".MT_Team.TM1 .TM_Name".to_string()),
            scroll_step_px: 900,
            scroll_pause_ms: 250,
            viewport_width: 1366,
            viewport_height: 864,
            user_agent: DESKTOP_CHROME_UA.to_string(),
            locale: "ar".to_string(),
            timezone: "Asia/Baghdad".to_string(),
            ignore_https_errors: false,
        }
    }
}

impl RenderOptions {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

/// Produces a rendered snapshot of a URL.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url, options: &RenderOptions) -> Result<RenderedPage>;
}

/// Fetches markup over plain HTTP. Never produces a screenshot.
pub struct HttpRenderer {
    http: reqwest::Client,
}

impl HttpRenderer {
    /// Build a client honoring the timeout, user agent, locale and TLS
    /// settings in `options`.
    pub fn new(options: &RenderOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(locale) = HeaderValue::from_str(&options.locale) {
            headers.insert(ACCEPT_LANGUAGE, locale);
        }

        let http = reqwest::Client::builder()
            .timeout(options.navigation_timeout())
            .user_agent(options.user_agent.as_str())
            .default_headers(headers)
            .danger_accept_invalid_certs(options.ignore_https_errors)
            .build()
            .map_err(MatchdayError::Client)?;
        Ok(Self { http })
    }

    /// Use the provided [`reqwest::Client`] as is.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { http: client }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    #[instrument(skip_all, fields(url = %url))]
    async fn render(&self, url: &Url, _options: &RenderOptions) -> Result<RenderedPage> {
        let (url, html) = get_document(&self.http, url.as_str()).await?;
        Ok(RenderedPage {
            url,
            html,
            screenshot_png: None,
        })
    }
}
