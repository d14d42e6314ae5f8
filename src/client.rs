use std::fmt;

use ::scraper::{Html, Selector};
use chrono::NaiveDate;
use itertools::Itertools;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::capture::{CardCapture, CardSnapshot, DebugCapture, FsCardCapture, FsDebugCapture};
use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::extract::assemble::{assemble_records, AssembleContext};
use crate::extract::fallback::{extract_fallback_cards, FALLBACK_SOURCE};
use crate::extract::pickers::pick_card;
use crate::extract::strategy::StrategyChain;
use crate::extract::visible_text;
use crate::model::{MatchFeed, MatchRecord};
use crate::render::{HttpRenderer, PageRenderer, RenderedPage};

/// Where the records in a feed came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOrigin {
    /// The named strategy matched the primary page.
    Strategy(&'static str),
    /// The primary page yielded nothing and the fallback page did.
    Fallback,
    /// Neither source produced a record.
    Empty,
}

impl fmt::Display for FeedOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedOrigin::Strategy(name) => write!(f, "strategy {name}"),
            FeedOrigin::Fallback => write!(f, "{FALLBACK_SOURCE}"),
            FeedOrigin::Empty => write!(f, "none"),
        }
    }
}

/// Result of one scrape.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub feed: MatchFeed,
    pub origin: FeedOrigin,
}

/// Drives one scrape: render, run the strategy chain, and on an empty result
/// capture diagnostics and try the fallback page.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> matchday_scraper::Result<()> {
/// use matchday_scraper::{MatchScraper, ScrapeConfig};
///
/// let scraper = MatchScraper::new(ScrapeConfig::from_env())?;
/// let report = scraper.scrape().await?;
/// println!("{} matches via {}", report.feed.matches.len(), report.origin);
/// # Ok(())
/// # }
/// ```
pub struct MatchScraper {
    config: ScrapeConfig,
    chain: StrategyChain,
    renderer: Box<dyn PageRenderer>,
    fallback: Box<dyn PageRenderer>,
    capture: Box<dyn DebugCapture>,
    card_capture: Option<Box<dyn CardCapture>>,
}

/// Outcome of running the chain over the primary page.
struct PrimaryExtraction {
    strategy: &'static str,
    records: Vec<MatchRecord>,
    /// Filled only when a card capture hook is installed.
    cards: Vec<CardSnapshot>,
}

impl MatchScraper {
    /// Plain-HTTP rendering for both pages and debug files in the output
    /// directory. Cards are saved when `card_capture_dir` is set.
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let renderer = HttpRenderer::new(&config.render)?;
        let fallback = HttpRenderer::new(&config.render)?;
        let capture = FsDebugCapture::new(config.output_dir.clone());
        let card_dir = config.card_capture_dir.clone();

        let scraper = Self::with_parts(
            config,
            StrategyChain::default_chain()?,
            Box::new(renderer),
            Box::new(fallback),
            Box::new(capture),
        );
        Ok(match card_dir {
            Some(dir) => scraper.with_card_capture(Box::new(FsCardCapture::new(dir))),
            None => scraper,
        })
    }

    pub fn with_parts(
        config: ScrapeConfig,
        chain: StrategyChain,
        renderer: Box<dyn PageRenderer>,
        fallback: Box<dyn PageRenderer>,
        capture: Box<dyn DebugCapture>,
    ) -> Self {
        Self {
            config,
            chain,
            renderer,
            fallback,
            capture,
            card_capture: None,
        }
    }

    /// Run `card_capture` once for every card root of the matched strategy.
    pub fn with_card_capture(mut self, card_capture: Box<dyn CardCapture>) -> Self {
        self.card_capture = Some(card_capture);
        self
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Scrape using today's site-local date.
    pub async fn scrape(&self) -> Result<ScrapeReport> {
        self.scrape_on(self.config.today()).await
    }

    #[instrument(skip(self), fields(url = %self.config.url))]
    pub async fn scrape_on(&self, date: NaiveDate) -> Result<ScrapeReport> {
        let url = Url::parse(&self.config.url)?;
        info!("opening primary page");

        let page = match self.renderer.render(&url, &self.config.render).await {
            Ok(page) => Some(page),
            Err(e) if self.config.tolerate_render_errors && e.is_render_failure() => {
                warn!(error = %e, "primary render failed, continuing without it");
                None
            }
            Err(e) => return Err(e),
        };

        if let Some(page) = &page {
            if let Some(primary) = self.extract_primary(page, date) {
                self.capture_cards(&primary.cards).await;

                if !primary.records.is_empty() {
                    info!(
                        strategy = primary.strategy,
                        count = primary.records.len(),
                        "extracted matches"
                    );
                    return Ok(ScrapeReport {
                        feed: MatchFeed {
                            date,
                            source_url: self.config.url.clone(),
                            matches: primary.records,
                        },
                        origin: FeedOrigin::Strategy(primary.strategy),
                    });
                }
                debug!(strategy = primary.strategy, "every card was missing a team name");
            }

            warn!("no cards found on primary page, writing debug artifacts");
            if let Err(e) = self.capture.capture(page).await {
                warn!(error = %e, "failed to write debug artifacts");
            }
        }

        let matches = self.extract_fallback(date).await;
        let origin = if matches.is_empty() {
            FeedOrigin::Empty
        } else {
            FeedOrigin::Fallback
        };
        let source_url = match origin {
            FeedOrigin::Fallback => self.config.fallback_url.clone(),
            _ => self.config.url.clone(),
        };
        info!(%origin, count = matches.len(), "finished scrape");

        Ok(ScrapeReport {
            feed: MatchFeed {
                date,
                source_url,
                matches,
            },
            origin,
        })
    }

    /// Run the strategy chain over the primary page. `None` when no strategy
    /// matched.
    fn extract_primary(&self, page: &RenderedPage, date: NaiveDate) -> Option<PrimaryExtraction> {
        let document = Html::parse_document(&page.html);
        log_page_summary(&document, &self.chain);

        let matched = self.chain.select(&document)?;
        let strategy = matched.strategy;

        let snapshots = if self.card_capture.is_some() {
            matched
                .roots
                .iter()
                .enumerate()
                .map(|(index, root)| CardSnapshot {
                    date,
                    index,
                    html: root.html(),
                })
                .collect_vec()
        } else {
            Vec::new()
        };

        let cards = matched
            .roots
            .iter()
            .map(|root| pick_card(*root, strategy, &page.url))
            .collect_vec();
        let ctx = AssembleContext {
            date,
            source: strategy.name,
            result_text: self.config.result_text,
        };

        Some(PrimaryExtraction {
            strategy: strategy.name,
            records: assemble_records(cards, &ctx),
            cards: snapshots,
        })
    }

    /// Hand every card to the capture hook. A failing card is logged and
    /// skipped.
    async fn capture_cards(&self, cards: &[CardSnapshot]) {
        let Some(hook) = &self.card_capture else {
            return;
        };

        let mut saved = 0;
        for card in cards {
            match hook.capture_card(card).await {
                Ok(path) => {
                    saved += 1;
                    debug!(index = card.index, path = %path.display(), "captured card");
                }
                Err(e) => warn!(index = card.index, error = %e, "card capture failed"),
            }
        }
        info!(saved, total = cards.len(), "captured cards");
    }

    /// Fetch and parse the fallback page. Failures yield no records.
    async fn extract_fallback(&self, date: NaiveDate) -> Vec<MatchRecord> {
        let url = match Url::parse(&self.config.fallback_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, url = %self.config.fallback_url, "invalid fallback url");
                return Vec::new();
            }
        };

        info!(url = %url, "trying fallback page");
        let page = match self.fallback.render(&url, &self.config.render).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "fallback page failed");
                return Vec::new();
            }
        };

        let cards = {
            let document = Html::parse_document(&page.html);
            extract_fallback_cards(&document, &page.url)
        };
        let ctx = AssembleContext {
            date,
            source: FALLBACK_SOURCE,
            result_text: self.config.result_text,
        };
        assemble_records(cards, &ctx)
    }
}

fn log_page_summary(document: &Html, chain: &StrategyChain) {
    let title = Selector::parse("title")
        .ok()
        .and_then(|s| document.select(&s).next().map(visible_text))
        .unwrap_or_default();
    let markers = chain
        .strategies()
        .iter()
        .map(|s| format!("{}={}", s.name, s.marker_count(document)))
        .join(", ");
    debug!(title = %title, markers = %markers, "primary page loaded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchdayError;
    use crate::model::MatchStatus;
    use crate::render::RenderOptions;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const LISTING: &str = r#"<html><head><title>مباريات اليوم</title></head><body>
      <div class="AY_Match">
        <div class="MT_Team TM1">
          <div class="TM_Logo"><img src="data:image/png;base64,AAAA"></div>
          <div class="TM_Name">Team A</div>
        </div>
        <div class="MT_Data">
          <span class="MT_Time">18:00</span>
          <span class="MT_Result">1 - 1</span>
          <span class="MT_Stat">مباشر</span>
        </div>
        <div class="MT_Team TM2">
          <div class="TM_Logo"><img data-src="/wp-content/b.png" src="data:image/gif;base64,R0"></div>
          <div class="TM_Name">Team B</div>
        </div>
        <div class="MT_Info"><ul><li><span>beIN Sports 2</span></li></ul></div>
      </div>
      <div class="AY_Match">
        <div class="MT_Team TM1"><div class="TM_Name">Team C</div></div>
        <div class="MT_Data"><span class="MT_Stat">انتهت</span></div>
        <div class="MT_Team TM2"><div class="TM_Name">Team D</div></div>
      </div>
    </body></html>"#;

    const FALLBACK: &str = r#"<html><body>
      <a href="/tournament/1/league">Premier League</a>
      <a href="/match/77">Team A 03:30 م Team B</a>
    </body></html>"#;

    struct StaticRenderer {
        html: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl StaticRenderer {
        fn serving(html: &'static str) -> Self {
            Self {
                html: Some(html),
                calls: Arc::default(),
            }
        }

        fn failing() -> Self {
            Self {
                html: None,
                calls: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl PageRenderer for StaticRenderer {
        async fn render(&self, url: &Url, _options: &RenderOptions) -> Result<RenderedPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.html {
                Some(html) => Ok(RenderedPage {
                    url: url.clone(),
                    html: html.to_string(),
                    screenshot_png: None,
                }),
                None => Err(MatchdayError::Render {
                    url: url.to_string(),
                    message: "net::ERR_CERT_AUTHORITY_INVALID".to_string(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct CountingCapture {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl DebugCapture for CountingCapture {
        async fn capture(&self, _page: &RenderedPage) -> Result<Vec<PathBuf>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MatchdayError::Io {
                    path: PathBuf::from("debug_page.html"),
                    source: std::io::Error::other("disk full"),
                });
            }
            Ok(vec![PathBuf::from("debug_page.html")])
        }
    }

    /// Records every card it is handed and fails on one index.
    #[derive(Default)]
    struct RecordingCardCapture {
        fail_on: Option<usize>,
        attempted: Arc<Mutex<Vec<usize>>>,
        saved: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl CardCapture for RecordingCardCapture {
        async fn capture_card(&self, card: &CardSnapshot) -> Result<PathBuf> {
            self.attempted.lock().unwrap().push(card.index);
            if self.fail_on == Some(card.index) {
                return Err(MatchdayError::Render {
                    url: card.file_stem(),
                    message: "element is not attached to the DOM".to_string(),
                });
            }
            self.saved.lock().unwrap().push(card.html.clone());
            Ok(PathBuf::from(format!("{}.html", card.file_stem())))
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 30).unwrap()
    }

    fn scraper(
        config: ScrapeConfig,
        primary: StaticRenderer,
        fallback: StaticRenderer,
        capture: CountingCapture,
    ) -> MatchScraper {
        MatchScraper::with_parts(
            config,
            StrategyChain::default_chain().unwrap(),
            Box::new(primary),
            Box::new(fallback),
            Box::new(capture),
        )
    }

    fn config() -> ScrapeConfig {
        ScrapeConfig {
            url: "https://www.example.com/matches-today_3/".to_string(),
            fallback_url: "https://fallback.example.com/match-center".to_string(),
            ..ScrapeConfig::default()
        }
    }

    #[tokio::test]
    async fn primary_listing_produces_records() {
        let captures = CountingCapture::default();
        let capture_calls = captures.calls.clone();
        let fallback = StaticRenderer::serving(FALLBACK);
        let fallback_calls = fallback.calls.clone();

        let report = scraper(config(), StaticRenderer::serving(LISTING), fallback, captures)
            .scrape_on(date())
            .await
            .unwrap();

        assert_eq!(report.origin, FeedOrigin::Strategy("mt-team"));
        assert_eq!(capture_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);

        let feed = report.feed;
        assert_eq!(feed.date, date());
        assert_eq!(feed.source_url, "https://www.example.com/matches-today_3/");
        assert_eq!(feed.matches.len(), 2);

        let first = &feed.matches[0];
        assert_eq!(first.home, "Team A");
        assert_eq!(first.away, "Team B");
        assert_eq!(first.status, MatchStatus::Live);
        assert_eq!(first.status_text, "مباشر");
        assert_eq!(first.home_logo, "");
        assert_eq!(first.away_logo, "https://www.example.com/wp-content/b.png");
        assert_eq!(first.time_local, "18:00");
        assert_eq!(first.result_text, "1 - 1");
        assert_eq!(first.channel.as_deref(), Some("beIN Sports 2"));
        assert_eq!(first.source, "mt-team");
        assert_eq!(first.id, "TeamA-TeamB-2025-08-30");

        let second = &feed.matches[1];
        assert_eq!(second.status, MatchStatus::Finished);
        assert_eq!(second.channel, None);
    }

    #[tokio::test]
    async fn failing_card_capture_does_not_stop_other_cards() {
        const THREE_CARDS: &str = r#"<html><body><div class="AY_Inner">
          <div class="AY_Match">
            <div class="MT_Team TM1"><div class="TM_Name">Team A</div></div>
            <div class="MT_Data"><span class="MT_Stat">مباشر</span></div>
            <div class="MT_Team TM2"><div class="TM_Name">Team B</div></div>
          </div>
          <div class="AY_Match">
            <div class="MT_Team TM1"><div class="TM_Name">Team C</div></div>
            <div class="MT_Data"><span class="MT_Stat">انتهت</span></div>
            <div class="MT_Team TM2"><div class="TM_Name">Team D</div></div>
          </div>
          <div class="AY_Match">
            <div class="MT_Team TM1"><div class="TM_Name">Team E</div></div>
            <div class="MT_Data"><span class="MT_Time">22:00</span></div>
            <div class="MT_Team TM2"><div class="TM_Name">Team F</div></div>
          </div>
        </div></body></html>"#;

        let cards = RecordingCardCapture {
            fail_on: Some(1),
            ..RecordingCardCapture::default()
        };
        let attempted = cards.attempted.clone();
        let saved = cards.saved.clone();

        let report = scraper(
            config(),
            StaticRenderer::serving(THREE_CARDS),
            StaticRenderer::failing(),
            CountingCapture::default(),
        )
        .with_card_capture(Box::new(cards))
        .scrape_on(date())
        .await
        .unwrap();

        assert_eq!(*attempted.lock().unwrap(), vec![0, 1, 2]);
        let saved = saved.lock().unwrap();
        assert_eq!(saved.len(), 2);
        assert!(saved[0].contains("Team A"));
        assert!(saved[1].contains("Team E"));

        assert_eq!(report.origin, FeedOrigin::Strategy("mt-team"));
        let homes: Vec<_> = report.feed.matches.iter().map(|m| m.home.as_str()).collect();
        assert_eq!(homes, vec!["Team A", "Team C", "Team E"]);
    }

    #[tokio::test]
    async fn zero_match_captures_once_and_uses_fallback() {
        let captures = CountingCapture::default();
        let capture_calls = captures.calls.clone();

        let report = scraper(
            config(),
            StaticRenderer::serving("<html><body><p>Maintenance</p></body></html>"),
            StaticRenderer::serving(FALLBACK),
            captures,
        )
        .scrape_on(date())
        .await
        .unwrap();

        assert_eq!(capture_calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.origin, FeedOrigin::Fallback);
        assert_eq!(
            report.feed.source_url,
            "https://fallback.example.com/match-center"
        );
        assert_eq!(report.feed.matches.len(), 1);

        let record = &report.feed.matches[0];
        assert_eq!(record.competition.as_deref(), Some("Premier League"));
        assert_eq!(record.time_local, "03:30 م");
        assert_eq!(record.status, MatchStatus::NotStarted);
        assert_eq!(record.source, FALLBACK_SOURCE);
        assert_eq!(
            record.match_url.as_deref(),
            Some("https://fallback.example.com/match/77")
        );
    }

    #[tokio::test]
    async fn zero_match_everywhere_yields_empty_feed() {
        let captures = CountingCapture {
            fail: true,
            ..CountingCapture::default()
        };
        let capture_calls = captures.calls.clone();

        let report = scraper(
            config(),
            StaticRenderer::serving("<html><body></body></html>"),
            StaticRenderer::failing(),
            captures,
        )
        .scrape_on(date())
        .await
        .unwrap();

        assert_eq!(capture_calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.origin, FeedOrigin::Empty);
        assert!(report.feed.matches.is_empty());

        let json = serde_json::to_value(&report.feed).unwrap();
        assert_eq!(json["matches"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn render_failure_is_fatal_by_default() {
        let result = scraper(
            config(),
            StaticRenderer::failing(),
            StaticRenderer::serving(FALLBACK),
            CountingCapture::default(),
        )
        .scrape_on(date())
        .await;

        assert!(matches!(result, Err(MatchdayError::Render { .. })));
    }

    #[tokio::test]
    async fn tolerated_render_failure_goes_to_fallback_without_capture() {
        let captures = CountingCapture::default();
        let capture_calls = captures.calls.clone();
        let config = ScrapeConfig {
            tolerate_render_errors: true,
            ..config()
        };

        let report = scraper(
            config,
            StaticRenderer::failing(),
            StaticRenderer::serving(FALLBACK),
            captures,
        )
        .scrape_on(date())
        .await
        .unwrap();

        assert_eq!(capture_calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.origin, FeedOrigin::Fallback);
        assert_eq!(report.feed.matches.len(), 1);
    }

    #[tokio::test]
    async fn cards_without_names_count_as_zero_result() {
        let html = r#"<html><body><div class="card">
            <div class="MT_Team TM1"><div class="TM_Name"> </div></div>
            <div class="MT_Data"></div>
            <div class="MT_Team TM2"><div class="TM_Name">Team B</div></div>
        </div></body></html>"#;
        let captures = CountingCapture::default();
        let capture_calls = captures.calls.clone();

        let report = scraper(
            config(),
            StaticRenderer::serving(html),
            StaticRenderer::serving("<html><body></body></html>"),
            captures,
        )
        .scrape_on(date())
        .await
        .unwrap();

        assert_eq!(capture_calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.origin, FeedOrigin::Empty);
    }
}
