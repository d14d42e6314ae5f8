//! Link-text extractor for the structurally simpler fallback page.
//!
//! The fallback page groups fixtures under competition headings that are
//! themselves links. Walking every link in document order, a heading link
//! sets the competition for the fixture links that follow it, and fixture
//! links read `<home> <HH:MM> <AM/PM> <away>`. The page carries no live state,
//! crests or broadcast details.

use std::sync::LazyLock;

use ::scraper::{ElementRef, Html, Selector};
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::extract::{resolve_url, visible_text};
use crate::model::{MatchStatus, RawCard};

/// Source tag for records produced here.
pub const FALLBACK_SOURCE: &str = "fallback-links";

static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

static COMPETITION_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)/(?:leagues?|competitions?|tournaments?|championships?)(?:/|$)",
    )
    .unwrap()
});

static FIXTURE_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<home>.+?)\s+(?P<time>\d{1,2}:\d{2})\s*(?P<meridiem>AM|PM|am|pm|ص|م)\s+(?P<away>.+)$",
    )
    .unwrap()
});

/// Accumulator threaded through the link walk.
#[derive(Debug, Default)]
struct LinkWalk {
    competition: Option<String>,
    cards: Vec<RawCard>,
}

impl LinkWalk {
    fn visit(mut self, link: ElementRef, base: &Url) -> Self {
        let href = link.value().attr("href").unwrap_or_default();
        let text = visible_text(link);

        if is_competition_link(href, base) {
            if !text.is_empty() {
                debug!(competition = %text, "competition heading");
                self.competition = Some(text);
            }
            return self;
        }

        if let Some(mut card) = parse_fixture_text(&text) {
            card.competition = self.competition.clone().unwrap_or_default();
            card.match_url = (!href.trim().is_empty()).then(|| resolve_url(base, href));
            self.cards.push(card);
        }
        self
    }
}

fn is_competition_link(href: &str, base: &Url) -> bool {
    let href = href.trim();
    if href.is_empty() {
        return false;
    }
    match base.join(href) {
        Ok(url) => COMPETITION_PATH.is_match(url.path()),
        Err(_) => COMPETITION_PATH.is_match(href),
    }
}

/// Parse `<home> <HH:MM> <AM/PM> <away>` link text into a not-started card.
pub fn parse_fixture_text(text: &str) -> Option<RawCard> {
    let captures = FIXTURE_TEXT.captures(text.trim())?;
    Some(RawCard {
        home: captures["home"].trim().to_string(),
        away: captures["away"].trim().to_string(),
        time_local: format!("{} {}", &captures["time"], &captures["meridiem"]),
        status_text: MatchStatus::NotStarted.canonical_phrase().to_string(),
        ..RawCard::default()
    })
}

/// Cards from every fixture link in `document`, in document order.
pub fn extract_fallback_cards(document: &Html, base: &Url) -> Vec<RawCard> {
    document
        .select(&LINK)
        .fold(LinkWalk::default(), |walk, link| walk.visit(link, base))
        .cards
}
