//! Best-effort field pickers scoped to a single card.
//!
//! Every picker tries the strategy's exact selector first and falls back to
//! a heuristic over the card's text nodes. None of them fail: a field that
//! cannot be found comes back empty.

use std::iter;
use std::sync::LazyLock;

use ::scraper::{ElementRef, Selector};
use itertools::Itertools;
use regex::Regex;
use url::Url;

use crate::extract::assemble::is_placeholder_url;
use crate::extract::status::contains_status_phrase;
use crate::extract::strategy::{CompiledSides, CompiledStrategy};
use crate::extract::{resolve_url, select_text, text_nodes, visible_text};
use crate::model::RawCard;

/// Attributes lazy loaders use to hold the real image URL, most specific first.
const DEFERRED_SRC_ATTRS: [&str; 4] = ["data-src", "data-lazy-src", "data-original", "data-lazy"];

/// Text nodes longer than this are paragraphs, not time labels.
const SHORT_TEXT_MAX_CHARS: usize = 24;

static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{1,2}:\d{2}").unwrap());

static KICKOFF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,2}:\d{2}(?:\s*(?:AM|PM|am|pm|ص|م)\b)?").unwrap()
});

static SCORE_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*[-–]\s*(\d+)$").unwrap());

static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static SPAN_LIKE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, b, strong, em").unwrap());

/// Run every picker the strategy binds over one card root.
pub fn pick_card(root: ElementRef, strategy: &CompiledStrategy, base: &Url) -> RawCard {
    let fields = &strategy.fields;
    let (home_side, away_side) = locate_sides(root, &strategy.sides);

    let name = |side: Option<ElementRef>| {
        side.map(|s| pick_name(s, fields.name.as_ref()))
            .unwrap_or_default()
    };
    let logo = |side: Option<ElementRef>| {
        side.map(|s| pick_logo(s, fields.logo.as_ref(), base))
            .unwrap_or_default()
    };

    let mut info = pick_info(root, fields.info.as_ref()).into_iter();

    RawCard {
        home: name(home_side),
        away: name(away_side),
        home_logo: logo(home_side),
        away_logo: logo(away_side),
        time_local: pick_time(root, fields.time.as_ref()),
        status_text: pick_status_text(root, fields.status.as_ref()),
        result_text: pick_result_text(root, fields.result.as_ref()),
        channel: info.next().unwrap_or_default(),
        commentator: info.next().unwrap_or_default(),
        competition: info.next().unwrap_or_default(),
        match_url: pick_link(root, fields.link.as_ref(), base),
    }
}

/// Home and away sub-roots of a card.
pub(crate) fn locate_sides<'a>(
    root: ElementRef<'a>,
    rule: &CompiledSides,
) -> (Option<ElementRef<'a>>, Option<ElementRef<'a>>) {
    match rule {
        CompiledSides::Selectors { home, away } => {
            (root.select(home).next(), root.select(away).next())
        }
        CompiledSides::ImageBlocks => {
            let images = root.select(&IMG).collect_vec();
            match (images.first(), images.last()) {
                (Some(first), Some(last)) if images.len() >= 2 => (
                    Some(image_block(*first, root)),
                    Some(image_block(*last, root)),
                ),
                _ => (None, None),
            }
        }
    }
}

/// The outermost ancestor of `image` below `root` that holds no other image.
fn image_block<'a>(image: ElementRef<'a>, root: ElementRef<'a>) -> ElementRef<'a> {
    let mut block = image;
    for ancestor in image.ancestors().filter_map(ElementRef::wrap) {
        if ancestor.id() == root.id() || ancestor.select(&IMG).nth(1).is_some() {
            break;
        }
        block = ancestor;
    }
    block
}

/// Team name: the exact marker, else the shortest text node that holds no
/// clock time and at least one letter. Scores, minutes and punctuation-only
/// nodes never qualify, not just pure digits. Team names are short; ad and
/// promo copy around them is not.
pub fn pick_name(side: ElementRef, exact: Option<&Selector>) -> String {
    if let Some(text) = exact
        .map(|sel| select_text(side, sel))
        .filter(|t| !t.is_empty())
    {
        return text;
    }

    text_nodes(side)
        .into_iter()
        .filter(|t| !TIME_OF_DAY.is_match(t))
        .filter(|t| t.chars().any(char::is_alphabetic))
        .min_by_key(|t| t.chars().count())
        .unwrap_or_default()
}

/// Crest URL for one side. Deferred-load attributes win over `src`, since
/// the eager attribute usually holds a placeholder until scrolled into view.
pub fn pick_logo(side: ElementRef, exact: Option<&Selector>, base: &Url) -> String {
    let image = exact
        .and_then(|sel| side.select(sel).next())
        .or_else(|| side.select(&IMG).next());
    let Some(image) = image else {
        return String::new();
    };

    DEFERRED_SRC_ATTRS
        .iter()
        .chain(iter::once(&"src"))
        .filter_map(|attr| image.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty() && !is_placeholder_url(v))
        .map(|v| resolve_url(base, v))
        .unwrap_or_default()
}

/// Kickoff time: the exact marker, else the first short text node holding a
/// clock time, else a scan of the whole card text.
pub fn pick_time(root: ElementRef, exact: Option<&Selector>) -> String {
    if let Some(text) = exact
        .map(|sel| select_text(root, sel))
        .filter(|t| !t.is_empty())
    {
        return text;
    }

    text_nodes(root)
        .iter()
        .filter(|t| t.chars().count() <= SHORT_TEXT_MAX_CHARS)
        .find_map(|t| KICKOFF.find(t).map(|m| m.as_str().to_string()))
        .or_else(|| {
            KICKOFF
                .find(&visible_text(root))
                .map(|m| m.as_str().to_string())
        })
        .unwrap_or_default()
}

/// Raw status phrase: the exact marker, else the shortest text node holding
/// a known status phrase, else the whole card text.
pub fn pick_status_text(root: ElementRef, exact: Option<&Selector>) -> String {
    if let Some(text) = exact
        .map(|sel| select_text(root, sel))
        .filter(|t| !t.is_empty())
    {
        return text;
    }

    text_nodes(root)
        .into_iter()
        .filter(|t| contains_status_phrase(t))
        .min_by_key(|t| t.chars().count())
        .unwrap_or_else(|| visible_text(root))
}

/// Score as `"N - M"`: the exact marker, else a span reading `N-M`, else
/// three consecutive spans `N`, `-`, `M`.
pub fn pick_result_text(root: ElementRef, exact: Option<&Selector>) -> String {
    if let Some(text) = exact
        .map(|sel| select_text(root, sel))
        .filter(|t| !t.is_empty())
    {
        return text;
    }

    let spans = root.select(&SPAN_LIKE).map(visible_text).collect_vec();

    let single = spans.iter().find_map(|t| {
        SCORE_PAIR
            .captures(t)
            .map(|c| format!("{} - {}", &c[1], &c[2]))
    });
    if let Some(score) = single {
        return score;
    }

    spans
        .iter()
        .tuple_windows()
        .find(|(a, dash, b)| is_integer(a) && matches!(dash.as_str(), "-" | "–") && is_integer(b))
        .map(|(a, _, b)| format!("{a} - {b}"))
        .unwrap_or_default()
}

/// Broadcast list items in document order: channel, commentator, competition.
pub fn pick_info(root: ElementRef, exact: Option<&Selector>) -> Vec<String> {
    let items = exact.unwrap_or(&*LIST_ITEM);
    root.select(items).map(visible_text).collect()
}

/// Absolute URL of the card's detail page, if it links to one.
pub fn pick_link(root: ElementRef, exact: Option<&Selector>, base: &Url) -> Option<String> {
    let href = if root.value().name() == "a" {
        root.value().attr("href")
    } else {
        None
    };
    href.or_else(|| {
        root.select(exact.unwrap_or(&*LINK))
            .filter_map(|a| a.value().attr("href"))
            .find(|h| is_navigable(h))
    })
    .filter(|h| is_navigable(h))
    .map(|h| resolve_url(base, h))
}

fn is_navigable(href: &str) -> bool {
    let href = href.trim();
    !href.is_empty() && !href.starts_with('#') && !href.to_ascii_lowercase().starts_with("javascript:")
}

fn is_integer(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}
