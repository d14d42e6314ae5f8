pub mod assemble;
pub mod fallback;
pub mod locator;
pub mod pickers;
pub mod status;
pub mod strategy;

use ::scraper::node::Node;
use ::scraper::{ElementRef, Selector};
use itertools::Itertools;
use tracing::debug;
use url::Url;

use crate::error::{MatchdayError, Result};

/// Tags whose text never counts as visible card text.
const INVISIBLE_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Fetch a URL and return the final (post-redirect) URL with the body text.
pub(crate) async fn get_document(client: &reqwest::Client, url: &str) -> Result<(Url, String)> {
    debug!(url, "fetching page");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MatchdayError::Http {
            url: url.to_owned(),
            source: e,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(MatchdayError::UnexpectedStatus {
            url: url.to_owned(),
            status,
        });
    }

    let final_url = response.url().clone();
    let body = response.text().await.map_err(|e| MatchdayError::ResponseBody {
        url: url.to_owned(),
        source: e,
    })?;

    Ok((final_url, body))
}

/// Parse a selector, mapping the error into the crate error type.
pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(MatchdayError::from)
}

/// Trim and collapse runs of whitespace into single spaces.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Visible, non-empty text nodes under `element`, in document order.
pub(crate) fn text_nodes(element: ElementRef) -> Vec<String> {
    element
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .parent()
                    .and_then(ElementRef::wrap)
                    .is_some_and(|p| INVISIBLE_TAGS.iter().any(|tag| *tag == p.value().name()));
                (!hidden).then(|| collapse_whitespace(text))
            }
            _ => None,
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// All visible text under `element` joined by single spaces.
pub(crate) fn visible_text(element: ElementRef) -> String {
    text_nodes(element).join(" ")
}

/// Text of the first element matching `selector` inside `element` that has
/// any visible text. Returns an empty string if nothing matches.
pub(crate) fn select_text(element: ElementRef, selector: &Selector) -> String {
    element
        .select(selector)
        .map(visible_text)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

/// Resolve a possibly relative URL against the page base.
///
/// Values that cannot be joined are returned trimmed but otherwise untouched.
pub(crate) fn resolve_url(base: &Url, raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    base.join(raw)
        .map(String::from)
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::scraper::Html;

    #[test]
    fn text_nodes_skip_scripts_and_collapse_whitespace() {
        let html = Html::parse_fragment(
            "<div><span>  Team\n   A </span><script>var x = 1;</script><b>FC</b></div>",
        );
        let div = html.select(&parse_selector("div").unwrap()).next().unwrap();
        assert_eq!(text_nodes(div), vec!["Team A", "FC"]);
        assert_eq!(visible_text(div), "Team A FC");
    }

    #[test]
    fn select_text_skips_empty_matches() {
        let html = Html::parse_fragment("<div><p class='x'> </p><p class='x'>second</p></div>");
        let div = html.select(&parse_selector("div").unwrap()).next().unwrap();
        assert_eq!(select_text(div, &parse_selector("p.x").unwrap()), "second");
        assert_eq!(select_text(div, &parse_selector("p.missing").unwrap()), "");
    }

    #[test]
    fn resolve_url_joins_relative_paths() {
        let base = Url::parse("https://example.com/matches-today/").unwrap();
        assert_eq!(
            resolve_url(&base, "/img/a.png"),
            "https://example.com/img/a.png"
        );
        assert_eq!(
            resolve_url(&base, "//cdn.example.com/b.png"),
            "https://cdn.example.com/b.png"
        );
        assert_eq!(
            resolve_url(&base, "https://other.org/c.png"),
            "https://other.org/c.png"
        );
        assert_eq!(resolve_url(&base, "  "), "");
    }
}
