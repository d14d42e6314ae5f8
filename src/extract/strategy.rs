//! Declarative extraction strategies and the ordered chain that picks one.
//!
//! Each [`Strategy`] describes one known shape of the listing markup: which
//! elements anchor a card, what a complete card must contain, and which exact
//! selectors (if any) to try for each field before the heuristic pickers run.
//! The chain tries strategies newest markup first and stops at the first one
//! that yields card roots.

use std::ops::RangeInclusive;

use ::scraper::{ElementRef, Html, Selector};
use regex::Regex;
use tracing::{debug, info};

use crate::error::Result;
use crate::extract::locator::{locate_card_roots, CardRule};
use crate::extract::parse_selector;

/// How a strategy finds the elements it walks upward from.
#[derive(Debug, Clone)]
pub enum Anchor {
    /// Elements matching a CSS selector list, usually the team-name markers.
    Markers(&'static str),
    /// Hyperlinks whose `href` matches a regular expression.
    DetailLinks { href_pattern: &'static str },
}

/// A selector that must match between `min` and `max` elements inside a
/// card. `max: None` means unbounded.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub selector: &'static str,
    pub min: usize,
    pub max: Option<usize>,
}

impl Requirement {
    pub const fn present(selector: &'static str) -> Self {
        Self::at_least(selector, 1)
    }

    pub const fn at_least(selector: &'static str, min: usize) -> Self {
        Self {
            selector,
            min,
            max: None,
        }
    }

    /// A marker that occurs once per card. An element holding two of them
    /// spans several cards and is never a card root.
    pub const fn exactly(selector: &'static str, count: usize) -> Self {
        Self {
            selector,
            min: count,
            max: Some(count),
        }
    }
}

/// How the home and away halves of a card are scoped.
#[derive(Debug, Clone)]
pub enum SideRule {
    /// First match of each selector inside the card.
    Selectors {
        home: &'static str,
        away: &'static str,
    },
    /// The outermost single-image blocks around the first and last image.
    ImageBlocks,
}

/// Exact selectors tried before the heuristic pickers. `None` means the
/// field is always picked heuristically.
#[derive(Debug, Clone, Default)]
pub struct FieldSelectors {
    pub name: Option<&'static str>,
    pub logo: Option<&'static str>,
    pub time: Option<&'static str>,
    pub status: Option<&'static str>,
    pub result: Option<&'static str>,
    pub info: Option<&'static str>,
    pub link: Option<&'static str>,
}

/// One way of reading the listing markup.
#[derive(Debug, Clone)]
pub struct Strategy {
    pub name: &'static str,
    pub anchor: Anchor,
    pub card_rule: Vec<Requirement>,
    pub sides: SideRule,
    pub fields: FieldSelectors,
}

impl Strategy {
    /// Current listing markup: `.MT_Team.TM1/.TM2` team boxes and an
    /// `.MT_Data` block holding time, result and status.
    pub fn mt_team() -> Self {
        Self {
            name: "mt-team",
            anchor: Anchor::Markers(".MT_Team.TM1 .TM_Name, .MT_Team.TM2 .TM_Name"),
            card_rule: vec![
                Requirement::exactly(".MT_Team.TM1 .TM_Name", 1),
                Requirement::exactly(".MT_Team.TM2 .TM_Name", 1),
                Requirement::present(".MT_Data"),
            ],
            sides: SideRule::Selectors {
                home: ".MT_Team.TM1",
                away: ".MT_Team.TM2",
            },
            fields: FieldSelectors {
                name: Some(".TM_Name"),
                logo: Some(".TM_Logo img"),
                time: Some(".MT_Data .MT_Time"),
                status: Some(".MT_Data .MT_Stat"),
                result: Some(".MT_Data .MT_Result"),
                info: Some(".MT_Info li span"),
                link: None,
            },
        }
    }

    /// Older widget markup with right/left team boxes around a timing block.
    pub fn match_container() -> Self {
        Self {
            name: "match-container",
            anchor: Anchor::Markers(".right-team .team-name, .left-team .team-name"),
            card_rule: vec![
                Requirement::exactly(".right-team", 1),
                Requirement::exactly(".left-team", 1),
                Requirement::present(".match-timing"),
            ],
            sides: SideRule::Selectors {
                home: ".right-team",
                away: ".left-team",
            },
            fields: FieldSelectors {
                name: Some(".team-name"),
                logo: Some(".team-logo img"),
                time: None,
                status: None,
                result: Some(".match-timing .result"),
                info: Some(".match-info li"),
                link: None,
            },
        }
    }

    /// Loosest reading: any link to a match detail page whose surrounding
    /// block shows two crests.
    pub fn detail_link() -> Self {
        Self {
            name: "detail-link",
            anchor: Anchor::DetailLinks {
                href_pattern: r"(?i)/match(?:es)?/[^/?#]+",
            },
            card_rule: vec![Requirement::at_least("img", 2)],
            sides: SideRule::ImageBlocks,
            fields: FieldSelectors::default(),
        }
    }

    pub fn compile(&self) -> Result<CompiledStrategy> {
        let anchor = match &self.anchor {
            Anchor::Markers(selector) => CompiledAnchor::Markers(parse_selector(selector)?),
            Anchor::DetailLinks { href_pattern } => CompiledAnchor::DetailLinks {
                links: parse_selector("a[href]")?,
                pattern: Regex::new(href_pattern)?,
            },
        };

        let card_rule = CardRule::new(
            self.card_rule
                .iter()
                .map(|r| -> Result<(Selector, RangeInclusive<usize>)> {
                    Ok((parse_selector(r.selector)?, r.min..=r.max.unwrap_or(usize::MAX)))
                })
                .collect::<Result<Vec<_>>>()?,
        );

        let sides = match &self.sides {
            SideRule::Selectors { home, away } => CompiledSides::Selectors {
                home: parse_selector(home)?,
                away: parse_selector(away)?,
            },
            SideRule::ImageBlocks => CompiledSides::ImageBlocks,
        };

        let optional = |s: Option<&'static str>| s.map(parse_selector).transpose();
        let fields = CompiledFields {
            name: optional(self.fields.name)?,
            logo: optional(self.fields.logo)?,
            time: optional(self.fields.time)?,
            status: optional(self.fields.status)?,
            result: optional(self.fields.result)?,
            info: optional(self.fields.info)?,
            link: optional(self.fields.link)?,
        };

        Ok(CompiledStrategy {
            name: self.name,
            anchor,
            card_rule,
            sides,
            fields,
        })
    }
}

pub(crate) enum CompiledAnchor {
    Markers(Selector),
    DetailLinks { links: Selector, pattern: Regex },
}

impl CompiledAnchor {
    /// Anchor elements in document order.
    pub(crate) fn elements<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        match self {
            CompiledAnchor::Markers(selector) => document.select(selector).collect(),
            CompiledAnchor::DetailLinks { links, pattern } => document
                .select(links)
                .filter(|a| a.value().attr("href").is_some_and(|h| pattern.is_match(h)))
                .collect(),
        }
    }
}

pub(crate) enum CompiledSides {
    Selectors { home: Selector, away: Selector },
    ImageBlocks,
}

pub(crate) struct CompiledFields {
    pub(crate) name: Option<Selector>,
    pub(crate) logo: Option<Selector>,
    pub(crate) time: Option<Selector>,
    pub(crate) status: Option<Selector>,
    pub(crate) result: Option<Selector>,
    pub(crate) info: Option<Selector>,
    pub(crate) link: Option<Selector>,
}

/// A strategy with its selectors and patterns parsed.
pub struct CompiledStrategy {
    pub name: &'static str,
    pub(crate) anchor: CompiledAnchor,
    pub(crate) card_rule: CardRule,
    pub(crate) sides: CompiledSides,
    pub(crate) fields: CompiledFields,
}

impl CompiledStrategy {
    /// Number of primary markers present in the document.
    pub fn marker_count(&self, document: &Html) -> usize {
        self.anchor.elements(document).len()
    }

    pub fn card_roots<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        locate_card_roots(self.anchor.elements(document), &self.card_rule)
    }
}

/// The strategy that won, with the card roots it found.
pub struct ChainMatch<'s, 'd> {
    pub strategy: &'s CompiledStrategy,
    /// Zero-based position of the strategy in the chain.
    pub position: usize,
    pub roots: Vec<ElementRef<'d>>,
}

/// Ordered strategies, newest markup first.
pub struct StrategyChain {
    strategies: Vec<CompiledStrategy>,
}

impl StrategyChain {
    pub fn new(strategies: &[Strategy]) -> Result<Self> {
        let strategies = strategies
            .iter()
            .map(Strategy::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { strategies })
    }

    pub fn default_chain() -> Result<Self> {
        Self::new(&[
            Strategy::mt_team(),
            Strategy::match_container(),
            Strategy::detail_link(),
        ])
    }

    pub fn strategies(&self) -> &[CompiledStrategy] {
        &self.strategies
    }

    /// Try every strategy in order and return the first that yields at
    /// least one card root. `None` means no strategy matched.
    pub fn select<'s, 'd>(&'s self, document: &'d Html) -> Option<ChainMatch<'s, 'd>> {
        for (position, strategy) in self.strategies.iter().enumerate() {
            let markers = strategy.marker_count(document);
            if markers == 0 {
                debug!(strategy = strategy.name, "no markers, trying next strategy");
                continue;
            }

            let roots = strategy.card_roots(document);
            if roots.is_empty() {
                debug!(
                    strategy = strategy.name,
                    markers, "markers present but no complete card, trying next strategy"
                );
                continue;
            }

            info!(
                strategy = strategy.name,
                markers,
                cards = roots.len(),
                "strategy matched"
            );
            return Some(ChainMatch {
                strategy,
                position,
                roots,
            });
        }
        None
    }
}
