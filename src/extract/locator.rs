use std::collections::HashSet;
use std::iter;
use std::ops::RangeInclusive;

use ::scraper::{ElementRef, Selector};
use tracing::trace;

/// Predicate deciding whether a subtree is one complete match card.
pub(crate) struct CardRule {
    requirements: Vec<(Selector, RangeInclusive<usize>)>,
}

impl CardRule {
    pub(crate) fn new(requirements: Vec<(Selector, RangeInclusive<usize>)>) -> Self {
        Self { requirements }
    }

    pub(crate) fn is_satisfied_by(&self, element: ElementRef) -> bool {
        self.requirements
            .iter()
            .all(|(selector, bounds)| bounds.contains(&bounded_count(element, selector, bounds)))
    }

    /// Whether `element` holds more of some marker than one card may. Every
    /// ancestor of such an element does too.
    pub(crate) fn is_exceeded_by(&self, element: ElementRef) -> bool {
        self.requirements
            .iter()
            .any(|(selector, bounds)| bounded_count(element, selector, bounds) > *bounds.end())
    }
}

/// Matches of `selector` under `element`, counted only as far as needed to
/// compare against `bounds`.
fn bounded_count(element: ElementRef, selector: &Selector, bounds: &RangeInclusive<usize>) -> usize {
    let limit = bounds.end().checked_add(1).unwrap_or(*bounds.start());
    element.select(selector).take(limit).count()
}

/// Walk from `anchor` up to (but excluding) `<body>` and return the first
/// element satisfying `rule`. The walk gives up at the first element that
/// already spans more than one card.
pub(crate) fn find_card_root<'a>(anchor: ElementRef<'a>, rule: &CardRule) -> Option<ElementRef<'a>> {
    iter::once(anchor)
        .chain(anchor.ancestors().filter_map(ElementRef::wrap))
        .take_while(|e| !matches!(e.value().name(), "body" | "html"))
        .take_while(|e| !rule.is_exceeded_by(*e))
        .find(|e| rule.is_satisfied_by(*e))
}

/// Distinct card roots for `anchors`, ordered by the first anchor that
/// reached each one.
pub(crate) fn locate_card_roots<'a>(
    anchors: Vec<ElementRef<'a>>,
    rule: &CardRule,
) -> Vec<ElementRef<'a>> {
    let mut seen = HashSet::new();
    let mut roots = Vec::new();
    for anchor in anchors {
        match find_card_root(anchor, rule) {
            Some(root) => {
                if seen.insert(root.id()) {
                    roots.push(root);
                }
            }
            None => trace!(
                tag = anchor.value().name(),
                "anchor has no complete card ancestor"
            ),
        }
    }
    roots
}
