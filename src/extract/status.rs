//! Maps the free-text status the site prints on a card to a [`MatchStatus`].

use crate::model::MatchStatus;

const FINISHED_MARKERS: [&str; 2] = ["انتهت", "نتهت"];

/// Live indicators, half and period names, breaks, stoppage time, extra time
/// and penalty shoot-outs.
const LIVE_MARKERS: [&str; 9] = [
    "مباشر",
    "الشوط",
    "استراحة",
    "بين الشوطين",
    "بدل ضائع",
    "الوقت الإضافي",
    "الأشواط الإضافية",
    "ركلات الترجيح",
    "جارية",
];

const NOT_STARTED_NEGATION: &str = "لم";
const NOT_STARTED_VERBS: [&str; 2] = ["تبدأ", "تبدا"];

/// Normalize a raw status phrase.
///
/// Finished markers are tested before live markers since both can appear in
/// one string. Anything else, including an explicit "not started" phrase or
/// no text at all, is `NotStarted`.
pub fn normalize_status(raw: &str) -> MatchStatus {
    let text = raw.trim();
    if FINISHED_MARKERS.iter().any(|m| text.contains(m)) {
        MatchStatus::Finished
    } else if LIVE_MARKERS.iter().any(|m| text.contains(m)) {
        MatchStatus::Live
    } else {
        MatchStatus::NotStarted
    }
}

/// Whether `text` contains any phrase from the status vocabulary.
pub(crate) fn contains_status_phrase(text: &str) -> bool {
    FINISHED_MARKERS.iter().any(|m| text.contains(m))
        || LIVE_MARKERS.iter().any(|m| text.contains(m))
        || is_not_started_phrase(text)
}

fn is_not_started_phrase(text: &str) -> bool {
    text.contains(NOT_STARTED_NEGATION) && NOT_STARTED_VERBS.iter().any(|v| text.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn canonical_phrases_normalize_to_their_code() {
        for status in MatchStatus::iter() {
            let phrase = status.canonical_phrase();
            assert_eq!(normalize_status(phrase), status, "phrase {phrase}");
            assert!(contains_status_phrase(phrase));
        }
    }

    #[test]
    fn empty_and_unknown_text_is_not_started() {
        assert_eq!(normalize_status(""), MatchStatus::NotStarted);
        assert_eq!(normalize_status("   \n\t"), MatchStatus::NotStarted);
        assert_eq!(normalize_status("20:00"), MatchStatus::NotStarted);
        assert_eq!(normalize_status("something else"), MatchStatus::NotStarted);
    }

    #[test]
    fn live_variants() {
        for text in [
            "مباشر",
            "الشوط الأول",
            "الشوط الثاني",
            "استراحة",
            "بين الشوطين",
            "وقت بدل ضائع",
            "الوقت الإضافي",
            "ركلات الترجيح",
            "جارية الان",
        ] {
            assert_eq!(normalize_status(text), MatchStatus::Live, "{text}");
        }
    }

    #[test]
    fn finished_wins_over_live_markers() {
        assert_eq!(
            normalize_status("انتهت المباراة بعد ركلات الترجيح"),
            MatchStatus::Finished
        );
        assert_eq!(normalize_status("إنتهت"), MatchStatus::Finished);
    }

    #[test]
    fn not_started_variants() {
        assert_eq!(normalize_status("لم تبدأ بعد"), MatchStatus::NotStarted);
        assert_eq!(normalize_status("لم تبدا"), MatchStatus::NotStarted);
    }

    #[test]
    fn normalization_is_total_over_odd_input() {
        for text in ["😀", "لم", "FT", "0 - 0", "\u{200f}مباشر\u{200f}"] {
            let status = normalize_status(text);
            assert!(MatchStatus::iter().any(|s| s == status));
        }
        assert_eq!(normalize_status("\u{200f}مباشر\u{200f}"), MatchStatus::Live);
    }
}
