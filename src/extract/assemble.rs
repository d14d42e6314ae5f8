use chrono::NaiveDate;
use tracing::debug;

use crate::config::ResultTextMode;
use crate::extract::status::normalize_status;
use crate::model::{MatchRecord, RawCard};

/// Characters of each team name kept in a record id.
///
/// Ids are not unique: two fixtures whose names share this prefix on the
/// same day collide.
pub const ID_NAME_PREFIX_CHARS: usize = 12;

/// Per-scrape settings applied to every record.
#[derive(Debug, Clone, Copy)]
pub struct AssembleContext<'a> {
    pub date: NaiveDate,
    pub source: &'a str,
    pub result_text: ResultTextMode,
}

/// Whether `value` is an inline `data:` URL rather than a real resource.
pub fn is_placeholder_url(value: &str) -> bool {
    value
        .trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Empty string for placeholder logos, the trimmed value otherwise.
pub fn clear_placeholder_logo(value: &str) -> String {
    if is_placeholder_url(value) {
        String::new()
    } else {
        value.trim().to_string()
    }
}

pub fn record_id(home: &str, away: &str, date: NaiveDate) -> String {
    let prefix = |name: &str| name.chars().take(ID_NAME_PREFIX_CHARS).collect::<String>();
    format!("{}-{}-{}", prefix(home), prefix(away), date.format("%Y-%m-%d"))
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Turn one picked card into a record, or `None` when a team name is missing.
pub fn assemble_record(card: RawCard, ctx: &AssembleContext) -> Option<MatchRecord> {
    let home = card.home.trim();
    let away = card.away.trim();
    if home.is_empty() || away.is_empty() {
        debug!(home, away, "dropping card without both team names");
        return None;
    }

    let status_text = card.status_text.trim().to_string();
    let result_text = match ctx.result_text {
        ResultTextMode::Extract => card.result_text.trim().to_string(),
        ResultTextMode::Suppress => String::new(),
    };

    Some(MatchRecord {
        id: record_id(home, away, ctx.date),
        home: home.to_string(),
        away: away.to_string(),
        home_logo: clear_placeholder_logo(&card.home_logo),
        away_logo: clear_placeholder_logo(&card.away_logo),
        time_local: card.time_local.trim().to_string(),
        status: normalize_status(&status_text),
        status_text,
        result_text,
        channel: optional(&card.channel),
        commentator: optional(&card.commentator),
        competition: optional(&card.competition),
        match_url: card.match_url.as_deref().and_then(optional),
        source: ctx.source.to_string(),
    })
}

/// Assemble cards in order, dropping invalid ones. Records with equal ids
/// are all kept.
pub fn assemble_records(
    cards: impl IntoIterator<Item = RawCard>,
    ctx: &AssembleContext,
) -> Vec<MatchRecord> {
    cards
        .into_iter()
        .filter_map(|card| assemble_record(card, ctx))
        .collect()
}
