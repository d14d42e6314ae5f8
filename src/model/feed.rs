use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::MatchRecord;

/// The persisted output document for one scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFeed {
    /// Scrape-local calendar date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub source_url: String,
    pub matches: Vec<MatchRecord>,
}

impl MatchFeed {
    pub fn empty(date: NaiveDate, source_url: impl Into<String>) -> Self {
        Self {
            date,
            source_url: source_url.into(),
            matches: Vec::new(),
        }
    }
}
