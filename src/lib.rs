//! Resilient extraction of football match cards from a live listing page.
//!
//! A [`MatchScraper`] renders the listing, runs an ordered [`StrategyChain`]
//! of markup readings over it, and assembles every complete card into a
//! [`MatchRecord`]. When nothing is found it writes debug artifacts and reads
//! a simpler fallback page instead.

mod client;
mod error;
mod model;

pub mod capture;
pub mod config;
pub mod extract;
pub mod observability;
pub mod output;
pub mod render;

pub use client::{FeedOrigin, MatchScraper, ScrapeReport};
pub use config::{ResultTextMode, ScrapeConfig};
pub use error::{MatchdayError, Result};
pub use extract::status::normalize_status;
pub use extract::strategy::{Strategy, StrategyChain};
pub use model::*;
