//! Diagnostics written when a scrape finds no cards.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{MatchdayError, Result};
use crate::render::RenderedPage;

pub const DEBUG_HTML_FILE: &str = "debug_page.html";
pub const DEBUG_PNG_FILE: &str = "debug_page.png";

/// Persists a snapshot of a page that yielded no records.
#[async_trait]
pub trait DebugCapture: Send + Sync {
    /// Returns the paths written.
    async fn capture(&self, page: &RenderedPage) -> Result<Vec<PathBuf>>;
}

/// Writes fixed-name markup and screenshot files into a directory,
/// replacing the previous run's files.
pub struct FsDebugCapture {
    dir: PathBuf,
}

impl FsDebugCapture {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| MatchdayError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[async_trait]
impl DebugCapture for FsDebugCapture {
    async fn capture(&self, page: &RenderedPage) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| MatchdayError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let mut written = Vec::with_capacity(2);

        let html_path = self.dir.join(DEBUG_HTML_FILE);
        write_file(&html_path, page.html.as_bytes()).await?;
        info!(path = %html_path.display(), "wrote debug markup");
        written.push(html_path);

        match &page.screenshot_png {
            Some(png) => {
                let png_path = self.dir.join(DEBUG_PNG_FILE);
                write_file(&png_path, png).await?;
                info!(path = %png_path.display(), "wrote debug screenshot");
                written.push(png_path);
            }
            None => {
                debug!(url = %page.url, "renderer produced no screenshot");
                remove_stale(&self.dir.join(DEBUG_PNG_FILE)).await?;
            }
        }

        Ok(written)
    }
}

/// Delete a previous run's artifact so it is not mistaken for this run's.
async fn remove_stale(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale artifact");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(MatchdayError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// One card root as seen by the page that produced it.
#[derive(Debug, Clone)]
pub struct CardSnapshot {
    pub date: NaiveDate,
    /// Zero-based position among the matched strategy's card roots.
    pub index: usize,
    /// Outer markup of the card root.
    pub html: String,
}

impl CardSnapshot {
    /// `YYYY-MM-DD_matchN`, numbering cards from 1.
    pub fn file_stem(&self) -> String {
        format!("{}_match{}", self.date.format("%Y-%m-%d"), self.index + 1)
    }
}

/// Optional per-card side effect run for every card root of a matched
/// strategy. A failure affects only that card.
#[async_trait]
pub trait CardCapture: Send + Sync {
    /// Returns the path written.
    async fn capture_card(&self, card: &CardSnapshot) -> Result<PathBuf>;
}

/// Writes each card's markup to `<dir>/<YYYY-MM-DD>_match<N>.html`.
pub struct FsCardCapture {
    dir: PathBuf,
}

impl FsCardCapture {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CardCapture for FsCardCapture {
    async fn capture_card(&self, card: &CardSnapshot) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| MatchdayError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(format!("{}.html", card.file_stem()));
        write_file(&path, card.html.as_bytes()).await?;
        debug!(path = %path.display(), "saved card");
        Ok(path)
    }
}
