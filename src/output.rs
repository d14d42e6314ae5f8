use std::path::Path;

use tracing::info;

use crate::error::{MatchdayError, Result};
use crate::model::MatchFeed;

/// Serialize `feed` as indented UTF-8 JSON, replacing any existing file.
pub async fn write_feed(path: &Path, feed: &MatchFeed) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| MatchdayError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let mut json = serde_json::to_string_pretty(feed)?;
    json.push('\n');

    tokio::fs::write(path, json)
        .await
        .map_err(|source| MatchdayError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    info!(path = %path.display(), matches = feed.matches.len(), "wrote feed");
    Ok(())
}
