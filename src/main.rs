use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use matchday_scraper::observability::{init_logging, LogFormat};
use matchday_scraper::output::write_feed;
use matchday_scraper::{MatchFeed, MatchScraper, ResultTextMode, ScrapeConfig};

/// Scrape today's football fixtures into a JSON feed.
///
/// Settings default to the built-in values, then the environment
/// (`FORCE_URL`, `FALLBACK_URL`, `MATCHDAY_OUTPUT_DIR`,
/// `SUPPRESS_RESULT_TEXT`, `MATCHDAY_CARD_DIR`), then these flags.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Arguments {
    /// Listing page to scrape.
    #[arg(long)]
    url: Option<String>,

    /// Simpler page read when the listing yields no cards.
    #[arg(long)]
    fallback_url: Option<String>,

    /// Directory receiving today.json and debug artifacts.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write an empty result_text for every match.
    #[arg(long)]
    suppress_result_text: bool,

    /// Continue to the fallback page when the listing cannot be loaded.
    #[arg(long)]
    tolerate_render_errors: bool,

    /// Save the markup of every matched card into this directory.
    #[arg(long)]
    card_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Arguments {
    fn into_config(self, mut config: ScrapeConfig) -> ScrapeConfig {
        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(url) = self.fallback_url {
            config.fallback_url = url;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if self.suppress_result_text {
            config.result_text = ResultTextMode::Suppress;
        }
        config.tolerate_render_errors |= self.tolerate_render_errors;
        if let Some(dir) = self.card_dir {
            config.card_capture_dir = Some(dir);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Arguments::parse();
    init_logging(args.log_format, "info")?;

    let config = args.into_config(ScrapeConfig::from_env());
    let feed_path = config.feed_path();
    let date = config.today();

    let scraper = MatchScraper::new(config.clone())?;
    match scraper.scrape_on(date).await {
        Ok(report) => {
            write_feed(&feed_path, &report.feed).await?;
            println!(
                "{} matches via {} -> {}",
                report.feed.matches.len(),
                report.origin,
                feed_path.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "scrape failed");
            let empty = MatchFeed::empty(date, config.url.as_str());
            if let Err(write_error) = write_feed(&feed_path, &empty).await {
                error!(error = %write_error, "could not write empty feed");
            } else {
                info!(path = %feed_path.display(), "wrote empty feed after failure");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment() {
        let args = Arguments::parse_from([
            "matchday-scraper",
            "--url",
            "https://example.com/today",
            "--output-dir",
            "/tmp/out",
            "--suppress-result-text",
            "--card-dir",
            "shots",
            "--log-format",
            "json",
        ]);
        assert_eq!(args.log_format, LogFormat::Json);

        let base = ScrapeConfig {
            fallback_url: "https://fallback.example.com/".to_string(),
            ..ScrapeConfig::default()
        };
        let config = args.into_config(base);
        assert_eq!(config.url, "https://example.com/today");
        assert_eq!(config.fallback_url, "https://fallback.example.com/");
        assert_eq!(config.feed_path(), PathBuf::from("/tmp/out/today.json"));
        assert_eq!(config.result_text, ResultTextMode::Suppress);
        assert!(!config.tolerate_render_errors);
        assert_eq!(config.card_capture_dir, Some(PathBuf::from("shots")));
    }

    #[test]
    fn no_flags_keep_config() {
        let args = Arguments::parse_from(["matchday-scraper"]);
        assert_eq!(args.into_config(ScrapeConfig::default()), ScrapeConfig::default());
    }
}
