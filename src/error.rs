use ::scraper::error::SelectorErrorKind;
use std::path::PathBuf;

/// All errors that can occur while rendering, extracting or persisting a feed.
#[derive(thiserror::Error, Debug)]
pub enum MatchdayError {
    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(reqwest::Error),

    /// Server returned a non-success HTTP status code.
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Failed to read the response body as text.
    #[error("failed to read response body from {url}: {source}")]
    ResponseBody {
        url: String,
        source: reqwest::Error,
    },

    /// The rendering collaborator could not produce a page.
    #[error("rendering {url} failed: {message}")]
    Render { url: String, message: String },

    /// A CSS selector string could not be parsed.
    #[error("invalid CSS selector: {0}")]
    Selector(String),

    /// A strategy or fallback pattern is not a valid regular expression.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A configured URL could not be parsed.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Reading or writing a local file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The feed could not be serialized.
    #[error("failed to serialize feed: {0}")]
    Json(#[from] serde_json::Error),
}

impl MatchdayError {
    /// Whether this error came from the page acquisition side rather than
    /// from extraction or local I/O.
    pub fn is_render_failure(&self) -> bool {
        matches!(
            self,
            MatchdayError::Http { .. }
                | MatchdayError::UnexpectedStatus { .. }
                | MatchdayError::ResponseBody { .. }
                | MatchdayError::Render { .. }
        )
    }
}

impl<'a> From<SelectorErrorKind<'a>> for MatchdayError {
    fn from(err: SelectorErrorKind<'a>) -> Self {
        MatchdayError::Selector(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MatchdayError>;
