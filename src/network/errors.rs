use thiserror::Error;

// * Unified Error type for the fetch and scrape layer.
// * Extraction itself never errors; only input validation and the fetch can.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Missing ?url")]
    MissingUrl,

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Expected an HTML or text response, got {content_type}")]
    NonTextResponse { content_type: String },

    #[error("Failed to read HTML file {path}: {source}")]
    ReadHtml {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ScrapeError {
    /// Caller errors are rejected before any work; everything else is a fetch failure
    pub fn is_caller_error(&self) -> bool {
        matches!(self, ScrapeError::MissingUrl | ScrapeError::InvalidUrl { .. })
    }
}
