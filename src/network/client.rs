use crate::config::constants::{FETCH_TIMEOUT_SECS, USER_AGENT};
use crate::network::errors::ScrapeError;
use crate::ops::telemetry;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// * Content types accepted as a directory page body
const TEXT_CONTENT_TYPES: &[&str] = &["text/", "application/xhtml", "application/xml"];

// * Single-GET page client. No retries, no cookies, one fixed user agent.
pub struct PageFetcher {
    inner: Client,
}

impl PageFetcher {
    // * Initializes the client with the default timeout.
    pub fn new() -> Result<Self, ScrapeError> {
        Self::with_timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
    }

    // * @param timeout - Caller-imposed bound on the whole request
    pub fn with_timeout(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { inner: client })
    }

    // * Fetches a URL and returns the body as text.
    pub async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let started = Instant::now();
        let result = self.fetch_inner(url).await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(body) => {
                debug!(url = %url, bytes = body.len(), elapsed, "Fetched page");
                telemetry::record_fetch("success", elapsed);
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch failed");
                telemetry::record_fetch(outcome_label(e), elapsed);
            }
        }

        result
    }

    async fn fetch_inner(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self.inner.get(url).send().await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // * A missing header is accepted; servers for static directories often omit it
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_lowercase);
        if let Some(content_type) = content_type {
            if !is_text_content_type(&content_type) {
                return Err(ScrapeError::NonTextResponse { content_type });
            }
        }

        Ok(resp.text().await?)
    }
}

fn is_text_content_type(content_type: &str) -> bool {
    TEXT_CONTENT_TYPES
        .iter()
        .any(|prefix| content_type.trim_start().starts_with(prefix))
}

fn outcome_label(error: &ScrapeError) -> &'static str {
    match error {
        ScrapeError::UnexpectedStatus { .. } => "status",
        ScrapeError::NonTextResponse { .. } => "content_type",
        _ => "http_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_types() {
        assert!(is_text_content_type("text/html; charset=iso-8859-1"));
        assert!(is_text_content_type("application/xhtml+xml"));
        assert!(is_text_content_type("text/plain"));
        assert!(!is_text_content_type("application/pdf"));
        assert!(!is_text_content_type("image/png"));
    }

    #[test]
    fn test_outcome_labels() {
        let status = ScrapeError::UnexpectedStatus {
            status: 404,
            url: "http://x".to_string(),
        };
        assert_eq!(outcome_label(&status), "status");
        let content = ScrapeError::NonTextResponse {
            content_type: "image/png".to_string(),
        };
        assert_eq!(outcome_label(&content), "content_type");
    }

    #[test]
    fn test_client_builds() {
        assert!(PageFetcher::new().is_ok());
    }
}
