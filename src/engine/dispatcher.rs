// * Scrape Dispatcher
// * Validates the caller's URL, performs the single page fetch and hands the
// * body to the refinery. Fetch errors abort with no partial results.

use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

use crate::config::ExtractionConfig;
use crate::network::{PageFetcher, ScrapeError};
use crate::refinery::{Refinery, RefineryResult, ScrapeResponse};

// * Rejects a missing or blank URL before any work is done
pub fn validate_url(url: Option<&str>) -> Result<Url, ScrapeError> {
    let raw = url.map(str::trim).filter(|u| !u.is_empty()).ok_or(ScrapeError::MissingUrl)?;
    Url::parse(raw).map_err(|source| ScrapeError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

// * Reads a page saved to disk, lossily decoding non-UTF-8 bytes
pub fn read_html_file(path: impl AsRef<Path>) -> Result<String, ScrapeError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ScrapeError::ReadHtml {
        path: path.display().to_string(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// * Owns the fetch client and the extraction engine for one process
pub struct ScrapeDispatcher {
    fetcher: PageFetcher,
    refinery: Refinery,
}

impl ScrapeDispatcher {
    pub fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            fetcher: PageFetcher::new()?,
            refinery: Refinery::new(),
        })
    }

    pub fn with_config(config: ExtractionConfig, timeout: Duration) -> Result<Self, ScrapeError> {
        Ok(Self {
            fetcher: PageFetcher::with_timeout(timeout)?,
            refinery: Refinery::with_config(config),
        })
    }

    // * Fetches `url` and extracts its listings; the URL is echoed verbatim into each record
    #[instrument(skip(self))]
    pub async fn scrape(&self, url: Option<&str>) -> Result<ScrapeResponse, ScrapeError> {
        Ok(self.scrape_with_stats(url).await?.into_response())
    }

    pub async fn scrape_with_stats(&self, url: Option<&str>) -> Result<RefineryResult, ScrapeError> {
        let parsed = validate_url(url)?;
        let source_url = url.map(str::trim).unwrap_or_default();

        let html = self.fetcher.fetch(parsed.as_str()).await?;
        let result = self.refinery.process(&html, source_url);

        info!(url = %source_url, items = result.records.len(), "Scrape complete");
        Ok(result)
    }

    // * Extracts listings from HTML that was already retrieved (no fetch)
    pub fn scrape_html(&self, html: &str, url: &str) -> ScrapeResponse {
        self.refinery.process(html, url).into_response()
    }

    // * Extracts listings from a page saved at `path`. The URL is validated like a
    // * fetch would be but recorded as the caller typed it.
    pub fn scrape_saved(&self, path: impl AsRef<Path>, url: Option<&str>) -> Result<ScrapeResponse, ScrapeError> {
        validate_url(url)?;
        let source_url = url.map(str::trim).unwrap_or_default();
        let path = path.as_ref();

        let html = read_html_file(path)?;
        info!(path = %path.display(), url = %source_url, "Extracting from saved page");
        Ok(self.scrape_html(&html, source_url))
    }

    pub fn refinery(&self) -> &Refinery {
        &self.refinery
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url() {
        assert!(matches!(validate_url(None), Err(ScrapeError::MissingUrl)));
        assert!(matches!(validate_url(Some("   ")), Err(ScrapeError::MissingUrl)));
    }

    #[test]
    fn test_relative_url_rejected() {
        let result = validate_url(Some("/dap/filtracion3.html"));
        assert!(matches!(result, Err(ScrapeError::InvalidUrl { .. })));
    }

    #[test]
    fn test_valid_url() {
        let url = validate_url(Some(" https://directorio.mx/dap/filtracion3.html ")).unwrap();
        assert_eq!(url.host_str(), Some("directorio.mx"));
    }

    #[test]
    fn test_missing_url_message() {
        assert_eq!(ScrapeError::MissingUrl.to_string(), "Missing ?url");
        assert!(ScrapeError::MissingUrl.is_caller_error());
    }

    #[test]
    fn test_read_missing_html_file() {
        let result = read_html_file("/nonexistent/page.html");
        assert!(matches!(result, Err(ScrapeError::ReadHtml { .. })));
    }

    #[tokio::test]
    async fn test_scrape_without_url_does_no_work() {
        let dispatcher = ScrapeDispatcher::new().unwrap();
        let result = dispatcher.scrape(None).await;
        assert!(matches!(result, Err(ScrapeError::MissingUrl)));
    }

    #[test]
    fn test_scrape_html_skips_fetch() {
        let dispatcher = ScrapeDispatcher::new().unwrap();
        let html = "<p>ACME WATER<br>Tel: 555-1234<br>Email: info@acme.com</p>";
        let response = dispatcher.scrape_html(html, "https://directorio.mx/dap/filtracion3.html");

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].company_name, "Acme Water");
        assert_eq!(response.items[0].category, "filtracion");
    }

    #[test]
    fn test_saved_page_keeps_url_verbatim() {
        let path = std::env::temp_dir().join(format!("listing-refinery-saved-{}.html", std::process::id()));
        std::fs::write(&path, "<p>ACME WATER<br>Tel: 555-1234<br>Email: info@acme.com</p>").unwrap();

        let dispatcher = ScrapeDispatcher::new().unwrap();
        let url = "https://Directorio.MX/dap/filtración2.html";
        let padded = format!("  {url} ");
        let response = dispatcher.scrape_saved(&path, Some(padded.as_str())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].category_url, url);
        assert_eq!(response.items[0].category, "filtración");
    }

    #[test]
    fn test_saved_page_needs_url() {
        let dispatcher = ScrapeDispatcher::new().unwrap();
        let result = dispatcher.scrape_saved("/nonexistent/page.html", None);
        assert!(matches!(result, Err(ScrapeError::MissingUrl)));
    }
}
