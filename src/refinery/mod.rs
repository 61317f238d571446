// * The Refinery (Listing Extraction Pipeline)
// * Raw directory-page HTML in, ordered and deduplicated listing records out.
// * Normalizer -> Segmenter -> {Extractor, Classifier} per block -> Assembler

pub mod assembler;
pub mod classifier;
pub mod extractor;
pub mod normalizer;
pub mod patterns;
pub mod record;
pub mod segmenter;

// * Re-exports for convenient access
pub use assembler::{dedup_key, PushOutcome, RecordAssembler};
pub use classifier::{Classifier, Lang};
pub use extractor::{title_case, ExtractedFields, FieldExtractor};
pub use normalizer::{normalize_fragment, normalize_html, to_lines};
pub use record::{response_headers, ErrorResponse, ListingRecord, PageContext, ScrapeResponse};
pub use segmenter::{
    segmenter_for, AutoSegmenter, BlockKind, CandidateBlock, CardSegmenter, GapSegmenter, Segmenter,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ExtractionConfig, SegmentMode};
use crate::ops::telemetry;

/// Records plus statistics from one extraction pass
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RefineryResult {
    pub records: Vec<ListingRecord>,
    pub stats: RefineryStats,
}

impl RefineryResult {
    /// Wraps the records in the `{ "items": [...] }` envelope
    pub fn into_response(self) -> ScrapeResponse {
        ScrapeResponse::new(self.records)
    }
}

/// Processing statistics from one pass
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RefineryStats {
    pub mode: SegmentMode,
    pub blocks_found: usize,
    pub records_emitted: usize,
    pub duplicates_dropped: usize,
}

/// The listing extraction engine
///
/// Holds only immutable configuration and compiled patterns; every call to
/// [`Refinery::process`] keeps its state local, so one instance can serve
/// concurrent callers.
///
/// # Example
/// ```ignore
/// use listing_refinery::refinery::Refinery;
///
/// let refinery = Refinery::new();
/// let result = refinery.process(html, "https://directorio.mx/dap/filtracion3.html");
///
/// println!("Listings: {}", result.records.len());
/// println!("Duplicates dropped: {}", result.stats.duplicates_dropped);
/// ```
pub struct Refinery {
    config: ExtractionConfig,
    segmenter: Box<dyn Segmenter>,
    extractor: FieldExtractor,
    classifier: Classifier,
}

impl Refinery {
    /// Creates a refinery with default configuration (auto segmentation)
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default())
    }

    pub fn with_config(config: ExtractionConfig) -> Self {
        Self {
            segmenter: segmenter_for(&config),
            extractor: FieldExtractor::with_config(config.clone()),
            classifier: Classifier::with_config(&config),
            config,
        }
    }

    /// Runs the full pipeline over `html` fetched from `url`
    ///
    /// # Pipeline Steps:
    /// 1. Segment the page into candidate blocks
    /// 2. Extract fields from each block
    /// 3. Classify language and fit per block
    /// 4. Assemble records, dropping repeated (name, first email) keys
    pub fn process(&self, html: &str, url: &str) -> RefineryResult {
        let mode = self.segmenter.mode();
        let page = PageContext {
            category: self.classifier.category(url),
            category_url: url.to_string(),
        };

        // * Step 1: Segment
        let blocks = self.segmenter.segment(html);
        debug!(mode = %mode, blocks = blocks.len(), "Segmented page");
        telemetry::record_blocks_segmented(mode.as_str(), blocks.len());

        // * Steps 2-4: Extract, classify, assemble
        let mut assembler = RecordAssembler::new();
        for block in &blocks {
            let fields = self.extractor.extract(block);
            let lang = self.classifier.lang(&block.text);
            let fit_hint = self.classifier.fit_hint(&fields.description, &block.text);
            assembler.push(ListingRecord::from_fields(fields, &page, lang, fit_hint));
        }

        let duplicates_dropped = assembler.duplicates();
        let records = assembler.finish();
        telemetry::record_page_processed(mode.as_str());

        info!(
            url = %url,
            category = %page.category,
            mode = %mode,
            blocks = blocks.len(),
            records = records.len(),
            duplicates = duplicates_dropped,
            "Extracted listings"
        );

        RefineryResult {
            stats: RefineryStats {
                mode,
                blocks_found: blocks.len(),
                records_emitted: records.len(),
                duplicates_dropped,
            },
            records,
        }
    }

    /// Runs the pipeline and returns only the records
    pub fn extract(&self, html: &str, url: &str) -> Vec<ListingRecord> {
        self.process(html, url).records
    }

    /// Returns the current configuration
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }
}

impl Default for Refinery {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to extract listings with default settings
pub fn extract_listings(html: &str, url: &str) -> Vec<ListingRecord> {
    Refinery::new().extract(html, url)
}
