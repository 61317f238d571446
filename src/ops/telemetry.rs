// * Telemetry - JSON Logging and Prometheus Metrics
// * Structured logs go to stderr so stdout stays reserved for the JSON envelope.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramVec, TextEncoder,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    // * Pages run through the engine, by segment mode
    pub static ref PAGES_PROCESSED_TOTAL: CounterVec = register_counter_vec!(
        "listing_pages_processed_total",
        "Total pages processed by segment mode",
        &["mode"]
    ).expect("Invalid pages metric");

    // * Candidate blocks produced by the segmenter, by segment mode
    pub static ref BLOCKS_SEGMENTED_TOTAL: CounterVec = register_counter_vec!(
        "listing_blocks_segmented_total",
        "Total candidate blocks produced by segment mode",
        &["mode"]
    ).expect("Invalid blocks metric");

    pub static ref RECORDS_EMITTED_TOTAL: Counter = register_counter!(
        "listing_records_emitted_total",
        "Total listing records emitted"
    ).expect("Invalid records metric");

    pub static ref DUPLICATES_DROPPED_TOTAL: Counter = register_counter!(
        "listing_duplicates_dropped_total",
        "Total records dropped as duplicates"
    ).expect("Invalid duplicates metric");

    // * Page fetches by outcome
    pub static ref FETCH_TOTAL: CounterVec = register_counter_vec!(
        "listing_fetch_total",
        "Total page fetches by outcome",
        &["status"]
    ).expect("Invalid fetch metric");

    // * Page fetch duration
    pub static ref FETCH_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "listing_fetch_duration_seconds",
        "Page fetch duration in seconds",
        &["status"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).expect("Invalid fetch duration metric");
}

/// Initializes the tracing subscriber with JSON formatting
///
/// # Example
/// ```ignore
/// use listing_refinery::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(url = "https://example.com/dap/filtracion.html", "Processing page");
/// ```
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initializes tracing with custom log level (RUST_LOG still takes precedence)
pub fn init_tracing_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty().with_writer(std::io::stderr))
        .init();
}

/// Returns the current metrics in Prometheus text format
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Records one page run through the engine
pub fn record_page_processed(mode: &str) {
    PAGES_PROCESSED_TOTAL.with_label_values(&[mode]).inc();
}

/// Records the candidate blocks a segmenter produced
pub fn record_blocks_segmented(mode: &str, count: usize) {
    BLOCKS_SEGMENTED_TOTAL
        .with_label_values(&[mode])
        .inc_by(count as f64);
}

pub fn record_record_emitted() {
    RECORDS_EMITTED_TOTAL.inc();
}

pub fn record_duplicate_dropped() {
    DUPLICATES_DROPPED_TOTAL.inc();
}

/// Records a fetch outcome ("success", "http_error", "status", "content_type") and its duration
pub fn record_fetch(status: &str, seconds: f64) {
    FETCH_TOTAL.with_label_values(&[status]).inc();
    FETCH_DURATION_SECONDS
        .with_label_values(&[status])
        .observe(seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_page_processed() {
        let before = PAGES_PROCESSED_TOTAL.with_label_values(&["gap"]).get();
        record_page_processed("gap");
        assert!(PAGES_PROCESSED_TOTAL.with_label_values(&["gap"]).get() >= before + 1.0);
    }

    #[test]
    fn test_record_blocks_segmented() {
        let before = BLOCKS_SEGMENTED_TOTAL.with_label_values(&["card"]).get();
        record_blocks_segmented("card", 3);
        assert!(BLOCKS_SEGMENTED_TOTAL.with_label_values(&["card"]).get() >= before + 3.0);
    }

    #[test]
    fn test_record_counters() {
        record_record_emitted();
        record_duplicate_dropped();
        assert!(RECORDS_EMITTED_TOTAL.get() >= 1.0);
        assert!(DUPLICATES_DROPPED_TOTAL.get() >= 1.0);
    }

    #[test]
    fn test_record_fetch() {
        record_fetch("success", 0.2);
        record_fetch("status", 0.1);
        // * Counters and histograms should be updated
        assert!(FETCH_TOTAL.with_label_values(&["success"]).get() >= 1.0);
    }

    #[test]
    fn test_get_metrics_string() {
        record_page_processed("auto");
        let metrics = get_metrics_string();
        assert!(metrics.contains("listing_pages_processed_total"));
    }
}
