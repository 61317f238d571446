// * Operations
// * Structured logging and Prometheus counters shared by every pipeline stage

pub mod telemetry;

// * Re-exports for convenient access
pub use telemetry::{
    get_metrics_string, init_tracing, init_tracing_pretty, init_tracing_with_level,
    record_blocks_segmented, record_duplicate_dropped, record_fetch, record_page_processed,
    record_record_emitted,
};
