// * Deduplicator & Assembler
// * Collects records in block order, dropping any whose (name, first email) key was seen
// * earlier in the same pass. Keys are stored as xxh64 hashes.

use std::collections::HashSet;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

use super::record::ListingRecord;
use crate::ops::telemetry;

/// Outcome of offering one record to the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Added,
    Duplicate,
}

/// Composite dedup key: `lower(company_name) + "|" + lower(first email)`
pub fn dedup_key(record: &ListingRecord) -> u64 {
    let key = format!(
        "{}|{}",
        record.company_name.to_lowercase(),
        record.first_email().to_lowercase()
    );
    xxh64(key.as_bytes(), 0)
}

/// Ordered record sink scoped to one extraction pass
#[derive(Debug, Default)]
pub struct RecordAssembler {
    seen: HashSet<u64>,
    records: Vec<ListingRecord>,
    duplicates: usize,
}

impl RecordAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ListingRecord) -> PushOutcome {
        if !self.seen.insert(dedup_key(&record)) {
            debug!(
                company = %record.company_name,
                email = %record.first_email(),
                "Dropping duplicate listing"
            );
            self.duplicates += 1;
            telemetry::record_duplicate_dropped();
            return PushOutcome::Duplicate;
        }

        telemetry::record_record_emitted();
        self.records.push(record);
        PushOutcome::Added
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn finish(self) -> Vec<ListingRecord> {
        self.records
    }
}
