//! Metrics for the block translation pipeline.

use crate::DropReason;
use strum::IntoEnumIterator;

/// Container for metrics.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Identifier for the counter of translated blocks.
    pub const BLOCKS_TRANSLATED: &str = "kakarot_translator_blocks_translated";

    /// Identifier for the counter of emitted records, labeled by `collection`.
    pub const RECORDS_EMITTED: &str = "kakarot_translator_records_emitted";

    /// Identifier for the counter of dropped transactions and logs, labeled by `reason`.
    pub const RECORDS_DROPPED: &str = "kakarot_translator_records_dropped";

    /// Identifier for the histogram of header field fetch durations, in seconds.
    pub const HEADER_FIELDS_DURATION: &str = "kakarot_translator_header_fields_duration";

    /// Identifier for the counter of failed header field fetches.
    pub const HEADER_FIELDS_ERRORS: &str = "kakarot_translator_header_fields_errors";

    /// Initializes metrics for the translator.
    ///
    /// This does two things:
    /// * Describes various metrics.
    /// * Initializes metrics to 0 so they can be queried immediately.
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    /// Describes metrics used in [`kakarot_translator`][crate].
    pub fn describe() {
        metrics::describe_counter!(Self::BLOCKS_TRANSLATED, "Number of blocks translated");
        metrics::describe_counter!(
            Self::RECORDS_EMITTED,
            "Number of records emitted, by collection"
        );
        metrics::describe_counter!(
            Self::RECORDS_DROPPED,
            "Number of transactions and logs dropped, by reason"
        );
        metrics::describe_histogram!(
            Self::HEADER_FIELDS_DURATION,
            metrics::Unit::Seconds,
            "Time taken to fetch the header fields of a block"
        );
        metrics::describe_counter!(
            Self::HEADER_FIELDS_ERRORS,
            "Number of failed header field fetches"
        );
    }

    /// Initializes metrics to `0` so they can be queried immediately.
    pub fn zero() {
        metrics::counter!(Self::BLOCKS_TRANSLATED).absolute(0);
        for collection in ["transactions", "logs", "receipts", "headers"] {
            metrics::counter!(Self::RECORDS_EMITTED, "collection" => collection).absolute(0);
        }
        for reason in DropReason::iter() {
            let reason: &'static str = reason.into();
            metrics::counter!(Self::RECORDS_DROPPED, "reason" => reason).absolute(0);
        }
        metrics::counter!(Self::HEADER_FIELDS_ERRORS).absolute(0);
    }
}
