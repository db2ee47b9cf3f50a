//! Core enrichment logic for licensee records.
//!
//! Ties the model client and record store together into the single-record
//! [`pipeline`] and the sequential [`batch`] runner. Parsing, scoring and
//! summary generation are pure and live in their own modules.

pub mod batch;
pub mod embedding;
pub mod fields;
pub mod input;
pub mod pipeline;
pub mod prompt;
pub mod record;
pub mod response;
pub mod scoring;
pub mod summary;
pub mod taxonomy;

pub use batch::{
    BatchProgress, BatchReport, BatchRow, PacingPolicy, RowStatus, SilentBatchProgress, run_batch,
};
pub use embedding::EmbeddingSet;
pub use fields::EnrichmentFields;
pub use pipeline::{EnrichmentOutcome, EnrichmentPipeline, PipelineOptions, UpsertAction};
pub use record::PersistedRecord;
pub use scoring::{CategoryMatcher, CategoryScore};
pub use summary::SummarySet;
