//! Sequential batch runner with fixed per-row pacing.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use licensee_shared::{BatchConfig, InputRow, LicenseeError, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::pipeline::EnrichmentPipeline;
use crate::scoring::CategoryMatcher;

/// Status text for rows rejected before enrichment.
pub const MISSING_FIELDS: &str = "Missing required fields";

/// Delay between consecutive enrichment calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub delay_per_item: Duration,
}

impl PacingPolicy {
    pub fn new(delay_per_item: Duration) -> Self {
        Self { delay_per_item }
    }

    /// No pause between rows.
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl From<&BatchConfig> for PacingPolicy {
    fn from(config: &BatchConfig) -> Self {
        Self::new(Duration::from_millis(config.delay_ms))
    }
}

/// Outcome of one batch row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    Success,
    Failed(String),
}

impl RowStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Failed(message) => write!(f, "Failed - {message}"),
        }
    }
}

impl Serialize for RowStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One row of a batch report.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    pub uid: String,
    pub brand_name: String,
    pub status: RowStatus,
    /// Whether enrichment succeeded for this row.
    pub enriched: bool,
}

/// Per-row results in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub rows: Vec<BatchRow>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    fn push(&mut self, row: BatchRow) {
        if row.status.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.rows.push(row);
    }

    /// Write `uid,brand_name,status` rows with a header.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let csv_err = |e: csv::Error| LicenseeError::Csv(e.to_string());
        let mut csv = csv::Writer::from_writer(writer);

        csv.write_record(["uid", "brand_name", "status"])
            .map_err(csv_err)?;
        for row in &self.rows {
            let status = row.status.to_string();
            csv.write_record([row.uid.as_str(), row.brand_name.as_str(), status.as_str()])
                .map_err(csv_err)?;
        }
        csv.flush()
            .map_err(|e| LicenseeError::Csv(format!("failed to flush CSV: {e}")))
    }
}

/// Progress callbacks for a batch run.
pub trait BatchProgress: Send + Sync {
    /// Called before row `index` (zero-based) of `total` is processed.
    fn row_started(&self, index: usize, total: usize, brand_name: &str);
    /// Called after a row finishes, successfully or not.
    fn row_finished(&self, row: &BatchRow);
    /// Called once after the last row.
    fn finished(&self, report: &BatchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentBatchProgress;

impl BatchProgress for SilentBatchProgress {
    fn row_started(&self, _index: usize, _total: usize, _brand_name: &str) {}
    fn row_finished(&self, _row: &BatchRow) {}
    fn finished(&self, _report: &BatchReport) {}
}

/// Enrich `rows` one at a time, in order.
///
/// Rows missing `uid` or `website` fail without reaching the pipeline. Each
/// row that did reach it, successful or not, is followed by the pacing delay,
/// except the last row. Category patterns are compiled once for the whole run.
#[instrument(skip_all, fields(rows = rows.len()))]
pub async fn run_batch(
    pipeline: &EnrichmentPipeline,
    rows: Vec<InputRow>,
    taxonomy: &[String],
    pacing: PacingPolicy,
    progress: &dyn BatchProgress,
) -> BatchReport {
    let total = rows.len();
    let mut report = BatchReport::default();
    let categories = CategoryMatcher::new(taxonomy);

    for (index, row) in rows.into_iter().enumerate() {
        progress.row_started(index, total, &row.brand_name);
        let uid = row.uid.clone();
        let brand_name = row.brand_name.clone();

        let (result, ran) = match row.into_input() {
            Ok(input) => {
                let outcome = pipeline.enrich_with(input, &categories).await;
                let enriched = outcome.success;
                let status = if enriched {
                    RowStatus::Success
                } else {
                    RowStatus::Failed(outcome.message)
                };
                let row = BatchRow {
                    uid,
                    brand_name,
                    status,
                    enriched,
                };
                (row, true)
            }
            Err(_) => {
                let row = BatchRow {
                    uid,
                    brand_name,
                    status: RowStatus::Failed(MISSING_FIELDS.into()),
                    enriched: false,
                };
                (row, false)
            }
        };

        if !result.status.is_success() {
            warn!(row = index + 1, uid = %result.uid, status = %result.status, "batch row failed");
        }

        let pause = ran && index + 1 < total && !pacing.delay_per_item.is_zero();
        progress.row_finished(&result);
        report.push(result);

        if pause {
            tokio::time::sleep(pacing.delay_per_item).await;
        }
    }

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "batch complete"
    );
    progress.finished(&report);
    report
}
