//! Product review import from CSV into a store's comment storage.
//!
//! - Input: a CSV upload (plain, gzip or zstd; any `encoding_rs` charset) whose
//!   header names the columns. Products are referenced by SKU.
//! - Rows are handled strictly in file order. A row whose width differs from
//!   the header halts the run; every other failure skips just that row.
//!
//! Data shape:
//! - `ImportReport { headers, outcomes, halted }`
//! - Each stored review: `ReviewRecord` plus `rating`/`verified`/`title` meta
#![cfg_attr(docsrs, feature(doc_cfg))]
//
mod codec;
mod config;
mod io;
mod mapper;
mod normalize;
mod reader;
pub mod record;
mod report;
mod sanitize;
mod store;
mod validate;

pub use crate::config::{DatePolicy, ImportOptions};
pub use crate::io::{build_csv_reader, reader_from_path, Compression, InputMeta};
pub use crate::mapper::{Inserted, ReviewMapper};
pub use crate::normalize::{parse_flag, parse_int, parse_loose_datetime, LooseDateTime, EPOCH};
pub use crate::reader::{ReviewCsvReader, SourceRow};
pub use crate::record::ReviewRecord;
pub use crate::report::{ImportReport, RowOutcome, RowStatus};
pub use crate::sanitize::{Sanitizer, StandardSanitizer};
pub use crate::store::{MemoryStore, MetaValue, ReviewStore, StoreError, StoreSnapshot};
pub use crate::validate::{check_structure, require_field, RawRow};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{debug, error, info, warn};

/// Failures that end the whole run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected {expected} fields to match the header, found {actual}")]
    Structural {
        line: u64,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv_async::Error),
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Failures that skip one row; the run carries on.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("missing {field}")]
    MissingField { line: u64, field: String },
    #[error("product with SKU '{sku}' not found")]
    UnresolvedReference { line: u64, sku: String },
    #[error("unreadable {field} '{value}'")]
    InvalidDate {
        line: u64,
        field: String,
        value: String,
    },
    #[error("failed to store review: {reason}")]
    Persistence { line: u64, reason: String },
}

impl RowError {
    pub fn line(&self) -> u64 {
        match self {
            RowError::MissingField { line, .. }
            | RowError::UnresolvedReference { line, .. }
            | RowError::InvalidDate { line, .. }
            | RowError::Persistence { line, .. } => *line,
        }
    }
}

/// Run one import over an already opened upload.
///
/// Returns `Err` only when the header cannot be read. Anything that goes wrong
/// afterwards lands in the report: row failures as skipped outcomes, a
/// structural or read failure as [`ImportReport::halted`].
pub async fn import_reviews<R, S, Z>(
    reader: R,
    store: &mut S,
    sanitizer: &Z,
    options: &ImportOptions,
) -> ImportResult<ImportReport>
where
    R: AsyncRead + Unpin + Send + 'static,
    S: ReviewStore,
    Z: Sanitizer,
{
    let mut rows = ReviewCsvReader::open(reader, options.delimiter).await?;
    let header = rows.header().to_vec();

    if !header.iter().any(|h| h == &options.sku_field) {
        warn!(field = %options.sku_field, "header has no SKU column; every row will be skipped");
    }
    let ignored: Vec<&str> = header
        .iter()
        .map(String::as_str)
        .filter(|h| !record::KNOWN_FIELDS.contains(h) && *h != options.sku_field)
        .collect();
    if !ignored.is_empty() {
        debug!(?ignored, "ignoring unrecognized columns");
    }
    info!(columns = header.len(), "review import started");

    let mapper = ReviewMapper::new(sanitizer, options);
    let mut report = ImportReport {
        headers: header,
        ..Default::default()
    };

    loop {
        let row = match rows.next_row().await {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, rows = rows.rows_read(), "import halted: unreadable input");
                report.halted = Some(e);
                break;
            }
        };
        let line = row.line;

        let fields = match check_structure(&report.headers, row) {
            Ok(fields) => fields,
            Err(e) => {
                error!(line, error = %e, "import halted: field count mismatch");
                report.halted = Some(e);
                break;
            }
        };

        let result = match require_field(&fields, &options.sku_field, line) {
            Ok(sku) => mapper.write(store, &fields, sku, line).await,
            Err(e) => Err(e),
        };
        let status = match result {
            Ok(Inserted {
                comment_id,
                product_id,
            }) => RowStatus::Imported {
                comment_id,
                product_id,
            },
            Err(e) => {
                warn!(line, error = %e, "row skipped");
                RowStatus::Skipped(e)
            }
        };
        report.outcomes.push(RowOutcome { line, status });
    }

    info!(
        imported = report.imported(),
        skipped = report.skipped(),
        complete = report.is_complete(),
        "review import finished"
    );
    Ok(report)
}

/// Open a local upload and import it. The file is closed when this returns.
pub async fn import_reviews_from_path<S, Z>(
    path: &Path,
    charset: &'static encoding_rs::Encoding,
    store: &mut S,
    sanitizer: &Z,
    options: &ImportOptions,
) -> ImportResult<ImportReport>
where
    S: ReviewStore,
    Z: Sanitizer,
{
    let (reader, meta) = reader_from_path(path, charset).await?;
    debug!(path = %path.display(), content_type = %meta.content_type, "opened upload");
    import_reviews(reader, store, sanitizer, options).await
}
