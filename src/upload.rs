use crate::{
    CsvOptions, Database, Session, UploadError, UploaderResult, quote_identifier, read_csv_bytes,
    row_values,
};

use duckdb::params_from_iter;
use polars::prelude::DataFrame;
use std::{fmt, sync::Arc};
use tokio::task::spawn_blocking;
use tracing::{info, warn};

/// Number of uploaded rows kept for display after a successful upload.
pub const PREVIEW_ROWS: usize = 50;

/// Destination of an upload: a table inside a schema of the target database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub schema: String,
    pub table: String,
}

impl UploadTarget {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        UploadTarget {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Label naming this destination, see [`describe_target`].
    pub fn describe(&self) -> String {
        describe_target(&self.schema, &self.table)
    }
}

/// Human-readable label naming the destination of an upload.
pub fn describe_target(schema: &str, table: &str) -> String {
    format!("Select file to ingest into {schema}.{table}")
}

/// Result of one call to [`upload`].
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// No file was given; nothing was read or written.
    NoFileProvided,
    /// Every parsed row was appended.
    Succeeded {
        /// Rows parsed from the file (counted before the write).
        rows: usize,
        /// The first [`PREVIEW_ROWS`] rows of the upload.
        preview: DataFrame,
    },
    /// The upload failed at the step named by the error; the destination is unchanged.
    Failed(UploadError),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Succeeded { .. })
    }
}

/// The status message shown to the user.
impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::NoFileProvided => write!(f, "Awaiting file to upload..."),
            UploadOutcome::Succeeded { rows, .. } => {
                write!(f, "Your upload was a success. You uploaded {rows} rows.")
            }
            UploadOutcome::Failed(error) => {
                write!(f, "Your upload was not successful. \n{error}")
            }
        }
    }
}

/// Appends the rows of a CSV file to `target`.
///
/// 1. No file: returns `NoFileProvided` without touching the database.
/// 2. Parses the file (`Failed(Parse)` on error).
/// 3. Makes `target.schema` the session's active schema (`Failed(ContextSwitch)`).
///    The switch stays in effect on `session` after this call returns.
/// 4. Appends all rows to the fully-qualified table (`Failed(Write)`).
///
/// CSV header names are matched against the destination's columns as-is.
/// The append runs in one transaction, so a failure part-way leaves the table
/// unchanged. Nothing deduplicates: uploading the same file twice appends it twice.
pub fn upload(
    session: &mut Session,
    target: &UploadTarget,
    file: Option<&[u8]>,
    options: &CsvOptions,
) -> UploadOutcome {
    let Some(bytes) = file else {
        return UploadOutcome::NoFileProvided;
    };

    let df = match read_csv_bytes(bytes, options) {
        Ok(df) => df,
        Err(err) => return failed(target, UploadError::Parse(err.to_string())),
    };
    let rows = df.height();

    if let Err(err) = session.use_schema(&target.schema) {
        return failed(target, UploadError::ContextSwitch(err.to_string()));
    }

    if let Err(err) = append_rows(session, target, &df) {
        return failed(target, UploadError::Write(err.to_string()));
    }

    info!(
        "Uploaded {rows} rows into {}.{}",
        target.schema, target.table
    );

    UploadOutcome::Succeeded {
        rows,
        preview: df.head(Some(PREVIEW_ROWS)),
    }
}

fn failed(target: &UploadTarget, error: UploadError) -> UploadOutcome {
    warn!(
        "Upload into {}.{} failed at the {} step: {error}",
        target.schema,
        target.table,
        error.kind()
    );
    UploadOutcome::Failed(error)
}

/// Inserts every row of `df` into `target` inside a single transaction.
///
/// Returns the number of rows inserted. On error the transaction is rolled back.
pub fn append_rows(
    session: &mut Session,
    target: &UploadTarget,
    df: &DataFrame,
) -> UploaderResult<usize> {
    let destination = session.qualified_table(&target.schema, &target.table);

    let columns = df
        .get_column_names()
        .into_iter()
        .map(|name| quote_identifier(name.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; df.width()].join(", ");
    let statement = format!("INSERT INTO {destination} ({columns}) VALUES ({placeholders})");
    tracing::debug!("fn append_rows()\nstatement: {statement}");

    // Dropping the transaction without commit rolls it back.
    let transaction = session.connection_mut().transaction()?;
    {
        let mut insert = transaction.prepare(&statement)?;
        for index in 0..df.height() {
            insert.execute(params_from_iter(row_values(df, index)?))?;
        }
    }
    transaction.commit()?;

    Ok(df.height())
}

/// Runs [`upload`] on a blocking thread with a session of its own.
///
/// The session is acquired for this call only and released when it ends.
/// A missing file returns immediately, without acquiring anything.
pub async fn upload_in_background(
    database: Arc<Database>,
    target: UploadTarget,
    file: Option<Vec<u8>>,
    options: CsvOptions,
) -> UploaderResult<UploadOutcome> {
    let Some(bytes) = file else {
        return Ok(UploadOutcome::NoFileProvided);
    };

    let outcome = spawn_blocking(move || match database.session() {
        Ok(mut session) => upload(&mut session, &target, Some(bytes.as_slice()), &options),
        Err(err) => failed(&target, UploadError::Connectivity(err.to_string())),
    })
    .await?;

    Ok(outcome)
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
