//! One export pass: source rows in, workbook out.
//!
//! The caller logs the start line before connecting; this module starts at the
//! connectivity check.

use crate::artifact;
use crate::config::{RunConfig, RunMode};
use crate::cursor::{watermark, SyncCursor};
use crate::drive::ArtifactStore;
use crate::error::PipelineError;
use crate::model::JournalRow;
use crate::source::JournalSource;
use crate::transform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub mode: RunMode,
    pub rows_fetched: usize,
    pub rows_written: usize,
    pub output_name: String,
    pub folder_id: String,
    pub cursor: Option<String>,
    /// Set only when something was uploaded.
    pub file_id: Option<String>,
}

impl RunReport {
    pub fn uploaded(&self) -> bool {
        self.file_id.is_some()
    }
}

/// What is already in the destination folder under the output name.
struct Existing {
    file_id: Option<String>,
    rows: Vec<JournalRow>,
}

async fn load_existing<A: ArtifactStore>(
    store: &A,
    config: &RunConfig,
) -> Result<Existing, PipelineError> {
    let file_id = store
        .find_file(&config.drive_folder_id, &config.output_name)
        .await?;

    let Some(id) = file_id.as_deref() else {
        return Ok(Existing {
            file_id: None,
            rows: Vec::new(),
        });
    };

    let rows = match store.download(id).await {
        Ok(bytes) => artifact::decode(&bytes).unwrap_or_else(|e| {
            tracing::warn!(file_id = id, error = %e, "Existing artifact unreadable; starting fresh");
            Vec::new()
        }),
        Err(e) => {
            tracing::warn!(file_id = id, error = %e, "Existing artifact download failed; starting fresh");
            Vec::new()
        }
    };

    Ok(Existing { file_id, rows })
}

pub async fn run<S, A>(config: &RunConfig, source: &S, store: &A) -> Result<RunReport, PipelineError>
where
    S: JournalSource,
    A: ArtifactStore,
{
    source.ping().await?;
    store.check_folder(&config.drive_folder_id).await?;

    let existing = load_existing(store, config).await?;

    let cursor: Option<SyncCursor> = match config.run_mode {
        RunMode::Full => None,
        RunMode::Incremental => watermark(&existing.rows),
    };
    match cursor {
        Some(c) => tracing::info!(cursor = %c, "Fetching journals newer than cursor"),
        None if config.run_mode == RunMode::Incremental => {
            tracing::info!("No cursor in existing artifact; fetching all journals")
        }
        None => {}
    }

    let raw = source.fetch(cursor).await?;
    let rows_fetched = raw.len();
    tracing::info!(rows = rows_fetched, "Fetched {} rows from Mongo", rows_fetched);

    let mut report = RunReport {
        mode: config.run_mode,
        rows_fetched,
        rows_written: 0,
        output_name: config.output_name.clone(),
        folder_id: config.drive_folder_id.clone(),
        cursor: cursor.map(|c| c.to_string()),
        file_id: None,
    };

    if rows_fetched == 0 {
        tracing::info!("No new data; nothing to upload.");
        return Ok(report);
    }

    let rows = transform::merge(existing.rows, transform::clean(raw));
    let bytes = artifact::encode(&rows)?;
    let digest = artifact::digest(&bytes);
    let size = bytes.len();

    let receipt = store
        .upload(
            &config.drive_folder_id,
            &config.output_name,
            existing.file_id.as_deref(),
            bytes,
        )
        .await?;

    tracing::info!(
        bytes = size,
        sha256 = %digest,
        created = receipt.created,
        "Uploaded {} ({} rows) to folder {} (file id: {})",
        config.output_name,
        rows.len(),
        config.drive_folder_id,
        receipt.file_id
    );

    report.rows_written = rows.len();
    report.file_id = Some(receipt.file_id);
    Ok(report)
}
