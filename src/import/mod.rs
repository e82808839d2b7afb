
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::api::{ApiError, SearchApiClient, TableColumn, VectorColumnConfig};
use crate::embeddings::{EmbeddingClient, EmbeddingOrchestrator};
use crate::ingest::{self, ParsedFile};
use crate::mapping::{FieldMapping, active_mappings, suggest_mappings};
use crate::values::combine_values;
use crate::{AdminError, Result};

/// Rows submitted per progress-reporting unit
pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStep {
    Upload,
    Mapping,
    Importing,
    Complete,
}

impl std::fmt::Display for ImportStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Mapping => f.write_str("mapping"),
            Self::Importing => f.write_str("importing"),
            Self::Complete => f.write_str("complete"),
        }
    }
}

/// Cooperative cancellation flag, observed at row and batch boundaries.
///
/// Setting it never aborts an in-flight network call; already-created
/// records are kept.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// State for one import attempt, from upload through completion.
///
/// Owned exclusively by the driver while importing; the surrounding UI
/// may only request cancellation through the token.
#[derive(Debug, Clone)]
pub struct ImportSession {
    pub step: ImportStep,
    pub file_path: PathBuf,
    pub parsed: Option<ParsedFile>,
    pub mappings: Vec<FieldMapping>,
    pub progress: u8,
    pub success_count: usize,
    pub error_count: usize,
    pub error_message: Option<String>,
    cancel: CancelToken,
}

impl ImportSession {
    #[inline]
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            step: ImportStep::Upload,
            file_path: file_path.into(),
            parsed: None,
            mappings: Vec::new(),
            progress: 0,
            success_count: 0,
            error_count: 0,
            error_message: None,
            cancel: CancelToken::new(),
        }
    }

    /// Parse the upload into a preview and advance to the mapping step.
    /// On failure the session stays at `upload` with no partial state.
    #[inline]
    pub fn load_preview(&mut self, max_bytes: u64, preview_rows: usize) -> Result<()> {
        match ingest::parse_preview(&self.file_path, max_bytes, preview_rows) {
            Ok(parsed) => {
                self.parsed = Some(parsed);
                self.step = ImportStep::Mapping;
                Ok(())
            }
            Err(e) => {
                self.parsed = None;
                self.step = ImportStep::Upload;
                Err(e.into())
            }
        }
    }

    /// Auto-suggest mappings from the preview and the table's columns
    #[inline]
    pub fn suggest_mappings(&mut self, columns: &[TableColumn]) {
        let Some(parsed) = &self.parsed else {
            return;
        };
        self.mappings = suggest_mappings(&parsed.headers, parsed.sample_row(), columns);
    }

    /// Token for requesting cancellation from outside the driver
    #[inline]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

/// Drives a cancellable batched import of one file into one table
#[derive(Debug)]
pub struct BatchImporter<'a> {
    api: &'a SearchApiClient,
    orchestrator: EmbeddingOrchestrator<'a>,
    batch_size: usize,
    max_file_size: u64,
}

impl<'a> BatchImporter<'a> {
    #[inline]
    pub fn new(api: &'a SearchApiClient, embedding_client: &'a EmbeddingClient) -> Self {
        Self {
            api,
            orchestrator: EmbeddingOrchestrator::new(embedding_client),
            batch_size: DEFAULT_BATCH_SIZE,
            max_file_size: ingest::MAX_FILE_SIZE_BYTES,
        }
    }

    #[inline]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[inline]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Run the import. The session ends at `complete`, or back at
    /// `mapping` after cancellation or a fatal failure, with counters
    /// reflecting whatever was accomplished.
    #[inline]
    pub async fn run<F>(
        &self,
        session: &mut ImportSession,
        table: &str,
        columns: &[TableColumn],
        configs: &[VectorColumnConfig],
        on_progress: F,
    ) -> Result<()>
    where
        F: Fn(u8),
    {
        if active_mappings(&session.mappings).is_empty() {
            let message = "No field mappings are enabled; map at least one field".to_string();
            session.step = ImportStep::Mapping;
            session.error_message = Some(message.clone());
            return Err(AdminError::MappingValidation(message));
        }

        session.step = ImportStep::Importing;
        session.progress = 0;
        session.success_count = 0;
        session.error_count = 0;
        session.error_message = None;

        // The mapping preview is deliberately not reused: the full file is
        // re-read from scratch so only the import step holds the whole
        // dataset in memory.
        let parsed = match ingest::parse_full(&session.file_path, self.max_file_size) {
            Ok(parsed) => parsed,
            Err(e) => {
                let message = format!("Failed to re-read upload: {}", e);
                session.step = ImportStep::Mapping;
                session.error_message = Some(message.clone());
                return Err(AdminError::ImportFatal(message));
            }
        };

        let total_batches = parsed.rows.len().div_ceil(self.batch_size).max(1);
        info!(
            "Importing {} rows into {} in {} batches",
            parsed.rows.len(),
            table,
            total_batches
        );

        let cancel = session.cancel_token();
        let mut cancelled = false;

        'batches: for (batch_index, batch) in parsed.rows.chunks(self.batch_size).enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            for row in batch {
                if cancel.is_cancelled() {
                    cancelled = true;
                    break 'batches;
                }

                let mut doc =
                    assemble_document(&parsed.headers, row, &session.mappings, columns);
                self.orchestrator.populate_vectors(&mut doc, configs, columns);

                match self.api.insert(table, &doc) {
                    Ok(()) => session.success_count += 1,
                    Err(e) => {
                        // A transport failure before anything succeeded
                        // means the engine is unreachable; give up rather
                        // than burning through every row.
                        let first_attempt =
                            session.success_count == 0 && session.error_count == 0;
                        if first_attempt && matches!(e, ApiError::Transport(_)) {
                            let message = format!("Record creation unavailable: {}", e);
                            session.step = ImportStep::Mapping;
                            session.error_message = Some(message.clone());
                            return Err(AdminError::ImportFatal(message));
                        }

                        warn!("Row import failed: {}", e);
                        session.error_count += 1;
                    }
                }
            }

            let completed = batch_index + 1;
            session.progress = ((completed * 100) / total_batches).min(100) as u8;
            on_progress(session.progress);
            debug!(
                "Completed batch {}/{} ({} ok, {} failed)",
                completed, total_batches, session.success_count, session.error_count
            );

            // Yield between batches so a cancellation request can land.
            tokio::task::yield_now().await;
        }

        if cancelled {
            let message = format!(
                "Import cancelled: {} rows imported before cancellation",
                session.success_count
            );
            info!("{}", message);
            session.error_message = Some(message);
            session.step = ImportStep::Mapping;
            return Ok(());
        }

        session.progress = 100;
        on_progress(100);

        if session.error_count > 0 {
            session.error_message = Some(format!(
                "Import finished with {} failed rows; {} rows imported",
                session.error_count, session.success_count
            ));
        }
        session.step = ImportStep::Complete;

        info!(
            "Import complete: {} rows imported, {} failed",
            session.success_count, session.error_count
        );

        Ok(())
    }
}

/// Assemble the scalar destinations of one output row: group the source
/// values by destination column and combine each group. Vector columns
/// are left for the embedding step.
#[inline]
pub fn assemble_document(
    headers: &[String],
    row: &[String],
    mappings: &[FieldMapping],
    columns: &[TableColumn],
) -> Map<String, Value> {
    let mut destinations: Vec<(String, Vec<String>)> = Vec::new();

    for mapping in active_mappings(mappings) {
        let Some(index) = headers.iter().position(|h| h == &mapping.source_field) else {
            continue;
        };
        let value = row.get(index).cloned().unwrap_or_default();

        match destinations
            .iter_mut()
            .find(|(destination, _)| destination == &mapping.destination)
        {
            Some((_, values)) => values.push(value),
            None => destinations.push((mapping.destination.clone(), vec![value])),
        }
    }

    let mut doc = Map::new();
    for (destination, values) in destinations {
        let column = columns.iter().find(|c| c.field == destination);
        if column.is_some_and(TableColumn::is_vector) {
            debug!(
                "Skipping direct write to vector column {}; it is populated by embedding generation",
                destination
            );
            continue;
        }

        if let Some(combined) = combine_values(column, &values) {
            doc.insert(destination, combined.into());
        }
    }

    doc
}
