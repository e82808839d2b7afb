use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::api::SearchApiClient;
use crate::config::Config;
use crate::embeddings::EmbeddingClient;
use crate::import::{BatchImporter, ImportSession, ImportStep};
use crate::mapping::{EditOutcome, edit_mappings};

fn engine_client(config: &Config) -> Result<SearchApiClient> {
    let url = config.engine_url()?;
    Ok(SearchApiClient::new(url))
}

fn embedding_client(config: &Config) -> Result<EmbeddingClient> {
    let url = config.embedding_url()?;
    Ok(EmbeddingClient::new(url))
}

/// List all tables known to the engine
#[inline]
pub async fn list_tables() -> Result<()> {
    let config = Config::load()?;
    let api = engine_client(&config)?;

    let tables = api.list_tables().context("Failed to list tables")?;

    if tables.is_empty() {
        println!("No tables found.");
        println!("Use 'vecadmin create-table <sql>' to create one.");
        return Ok(());
    }

    println!("Tables ({} total):", tables.len());
    for table in &tables {
        println!("  {}", table);
    }

    Ok(())
}

/// Show the column layout of one table
#[inline]
pub async fn show_columns(table: String) -> Result<()> {
    let config = Config::load()?;
    let api = engine_client(&config)?;

    let columns = api
        .describe_table(&table)
        .with_context(|| format!("Failed to describe table '{}'", table))?;

    println!("Columns of {} ({} total):", table, columns.len());
    for column in &columns {
        let marker = if column.is_vector() { " 🧭" } else { "" };
        match &column.properties {
            Some(properties) => println!(
                "  {:<24} {} ({}){}",
                column.field, column.column_type, properties, marker
            ),
            None => println!("  {:<24} {}{}", column.field, column.column_type, marker),
        }
    }

    Ok(())
}

/// Create a table from a raw CREATE TABLE statement
#[inline]
pub async fn create_table(sql: String) -> Result<()> {
    let config = Config::load()?;
    let api = engine_client(&config)?;

    api.create_table(&sql).context("Failed to create table")?;
    println!("✅ Table created");

    Ok(())
}

/// Show the embedding-model bindings configured for a table's columns
#[inline]
pub async fn show_vector_configs(table: String) -> Result<()> {
    let config = Config::load()?;
    let api = engine_client(&config)?;

    let configs = api
        .list_vector_configs(&table)
        .with_context(|| format!("Failed to fetch vector configs for '{}'", table))?;

    if configs.is_empty() {
        println!("No vector column configs found for '{}'.", table);
        return Ok(());
    }

    println!(
        "Vector column configs for {} ({} total):",
        table,
        configs.len()
    );
    for config in &configs {
        println!("  {} → model {}", config.column, config.model);
        if let Some(combined) = &config.combined_fields {
            for field in &combined.source_fields {
                println!(
                    "      source {} (weight {})",
                    field,
                    combined.weight_for(field)
                );
            }
        }
    }

    Ok(())
}

/// Verify both backing services are reachable
#[inline]
pub async fn check_services() -> Result<()> {
    let config = Config::load()?;

    let api = engine_client(&config)?;
    match api.list_tables() {
        Ok(tables) => println!("✅ Engine reachable ({} tables)", tables.len()),
        Err(e) => println!("❌ Engine unreachable: {}", e),
    }

    let embeddings = embedding_client(&config)?;
    match embeddings.health_check() {
        Ok(()) => println!("✅ Embedding service reachable"),
        Err(e) => println!("❌ Embedding service unreachable: {}", e),
    }

    Ok(())
}

/// Import a CSV/TSV/JSON file into a table: preview, map fields, then
/// run the batched import with live progress and Ctrl+C cancellation.
#[inline]
pub async fn run_import(
    table: String,
    file: PathBuf,
    batch_size: Option<usize>,
    assume_yes: bool,
) -> Result<()> {
    let config = Config::load()?;
    let api = engine_client(&config)?;
    let embeddings = embedding_client(&config)?;

    if let Err(e) = embeddings.health_check() {
        warn!("Embedding service health check failed: {}", e);
        println!("⚠️  Embedding service is unreachable; vector columns will stay empty");
    }

    let columns = api
        .describe_table(&table)
        .with_context(|| format!("Failed to describe table '{}'", table))?;
    let configs = api
        .list_vector_configs(&table)
        .context("Failed to fetch vector column configs")?;

    let mut session = ImportSession::new(file);
    session.load_preview(config.max_file_size_bytes(), config.import.preview_rows)?;

    {
        let parsed = session
            .parsed
            .as_ref()
            .context("Preview missing after parse")?;
        println!(
            "Parsed {} as {}: {} rows, {} columns",
            session.file_path.display(),
            parsed.format,
            parsed.total_rows,
            parsed.headers.len()
        );
        println!("Fields: {}", parsed.headers.join(", "));
    }

    session.suggest_mappings(&columns);

    if assume_yes || !console::user_attended() {
        info!("Skipping interactive mapping review");
    } else {
        match edit_mappings(&mut session.mappings, &columns)? {
            EditOutcome::StartImport => {}
            EditOutcome::Abort => {
                println!("Import aborted; nothing was written.");
                return Ok(());
            }
        }
    }

    let bar = if console::user_attended_stderr() {
        ProgressBar::new(100).with_style(
            ProgressStyle::with_template("{bar:40} {pos}% Importing into {msg}")
                .expect("style template is valid"),
        )
    } else {
        ProgressBar::hidden()
    };
    bar.set_message(table.clone());

    // Ctrl+C requests cancellation; the driver stops at the next row
    // boundary and keeps everything already written.
    let cancel = session.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, requesting import cancellation");
            cancel.cancel();
        }
    });

    let batch_size = batch_size.unwrap_or(config.import.batch_size);
    let importer = BatchImporter::new(&api, &embeddings)
        .with_batch_size(batch_size)
        .with_max_file_size(config.max_file_size_bytes());

    let result = importer
        .run(&mut session, &table, &columns, &configs, |progress| {
            bar.set_position(u64::from(progress));
        })
        .await;
    bar.finish_and_clear();

    match result {
        Ok(()) if session.step == ImportStep::Complete => {
            println!(
                "✅ Import complete: {} rows imported into {}",
                session.success_count, table
            );
            if session.error_count > 0 {
                println!(
                    "{}",
                    style(format!("⚠️  {} rows failed", session.error_count)).yellow()
                );
            }
        }
        Ok(()) => {
            // Cancelled: the driver hands control back to the mapping step.
            if let Some(message) = &session.error_message {
                println!("🛑 {}", message);
            }
        }
        Err(e) => {
            if let Some(message) = &session.error_message {
                println!("{}", style(format!("❌ {}", message)).red());
            }
            return Err(e.into());
        }
    }

    Ok(())
}
