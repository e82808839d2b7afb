use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vecadmin::Result;
use vecadmin::commands::{
    check_services, create_table, list_tables, run_import, show_columns, show_vector_configs,
};
use vecadmin::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "vecadmin")]
#[command(about = "Admin console for a vector search engine: inspect tables and import data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure engine and embedding service endpoints
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// List all tables on the engine
    Tables,
    /// Show the columns of a table
    Columns {
        /// Table to describe
        table: String,
    },
    /// Create a table from a raw CREATE TABLE statement
    CreateTable {
        /// Full CREATE TABLE SQL, quoted
        sql: String,
    },
    /// Show embedding-model bindings for a table's vector columns
    VectorConfigs {
        /// Table to inspect
        table: String,
    },
    /// Check that the engine and embedding service are reachable
    Check,
    /// Import a CSV, TSV, or JSON file into a table
    Import {
        /// Destination table
        table: String,
        /// Path to the file to import
        file: PathBuf,
        /// Rows per batch (defaults to the configured batch size)
        #[arg(long)]
        batch_size: Option<usize>,
        /// Accept the suggested field mapping without prompting
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Tables => {
            list_tables().await?;
        }
        Commands::Columns { table } => {
            show_columns(table).await?;
        }
        Commands::CreateTable { sql } => {
            create_table(sql).await?;
        }
        Commands::VectorConfigs { table } => {
            show_vector_configs(table).await?;
        }
        Commands::Check => {
            check_services().await?;
        }
        Commands::Import {
            table,
            file,
            batch_size,
            yes,
        } => {
            run_import(table, file, batch_size, yes).await?;
        }
    }

    Ok(())
}
