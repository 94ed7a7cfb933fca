//! Schema Annotator - Main entry point.
//!
//! CLI surface over the extractor and document builder: test a connection,
//! inspect tables and columns, dump the schema summary, run statements under
//! the safety policy, and build retrieval documents from an annotations file.

use clap::Parser;
use schema_annotator::config::{Cli, Command};
use schema_annotator::db::SchemaExtractor;
use schema_annotator::documents::DocumentBuilder;
use schema_annotator::models::{AnnotationSet, summarize};
use std::fs;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    let config = cli.connection_config()?;
    info!(
        engine = %config.engine,
        target = %config.masked_url(),
        safe_mode = config.safe_mode,
        "Starting schema annotator v{}",
        env!("CARGO_PKG_VERSION")
    );

    let extractor = SchemaExtractor::new(config)?;
    let result = run_command(&cli.command, &extractor).await;
    extractor.dispose().await;

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        return Err(e.into());
    }

    Ok(())
}

async fn run_command(
    command: &Command,
    extractor: &SchemaExtractor,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Ping => {
            extractor.ping().await?;
            println!("Connection successful");
        }
        Command::Tables => {
            for table in extractor.list_tables().await {
                println!("{table}");
            }
        }
        Command::Columns { table } => {
            for column in extractor.list_columns(table).await {
                println!("{} ({})", column.name, column.data_type);
            }
        }
        Command::Schema => {
            let schema = extractor.extract_schema().await?;
            let summary = summarize(&schema);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Query { sql } => {
            let rows = extractor.execute_query(sql).await?;
            info!(rows = rows.len(), "Query returned");
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Documents {
            annotations,
            output,
        } => {
            let raw = fs::read_to_string(annotations)?;
            let annotations: AnnotationSet = serde_json::from_str(&raw)?;
            let schema = extractor.extract_schema().await?;

            let documents = DocumentBuilder::build(&annotations, &schema);
            info!(count = documents.len(), "Built retrieval documents");

            let rendered = serde_json::to_string_pretty(&documents)?;
            match output {
                Some(path) => fs::write(path, rendered)?,
                None => println!("{rendered}"),
            }
        }
    }

    Ok(())
}
