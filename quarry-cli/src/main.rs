mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use quarry::config::{Config, LoggingConfig, DEFAULT_CONNECTION};
use quarry_http::TransportFactory;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(about = "Quarry CLI - build, inspect and run Elasticsearch queries")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.quarry/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Connection group from the config
    #[arg(long, global = true, default_value = DEFAULT_CONNECTION)]
    connection: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search an index and print one page of hits
    Search(commands::SearchArgs),

    /// Fetch a document by id
    Get {
        #[arg(short, long)]
        index: String,

        #[arg(long)]
        id: String,
    },

    /// Delete a document by id
    Delete {
        #[arg(short, long)]
        index: String,

        #[arg(long)]
        id: String,
    },

    /// Create an index
    CreateIndex {
        #[arg(short, long)]
        index: String,

        /// Field mapping as NAME=TYPE (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// Add field mappings to an existing index
    PutMapping {
        #[arg(short, long)]
        index: String,

        /// Field mapping as NAME=TYPE (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,
    },
}

/// Log destination: the configured file in append mode, else stderr
fn log_writer(logging: &LoggingConfig) -> Result<BoxMakeWriter> {
    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Ok(BoxMakeWriter::new(Arc::new(file)))
        }
        None => Ok(BoxMakeWriter::new(std::io::stderr)),
    }
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| config.logging.format.clone());
    let writer = log_writer(&config.logging)?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(config.logging.file.is_none())
                    .with_writer(writer),
            )
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_or_create(path)?,
        None => Config::load()?,
    };
    init_logging(&config)?;

    if let Commands::Search(args) = &cli.command {
        if args.dry_run {
            let request = commands::run_dry_run(args).await?;
            println!("{}", serde_json::to_string_pretty(&request)?);
            return Ok(());
        }
    }

    let factory = TransportFactory::new(config);
    let transport = factory.create(&cli.connection)?;
    tracing::debug!(connection = %cli.connection, "Using connection");

    match cli.command {
        Commands::Search(args) => commands::run_search(transport, &args).await?,
        Commands::Get { index, id } => commands::run_get(transport, &index, &id).await?,
        Commands::Delete { index, id } => commands::run_delete(transport, &index, &id).await?,
        Commands::CreateIndex { index, fields } => {
            commands::run_create_index(transport, &index, &fields).await?
        }
        Commands::PutMapping { index, fields } => {
            commands::run_put_mapping(transport, &index, &fields).await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn test_log_writer_appends_to_configured_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("quarry.log");
        std::fs::write(&path, "earlier\n").unwrap();

        let logging = LoggingConfig {
            file: Some(path.clone()),
            ..LoggingConfig::default()
        };
        let writer = log_writer(&logging).unwrap();
        writer.make_writer().write_all(b"later\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
    }

    #[test]
    fn test_log_writer_reports_unopenable_file() {
        let temp = tempfile::tempdir().unwrap();
        let logging = LoggingConfig {
            file: Some(temp.path().join("missing-dir").join("quarry.log")),
            ..LoggingConfig::default()
        };
        assert!(log_writer(&logging).is_err());
    }
}
