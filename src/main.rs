//! Command-line interface for bucket-peek
//!
//! # Usage Examples
//!
//! ## Browse
//! ```bash
//! # List the root of a bucket (credentials from the AWS provider chain)
//! bucket-peek --bucket my-bucket ls
//!
//! # List a prefix on a MinIO server
//! S3_ENDPOINT_URL=http://localhost:9000 bucket-peek --bucket my-bucket ls data/2024/
//! ```
//!
//! ## Preview
//! ```bash
//! # First 1000 rows of a parquet file
//! bucket-peek --bucket my-bucket view data/2024/events.parquet
//!
//! # First 20 rows, as JSON
//! bucket-peek --bucket my-bucket --max-preview-rows 20 view users.csv --output json
//!
//! # Delta table snapshot from a local warehouse directory
//! bucket-peek --local-root ./warehouse delta tables/orders
//! ```
//!
//! Exit codes: 0 on success, 1 when the source cannot be reached or the
//! arguments are invalid, 2 when the object could not be previewed.

use anyhow::Context;
use bucket_peek::render;
use bucket_peek::{OutputFormat, PreviewOpts, SourceOpts};
use bucket_peek_preview::{Previewer, ViewResult};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bucket-peek")]
#[command(about = "Browse object storage and preview data files")]
#[command(long_about = None)]
struct Cli {
    /// Object source options
    #[command(flatten)]
    source: SourceOpts,

    /// Preview budgets
    #[command(flatten)]
    preview: PreviewOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the immediate children of a prefix
    Ls {
        /// Prefix to list (default: the root)
        #[arg(default_value = "")]
        prefix: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Preview one object, choosing the decoder from its extension
    View {
        /// Object key
        key: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Preview the current snapshot of a Delta Lake table
    Delta {
        /// Table root (the folder containing `_delta_log/`)
        path: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match run().await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the requested preview succeeded
async fn run() -> anyhow::Result<bool> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let location = cli.source.location()?;
    tracing::info!("Connecting to {}", location.display_name());
    let source = location
        .connect(&cli.source.s3_options())
        .await
        .with_context(|| format!("Failed to open {}", location.display_name()))?;
    let previewer = Previewer::new(source, cli.preview.config());

    match cli.command {
        Commands::Ls { prefix, output } => {
            let entries = previewer
                .list(&prefix)
                .await
                .with_context(|| format!("Failed to list {prefix:?}"))?;
            tracing::info!("Listed {} entries under {:?}", entries.len(), prefix);
            match output {
                OutputFormat::Text => print!("{}", render::listing_text(&entries)),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&render::listing_json(&entries))?)
                }
            }
            Ok(true)
        }
        Commands::View { key, output } => {
            let view = previewer.preview_object(&key).await;
            emit(&view, output)
        }
        Commands::Delta { path, output } => {
            let view = previewer.preview_snapshot(&path).await;
            emit(&view, output)
        }
    }
}

fn emit(view: &ViewResult, output: OutputFormat) -> anyhow::Result<bool> {
    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(view).context("Failed to serialize view")?;
            println!("{json}");
        }
        OutputFormat::Text => match view {
            ViewResult::Error(_) => eprint!("{}", render::view_text(view)),
            _ => print!("{}", render::view_text(view)),
        },
    }
    Ok(!matches!(view, ViewResult::Error(_)))
}
