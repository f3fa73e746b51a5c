//! Proforma CLI - consolidate financial statements from the terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{backend, health, proxy, run};

/// Proforma - consolidate statement PDFs against a chart of accounts
#[derive(Parser)]
#[command(name = "proforma", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the consolidation backend API
    Backend {
        /// Address to listen on
        #[arg(long, env = "BACKEND_BIND", default_value = "127.0.0.1:8000")]
        bind: String,
    },

    /// Serve the same-origin proxy routes in front of a backend
    Proxy {
        /// Address to listen on
        #[arg(long, env = "PROXY_BIND", default_value = "127.0.0.1:3000")]
        bind: String,
        /// Backend origin (defaults to BACKEND_INTERNAL_URL)
        #[arg(long)]
        backend_url: Option<String>,
    },

    /// Consolidate PDFs, optionally edit the rows, and export a workbook
    Run {
        /// Statement PDFs to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Chart of accounts CSV file
        #[arg(long, conflicts_with = "coa_text")]
        coa: Option<PathBuf>,
        /// Chart of accounts CSV given inline
        #[arg(long)]
        coa_text: Option<String>,
        /// Proxy or backend origin to talk to
        #[arg(long, env = "PROFORMA_API_URL", default_value = "http://127.0.0.1:3000")]
        api_url: String,
        /// Cell edit as ROW:FIELD=VALUE (ROW is the # column), repeatable
        #[arg(long = "set", value_name = "ROW:FIELD=VALUE")]
        edits: Vec<String>,
        /// Prompt for cell edits before exporting
        #[arg(long, short)]
        interactive: bool,
        /// Directory to write the exported workbook into
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a backend is up
    Health {
        /// Backend origin (defaults to BACKEND_INTERNAL_URL)
        #[arg(long)]
        url: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let result = dispatch(cli).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so tables and JSON on stdout stay clean
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Backend { bind } => backend::run(&bind).await,
        Commands::Proxy { bind, backend_url } => proxy::run(&bind, backend_url.as_deref()).await,
        Commands::Run {
            files,
            coa,
            coa_text,
            api_url,
            edits,
            interactive,
            out,
            json,
        } => {
            run::run(run::RunArgs {
                files,
                coa,
                coa_text,
                api_url,
                edits,
                interactive,
                out,
                json,
            })
            .await
        }
        Commands::Health { url, json } => health::run(url.as_deref(), json).await,
    }
}
