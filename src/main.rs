//! straico CLI - chat with Straico models from the terminal.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use straico::cli::{self, Cli};
use straico::format::format_error;
use straico::http::reqwest::default_dyn_transport;
use tokio::io::BufReader;
use tracing::{Level, warn};
use tracing_subscriber::EnvFilter;

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let code = runtime.block_on(run(cli));
    // A stdin read may still be parked on a blocking thread after Ctrl-C.
    runtime.shutdown_background();
    code
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let Some(mode) = cli.mode() else {
        Cli::command()
            .print_help()
            .context("Failed to print help")?;
        return Ok(ExitCode::from(2));
    };

    let transport = default_dyn_transport().context("Failed to create HTTP client")?;
    let client = match cli.build_client(transport) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{}", format_error(&err, cli.verbose));
            return Ok(ExitCode::FAILURE);
        }
    };

    let options = cli.session_options();
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    let result = cli::run(mode, &client, &options, stdin, &mut stdout, interrupted()).await;
    stdout.flush().context("Failed to flush stdout")?;

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{}", format_error(&err, cli.verbose));
            Ok(ExitCode::FAILURE)
        }
    }
}
