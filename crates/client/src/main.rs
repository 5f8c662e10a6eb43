mod cli;

use std::process::ExitCode;

use clap::Parser;
use tiny_lsp_client::{session, ChildServer};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, CliError};

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries the exchanged messages, logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let server_path = match &cli.server {
        Some(server_path) => server_path.clone(),
        None => cli::prompt_server_path().await?,
    };

    let mut server = ChildServer::spawn(&server_path, &cli.server_args)?;
    tracing::info!(pid = ?server.id(), server = %server_path, "Spawned language server.");

    let outcome = session::initialize(&mut server, &cli.session_options(), |sent_request| {
        println!("Sent request: {}", sent_request)
    })
    .await?;

    println!(
        "Server response: {}",
        serde_json::to_string_pretty(&outcome.response)?
    );
    match outcome.exit_code {
        Some(exit_code) => println!("Server exited with code {}", exit_code),
        None => println!("Server was terminated"),
    }

    Ok(())
}
