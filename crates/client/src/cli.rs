use std::time::Duration;

use clap::Parser;
use derive_more::{Display, From};
use tiny_lsp_client::{ProcessError, SessionError, SessionOptions};
use tiny_lsp_messages::codec::DecoderLimits;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const SERVER_PATH_PROMPT: &str = "LSP exec path (e.g., ./zig-out/bin/tiny_zls): ";

#[derive(Parser, Debug)]
#[command(name = "tiny-lsp-client")]
#[command(about = "Send an initialize request to a language server over stdio", long_about = None)]
pub struct Cli {
    /// Language server executable, prompted for when left out.
    #[arg(env = "TINY_LSP_SERVER")]
    pub server: Option<String>,
    /// Arguments passed on to the server.
    #[arg(last = true)]
    pub server_args: Vec<String>,
    /// Send `shutdown` and `exit` after the response instead of killing the server.
    #[arg(long)]
    pub graceful: bool,
    /// Seconds to wait for each reply from the server.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
    /// Largest accepted message body in bytes.
    #[arg(long)]
    pub max_content_length: Option<usize>,
}

impl Cli {
    pub fn session_options(&self) -> SessionOptions {
        let limits = match self.max_content_length {
            Some(max_content_length) => {
                DecoderLimits::default().with_max_content_length(max_content_length)
            }
            None => DecoderLimits::default(),
        };

        SessionOptions {
            graceful: self.graceful,
            timeout: Duration::from_secs(self.timeout),
            limits,
        }
    }
}

#[derive(Debug, From, Display)]
pub enum CliError {
    #[from(ignore)]
    #[display(fmt = "no server path provided")]
    NoServerPath,
    #[display(fmt = "{}", _0)]
    Io(std::io::Error),
    #[display(fmt = "{}", _0)]
    Process(ProcessError),
    #[display(fmt = "{}", _0)]
    Session(SessionError),
    #[display(fmt = "{}", _0)]
    Json(serde_json::Error),
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::NoServerPath => None,
            CliError::Io(err) => Some(err),
            CliError::Process(err) => Some(err),
            CliError::Session(err) => Some(err),
            CliError::Json(err) => Some(err),
        }
    }
}

/// Asks for the server path on stdin.
pub async fn prompt_server_path() -> Result<String, CliError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(SERVER_PATH_PROMPT.as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;

    match answer.trim() {
        "" => Err(CliError::NoServerPath),
        server_path => Ok(server_path.to_owned()),
    }
}
