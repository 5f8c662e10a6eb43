use std::time::Duration;

use lsp_types::request::{Initialize, Request};
use serde_json::json;
use tiny_lsp_messages::{
    codec::{DecoderLimits, EncodeError, Payload},
    json_rpc::{RequestMessage, ResponseMessage},
};

use crate::{
    connection::Connection,
    error::{ConnectionError, SessionError},
    process::ServerProcess,
};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Send `shutdown` and `exit` instead of killing the server.
    pub graceful: bool,
    /// Upper bound for each wait on the server.
    pub timeout: Duration,
    pub limits: DecoderLimits,
}

impl SessionOptions {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            graceful: false,
            timeout: Self::DEFAULT_TIMEOUT,
            limits: DecoderLimits::default(),
        }
    }
}

#[derive(Debug)]
pub struct SessionOutcome {
    /// The request exactly as written to the server.
    pub sent_request: String,
    pub response: ResponseMessage,
    /// `None` when the server was terminated by a signal.
    pub exit_code: Option<i32>,
}

/// Performs a single `initialize` exchange with `server` and stops it afterwards.
///
/// `on_sent` sees the request text as soon as it was written, before any reply.
pub async fn initialize<P: ServerProcess>(
    server: &mut P,
    options: &SessionOptions,
    on_sent: impl FnOnce(&str),
) -> Result<SessionOutcome, SessionError> {
    let (stdout, stdin) = server.take_stdio()?;
    let mut connection = Connection::with_limits(stdout, stdin, options.limits);

    let request = RequestMessage::new(
        connection.next_request_id(),
        Initialize::METHOD,
        Some(json!({ "capabilities": {} })),
    );
    let payload = Payload::try_new(&request)
        .map_err(|err| ConnectionError::Encode(EncodeError::Serialize(err)))?;
    let sent_request = payload.to_string();

    tracing::info!(id = %request.id, "Sending initialize request.");
    connection.send_payload(payload).await?;
    on_sent(&sent_request);

    let response = tokio::time::timeout(options.timeout, connection.await_response(request.id))
        .await
        .map_err(|_| ConnectionError::Timeout(options.timeout))??;

    let exit_code = match options.graceful {
        true => {
            tokio::time::timeout(options.timeout, connection.shutdown())
                .await
                .map_err(|_| ConnectionError::Timeout(options.timeout))??;
            drop(connection);

            match tokio::time::timeout(options.timeout, server.wait()).await {
                Ok(exit_code) => exit_code?,
                Err(_) => {
                    tracing::warn!("Server did not exit after the exit notification, killing it.");
                    server.kill().await?;
                    server.wait().await?
                }
            }
        }
        false => {
            server.kill().await?;
            server.wait().await?
        }
    };

    Ok(SessionOutcome {
        sent_request,
        response,
        exit_code,
    })
}
