use std::time::Duration;

use derive_more::{Display, From};
use tiny_lsp_messages::{
    codec::{DecodeError, EncodeError},
    json_rpc::{RequestId, ResponseError},
};

#[derive(Debug, From, Display)]
pub enum ConnectionError {
    #[display(fmt = "failed to send message: {}", _0)]
    Encode(EncodeError),
    #[display(fmt = "failed to read message: {}", _0)]
    Decode(DecodeError),
    #[from(ignore)]
    #[display(
        fmt = "server closed its output before answering request {}",
        awaiting
    )]
    Closed { awaiting: RequestId },
    #[from(ignore)]
    #[display(fmt = "no response within {:?}", _0)]
    Timeout(Duration),
    #[from(ignore)]
    #[display(fmt = "server answered with an error: {}", _0)]
    ErrorResponse(ResponseError),
    #[from(ignore)]
    #[display(fmt = "unexpected result payload: {}", _0)]
    InvalidResult(serde_json::Error),
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::Encode(err) => Some(err),
            ConnectionError::Decode(err) => Some(err),
            ConnectionError::InvalidResult(err) => Some(err),
            ConnectionError::Closed { .. }
            | ConnectionError::Timeout(_)
            | ConnectionError::ErrorResponse(_) => None,
        }
    }
}

#[derive(Debug, Display)]
pub enum ProcessError {
    #[display(fmt = "failed to spawn {:?}: {}", program, source)]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[display(fmt = "server {} is not piped", _0)]
    MissingPipe(&'static str),
    #[display(fmt = "{}", _0)]
    Io(std::io::Error),
}

impl From<std::io::Error> for ProcessError {
    fn from(err: std::io::Error) -> Self {
        ProcessError::Io(err)
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Spawn { source, .. } => Some(source),
            ProcessError::Io(err) => Some(err),
            ProcessError::MissingPipe(_) => None,
        }
    }
}

#[derive(Debug, From, Display)]
pub enum SessionError {
    #[display(fmt = "{}", _0)]
    Process(ProcessError),
    #[display(fmt = "{}", _0)]
    Connection(ConnectionError),
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Process(err) => Some(err),
            SessionError::Connection(err) => Some(err),
        }
    }
}
