//! Starts a language server and talks to it over its standard streams.

pub mod connection;
pub mod error;
pub mod process;
pub mod session;

pub use connection::Connection;
pub use error::{ConnectionError, ProcessError, SessionError};
pub use process::{ChildServer, ServerProcess};
pub use session::{SessionOptions, SessionOutcome};
