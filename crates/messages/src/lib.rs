//! JSON-RPC 2.0 messages and the `Content-Length` framing used by the Language Server Protocol.

pub mod codec;
pub mod json_rpc;
