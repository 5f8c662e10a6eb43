use bytes::{Buf, BytesMut};
use derive_more::{Display, From};
use tokio_util::codec::Decoder;

use crate::json_rpc::MessageGroup;

use super::{
    headers::{find_header_end, FramingError, JsonRpcHeaders},
    limits::LimitKind,
    LanguageServerCodec,
};

const BODY_SNIPPET_BYTES: usize = 128;

#[derive(Debug, From, Display)]
pub enum DecodeError {
    #[display(fmt = "{}", _0)]
    Io(std::io::Error),
    #[display(fmt = "{}", _0)]
    Framing(FramingError),
    #[from(ignore)]
    #[display(fmt = "decoder is desynchronized after a framing error")]
    Desynchronized,
    #[from(ignore)]
    #[display(fmt = "invalid message body {:?}: {}", snippet, source)]
    Deserialize {
        snippet: String,
        source: serde_json::Error,
    },
    #[from(ignore)]
    #[display(fmt = "{} of {} bytes exceeds the limit of {} bytes", kind, size, limit)]
    ResourceLimit {
        kind: LimitKind,
        size: usize,
        limit: usize,
    },
    #[from(ignore)]
    #[display(fmt = "stream ended while {} with {} bytes buffered", state, buffered)]
    Truncated {
        state: DecodeState,
        buffered: usize,
    },
}

impl DecodeError {
    /// Whether the decoder still knows where the next message starts.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DecodeError::Deserialize { .. }
                | DecodeError::ResourceLimit {
                    kind: LimitKind::Body,
                    ..
                }
        )
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Io(err) => Some(err),
            DecodeError::Framing(err) => Some(err),
            DecodeError::Deserialize { source, .. } => Some(source),
            DecodeError::Desynchronized
            | DecodeError::ResourceLimit { .. }
            | DecodeError::Truncated { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum DecodeState {
    #[default]
    #[display(fmt = "awaiting header")]
    AwaitingHeader,
    #[display(fmt = "awaiting a body of {} bytes", content_length)]
    AwaitingBody { content_length: usize },
    #[display(fmt = "discarding {} bytes of an oversized body", remaining)]
    Discarding { remaining: usize },
    #[display(fmt = "desynchronized")]
    Desynchronized,
}

impl<M: MessageGroup> Decoder for LanguageServerCodec<M> {
    type Item = M;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                DecodeState::AwaitingHeader => {
                    let Some(header_end) = find_header_end(src) else {
                        return self.check_header_size(src.len()).map(|_| None);
                    };
                    self.check_header_size(header_end)?;

                    let header_block = src.split_to(header_end);
                    let content_length = match JsonRpcHeaders::parse(&header_block) {
                        Ok(headers) => headers.content_length,
                        Err(framing_error) => {
                            tracing::debug!(%framing_error, "Lost message boundary.");
                            self.state = DecodeState::Desynchronized;
                            return Err(framing_error.into());
                        }
                    };

                    if content_length > self.limits.max_content_length {
                        self.state = DecodeState::Discarding {
                            remaining: content_length,
                        };
                        return Err(DecodeError::ResourceLimit {
                            kind: LimitKind::Body,
                            size: content_length,
                            limit: self.limits.max_content_length,
                        });
                    }

                    tracing::trace!(content_length, "Parsed message headers.");
                    self.state = DecodeState::AwaitingBody { content_length };
                }
                DecodeState::AwaitingBody { content_length } => {
                    if src.len() < content_length {
                        src.reserve(content_length - src.len());
                        return Ok(None);
                    }

                    let body = src.split_to(content_length);
                    self.state = DecodeState::AwaitingHeader;

                    return serde_json::from_slice::<M>(&body).map(Some).map_err(|source| {
                        DecodeError::Deserialize {
                            snippet: body_snippet(&body),
                            source,
                        }
                    });
                }
                DecodeState::Discarding { remaining } => {
                    let discarded = remaining.min(src.len());
                    src.advance(discarded);
                    if discarded < remaining {
                        self.state = DecodeState::Discarding {
                            remaining: remaining - discarded,
                        };
                        return Ok(None);
                    }
                    self.state = DecodeState::AwaitingHeader;
                }
                DecodeState::Desynchronized => return Err(DecodeError::Desynchronized),
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(buf)? {
            return Ok(Some(message));
        }

        match self.state {
            DecodeState::AwaitingHeader if buf.is_empty() => Ok(None),
            state => Err(DecodeError::Truncated {
                state,
                buffered: buf.len(),
            }),
        }
    }
}

impl<M: MessageGroup> LanguageServerCodec<M> {
    fn check_header_size(&mut self, header_size: usize) -> Result<(), DecodeError> {
        if header_size <= self.limits.max_header_bytes {
            return Ok(());
        }

        self.state = DecodeState::Desynchronized;
        Err(DecodeError::ResourceLimit {
            kind: LimitKind::HeaderBlock,
            size: header_size,
            limit: self.limits.max_header_bytes,
        })
    }
}

fn body_snippet(body: &[u8]) -> String {
    String::from_utf8_lossy(&body[..body.len().min(BODY_SNIPPET_BYTES)]).into_owned()
}
