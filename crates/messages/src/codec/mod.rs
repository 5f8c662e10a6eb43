mod decode;
mod encode;
mod headers;
mod limits;

pub use decode::{DecodeError, DecodeState};
pub use encode::{encode_message, payload::Payload, EncodeError};
pub use headers::{FramingError, HeadersParseError, JsonRpcHeaders};
pub use limits::{DecoderLimits, LimitKind};

use std::marker::PhantomData;

use crate::json_rpc::MessageGroup;

/// Encoder and incremental decoder for `Content-Length` framed messages.
///
/// The decoder is an accumulator: feed it whatever bytes have arrived and it yields a message
/// once a complete envelope is buffered, leaving any bytes of the following message in place.
pub struct LanguageServerCodec<M: MessageGroup> {
    state: DecodeState,
    limits: DecoderLimits,
    marker: PhantomData<M>,
}

impl<M: MessageGroup> LanguageServerCodec<M> {
    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self {
            state: DecodeState::AwaitingHeader,
            limits,
            marker: PhantomData,
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn limits(&self) -> DecoderLimits {
        self.limits
    }

    /// Forgets any partially decoded envelope, also leaving the desynchronized state.
    pub fn reset(&mut self) {
        self.state = DecodeState::AwaitingHeader;
    }
}

impl<M: MessageGroup> Default for LanguageServerCodec<M> {
    fn default() -> Self {
        Self::with_limits(DecoderLimits::default())
    }
}
