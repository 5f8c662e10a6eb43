use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use derive_more::{Display, From};
use serde::Serialize;
use tokio_util::codec::Encoder;

use crate::json_rpc::MessageGroup;

use self::payload::Payload;

use super::LanguageServerCodec;

#[derive(Debug, From, Display)]
pub enum EncodeError {
    #[display(fmt = "message is not serializable: {}", _0)]
    Serialize(serde_json::Error),
    #[display(fmt = "{}", _0)]
    Io(std::io::Error),
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Serialize(err) => Some(err),
            EncodeError::Io(err) => Some(err),
        }
    }
}

/// Frames a single message, returning the exact bytes to put on the wire.
pub fn encode_message(message: &impl Serialize) -> Result<Bytes, EncodeError> {
    Ok(Payload::try_new(message)?.into_bytes())
}

impl<M: MessageGroup> Encoder<M> for LanguageServerCodec<M> {
    type Error = EncodeError;

    fn encode(&mut self, item: M, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<Payload>::encode(self, Payload::try_new(&item)?, dst)
    }
}

/// Writes an already framed envelope as is.
impl<M: MessageGroup> Encoder<Payload> for LanguageServerCodec<M> {
    type Error = EncodeError;

    fn encode(&mut self, payload: Payload, dst: &mut BytesMut) -> Result<(), Self::Error> {
        tracing::trace!(
            content_length = payload.header.content_length,
            "Encoding message."
        );
        dst.reserve(payload.wire_len());
        let mut writer = dst.writer();
        write!(writer, "{}", payload)?;
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::json_rpc::{request::tests::INITIALIZE_REQUEST_MOCK, RequestMessage};

    use super::*;

    #[test]
    fn encodes_message() {
        let mut language_server_codec = LanguageServerCodec::<RequestMessage>::default();
        let mut message_buffer = BytesMut::new();
        language_server_codec
            .encode(INITIALIZE_REQUEST_MOCK.clone(), &mut message_buffer)
            .unwrap();

        assert_eq!(
            &Payload::try_new(&*INITIALIZE_REQUEST_MOCK)
                .unwrap()
                .to_string(),
            std::str::from_utf8(&message_buffer).unwrap()
        )
    }

    #[test]
    fn writes_framed_payload_unchanged() {
        let payload = Payload::try_new(&*INITIALIZE_REQUEST_MOCK).unwrap();
        let expected = payload.to_string();

        let mut message_buffer = BytesMut::new();
        LanguageServerCodec::<RequestMessage>::default()
            .encode(payload, &mut message_buffer)
            .unwrap();

        assert_eq!(expected.as_bytes(), &message_buffer[..])
    }

    #[test]
    fn appends_after_buffered_messages() {
        let mut language_server_codec = LanguageServerCodec::<RequestMessage>::default();
        let mut message_buffer = BytesMut::new();
        for _ in 0..2 {
            language_server_codec
                .encode(INITIALIZE_REQUEST_MOCK.clone(), &mut message_buffer)
                .unwrap();
        }

        let single_message = encode_message(&*INITIALIZE_REQUEST_MOCK).unwrap();
        assert_eq!(single_message.len() * 2, message_buffer.len());
        assert!(message_buffer.starts_with(&single_message));
        assert!(message_buffer.ends_with(&single_message));
    }

    #[test]
    fn encodes_initialize_request_exactly() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"capabilities":{}}}"#;
        let expected = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);

        assert_eq!(
            expected.as_bytes(),
            &encode_message(&*INITIALIZE_REQUEST_MOCK).unwrap()[..]
        )
    }

    #[test]
    fn counts_bytes_not_characters() {
        let message = serde_json::json!({ "method": "café" });
        let encoded = encode_message(&message).unwrap();

        // "é" takes two bytes in UTF-8.
        assert_eq!(
            b"Content-Length: 18\r\n\r\n{\"method\":\"caf\xc3\xa9\"}",
            &encoded[..]
        )
    }

    #[test]
    fn fails_on_unserializable_message() {
        let mut non_string_keys = std::collections::HashMap::new();
        non_string_keys.insert(vec![1u8], 1);
        assert!(matches!(
            encode_message(&non_string_keys),
            Err(EncodeError::Serialize(_))
        ))
    }
}

pub(crate) mod payload {
    use std::fmt::Display;

    use bytes::Bytes;
    use serde::Serialize;

    use crate::codec::headers::JsonRpcHeaders;

    /// One framed envelope: headers, blank line, body.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Payload {
        pub header: JsonRpcHeaders,
        pub body: String,
    }

    impl Payload {
        pub fn try_new(message: &impl Serialize) -> Result<Self, serde_json::Error> {
            let body = serde_json::to_string(message)?;
            Ok(Self {
                header: JsonRpcHeaders {
                    content_length: body.len(),
                },
                body,
            })
        }

        pub fn wire_len(&self) -> usize {
            self.header.to_string().len() + 2 + self.body.len()
        }

        pub fn into_bytes(self) -> Bytes {
            Bytes::from(self.to_string())
        }
    }

    impl Display for Payload {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}\r\n{}", self.header, self.body)
        }
    }

}
