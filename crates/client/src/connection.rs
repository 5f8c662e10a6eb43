use std::time::Duration;

use bytes::BytesMut;
use futures::SinkExt;
use lsp_types::{
    notification::{Exit, Notification},
    request::{Request, Shutdown},
};
use serde_json::Value;
use tiny_lsp_messages::{
    codec::{DecodeError, DecoderLimits, EncodeError, LanguageServerCodec, Payload},
    json_rpc::{
        Message, NotificationMessage, RequestId, RequestMessage, ReservedResponseErrorCodes,
        ResponseError, ResponseId, ResponseMessage,
    },
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio_util::codec::{Decoder, FramedWrite};

use crate::error::ConnectionError;

const READ_CHUNK_BYTES: usize = 8 * 1024;

type FramedOutput<W> = FramedWrite<W, LanguageServerCodec<Message>>;

/// A JSON-RPC session with a peer over a pair of byte streams.
///
/// Requests are answered one at a time: [`Connection::call`] reads until the response carrying
/// the request id arrives, logging notifications and answering peer requests on the way.
pub struct Connection<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> {
    reader: R,
    read_buffer: BytesMut,
    codec: LanguageServerCodec<Message>,
    reached_eof: bool,
    framed_output: FramedOutput<W>,
    next_request_id: i32,
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Connection<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_limits(reader, writer, DecoderLimits::default())
    }

    pub fn with_limits(reader: R, writer: W, limits: DecoderLimits) -> Self {
        Self {
            reader,
            read_buffer: BytesMut::new(),
            codec: LanguageServerCodec::with_limits(limits),
            reached_eof: false,
            framed_output: FramedWrite::new(writer, LanguageServerCodec::with_limits(limits)),
            next_request_id: 1,
        }
    }

    /// Allocates the id for the next outgoing request.
    pub fn next_request_id(&mut self) -> RequestId {
        let request_id = RequestId::from(self.next_request_id);
        self.next_request_id += 1;
        request_id
    }

    pub async fn send(&mut self, message: Message) -> Result<(), ConnectionError> {
        tracing::debug!(?message, "Writing message to peer.");
        self.framed_output.send(message).await?;
        Ok(())
    }

    /// Writes an already framed envelope, so callers know the exact bytes sent.
    pub async fn send_payload(&mut self, payload: Payload) -> Result<(), ConnectionError> {
        tracing::debug!(content_length = payload.header.content_length, "Writing payload to peer.");
        self.framed_output.send(payload).await?;
        Ok(())
    }

    pub async fn send_request(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<RequestId, ConnectionError> {
        let request_id = self.next_request_id();
        self.send(RequestMessage::new(request_id.clone(), method, params).into())
            .await?;
        Ok(request_id)
    }

    pub async fn send_notification(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), ConnectionError> {
        self.send(NotificationMessage::new(method, params).into())
            .await
    }

    pub async fn notify<N: Notification>(
        &mut self,
        params: N::Params,
    ) -> Result<(), ConnectionError> {
        let notification = NotificationMessage::typed::<N>(params).map_err(|err| {
            ConnectionError::Encode(EncodeError::Serialize(err))
        })?;
        self.send(notification.into()).await
    }

    /// Reads the next message from the peer.
    ///
    /// Returns `Ok(None)` once the peer closed its output and every buffered message was handed
    /// out. Messages whose body can't be decoded are logged and skipped, framing errors are
    /// returned since the position of the next message is unknown.
    pub async fn next_message(&mut self) -> Result<Option<Message>, ConnectionError> {
        loop {
            let decode_attempt = match self.reached_eof {
                true => self.codec.decode_eof(&mut self.read_buffer),
                false => self.codec.decode(&mut self.read_buffer),
            };

            match decode_attempt {
                Ok(Some(message)) => {
                    tracing::debug!(?message, "Read message from peer.");
                    return Ok(Some(message));
                }
                Ok(None) if self.reached_eof => return Ok(None),
                Ok(None) => {}
                Err(decode_error) if decode_error.is_recoverable() => {
                    tracing::warn!(%decode_error, "Skipping undecodable message.");
                    continue;
                }
                Err(decode_error) => return Err(decode_error.into()),
            }

            self.read_buffer.reserve(READ_CHUNK_BYTES);
            let bytes_read = self
                .reader
                .read_buf(&mut self.read_buffer)
                .await
                .map_err(DecodeError::Io)?;
            if bytes_read == 0 {
                tracing::debug!(buffered = self.read_buffer.len(), "Peer closed its output.");
                self.reached_eof = true;
            }
        }
    }

    /// Sends `request` and waits for its response.
    pub async fn call(
        &mut self,
        request: RequestMessage,
    ) -> Result<ResponseMessage, ConnectionError> {
        let request_id = request.id.clone();
        self.send(request.into()).await?;
        self.await_response(request_id).await
    }

    /// Reads until the response to the request in flight arrives.
    ///
    /// An error response with a `null` id is taken as the answer, the peer couldn't read the id
    /// of the only outstanding request.
    pub async fn await_response(
        &mut self,
        request_id: RequestId,
    ) -> Result<ResponseMessage, ConnectionError> {
        while let Some(message) = self.next_message().await? {
            match message {
                Message::Response(response) if response.is_response_to(&request_id) => {
                    return Ok(response)
                }
                Message::Response(ResponseMessage {
                    id: ResponseId::Null,
                    kind: Err(response_error),
                }) => return Err(ConnectionError::ErrorResponse(response_error)),
                Message::Response(response) => {
                    tracing::warn!(id = ?response.id, "Ignoring response to an unknown request.")
                }
                Message::Notification(notification) => {
                    tracing::info!(
                        method = %notification.method,
                        params = ?notification.params,
                        "Received notification."
                    )
                }
                Message::Request(peer_request) => {
                    tracing::warn!(
                        method = %peer_request.method,
                        "Declining request from peer."
                    );
                    let method_not_found = ResponseMessage::error(
                        peer_request.id,
                        ResponseError::new(
                            ReservedResponseErrorCodes::MethodNotFound.into(),
                            format!("{} is not supported by this client", peer_request.method),
                        ),
                    );
                    self.send(method_not_found.into()).await?;
                }
            }
        }

        Err(ConnectionError::Closed {
            awaiting: request_id,
        })
    }

    pub async fn call_with_timeout(
        &mut self,
        request: RequestMessage,
        timeout: Duration,
    ) -> Result<ResponseMessage, ConnectionError> {
        tokio::time::timeout(timeout, self.call(request))
            .await
            .map_err(|_| ConnectionError::Timeout(timeout))?
    }

    pub async fn request(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<ResponseMessage, ConnectionError> {
        let request = RequestMessage::new(self.next_request_id(), method, params);
        self.call(request).await
    }

    /// Sends a request known to `lsp_types`, turning an error response into
    /// [`ConnectionError::ErrorResponse`].
    pub async fn request_typed<Q: Request>(
        &mut self,
        params: Q::Params,
    ) -> Result<Q::Result, ConnectionError> {
        let request = RequestMessage::typed::<Q>(self.next_request_id(), params).map_err(|err| {
            ConnectionError::Encode(EncodeError::Serialize(err))
        })?;

        self.call(request)
            .await?
            .into_typed::<Q>()
            .map_err(ConnectionError::InvalidResult)?
            .map_err(ConnectionError::ErrorResponse)
    }

    /// Asks the server to shut down, tells it to exit and closes its input.
    pub async fn shutdown(&mut self) -> Result<(), ConnectionError> {
        self.request_typed::<Shutdown>(()).await?;
        self.notify::<Exit>(()).await?;
        self.close().await
    }

    /// Flushes and closes the writing half; reading stays possible.
    pub async fn close(&mut self) -> Result<(), ConnectionError> {
        SinkExt::<Message>::close(&mut self.framed_output).await?;
        Ok(())
    }
}
