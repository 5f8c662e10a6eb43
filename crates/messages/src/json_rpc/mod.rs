pub mod message;
pub mod notification;
pub mod request;
pub mod response;
mod version;

use serde::{de::DeserializeOwned, Serialize};

pub use self::{
    message::Message,
    notification::NotificationMessage,
    request::{RequestId, RequestMessage},
    response::{
        response_error::{ReservedResponseErrorCodes, ResponseError, ResponseErrorCode},
        ResponseId, ResponseMessage,
    },
    version::Version,
};

/// Types that can travel as the body of a framed envelope.
pub trait MessageGroup: Serialize + DeserializeOwned {}

impl MessageGroup for Message {}
impl MessageGroup for RequestMessage {}
impl MessageGroup for ResponseMessage {}
impl MessageGroup for NotificationMessage {}
impl MessageGroup for serde_json::Value {}
