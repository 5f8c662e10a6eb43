use lsp_types::{request::Request, NumberOrString};
use serde::{ser::SerializeMap, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use self::response_error::ResponseError;

use super::{request::RequestId, version::Version};

#[derive(Debug, Clone, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ResponseId {
    NumberOrString(NumberOrString),
    /// While `null` is considered a valid request ID by the JSON-RPC 2.0 specification, its use is
    /// _strongly_ discouraged because the specification also uses a `null` value to indicate an
    /// unknown ID in the [`ResponseMessage`] object.
    Null,
}

impl From<RequestId> for ResponseId {
    fn from(request_id: RequestId) -> Self {
        ResponseId::NumberOrString(request_id.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMessage {
    pub id: ResponseId,
    pub kind: Result<Value, ResponseError>,
}

impl ResponseMessage {
    pub fn ok(id: impl Into<ResponseId>, result: Value) -> Self {
        Self {
            id: id.into(),
            kind: Ok(result),
        }
    }

    pub fn error(id: impl Into<ResponseId>, error: ResponseError) -> Self {
        Self {
            id: id.into(),
            kind: Err(error),
        }
    }

    pub fn is_response_to(&self, request_id: &RequestId) -> bool {
        matches!(&self.id, ResponseId::NumberOrString(id) if id == &**request_id)
    }

    /// Interprets the result as the one declared for `R`.
    pub fn into_typed<R: Request>(
        self,
    ) -> Result<Result<R::Result, ResponseError>, serde_json::Error> {
        match self.kind {
            Ok(value) => serde_json::from_value(value).map(Ok),
            Err(err) => Ok(Err(err)),
        }
    }
}

impl Serialize for ResponseMessage {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut message_map = serializer.serialize_map(Some(3))?;
        message_map.serialize_entry("jsonrpc", &Version)?;
        message_map.serialize_entry("id", &self.id)?;
        match &self.kind {
            Ok(value) => message_map.serialize_entry("result", value)?,
            Err(err) => message_map.serialize_entry("error", err)?,
        }
        message_map.end()
    }
}

impl<'de> Deserialize<'de> for ResponseMessage {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ResponseMessageDom {
            #[serde(rename = "jsonrpc")]
            _jsonrpc: Version,
            id: ResponseId,
            #[serde(default, deserialize_with = "present_value")]
            result: Option<Value>,
            error: Option<ResponseError>,
        }

        let response_message_dom = ResponseMessageDom::deserialize(deserializer)?;

        let kind = match (response_message_dom.result, response_message_dom.error) {
            (Some(value), None) => Ok(value),
            (None, Some(err)) => Err(err),
            (Some(_), Some(_)) => {
                return Err(serde::de::Error::custom(
                    "response contains both a result and an error",
                ))
            }
            (None, None) => {
                return Err(serde::de::Error::custom(
                    "response contains neither a result nor an error",
                ))
            }
        };

        Ok(ResponseMessage {
            id: response_message_dom.id,
            kind,
        })
    }
}

// `"result": null` is a successful response, so presence must be told apart from null.
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}


pub mod response_error {
    use std::fmt::Display;

    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use serde_repr::{Deserialize_repr, Serialize_repr};
    use strum::FromRepr;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct ResponseError {
        pub code: ResponseErrorCode,
        pub message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub data: Option<Value>,
    }

    impl ResponseError {
        pub fn new(code: ResponseErrorCode, message: impl Into<String>) -> Self {
            Self {
                code,
                message: message.into(),
                data: None,
            }
        }
    }

    impl Display for ResponseError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{} (code {})", self.message, self.code.code())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, FromRepr)]
    #[repr(i64)]
    pub enum ReservedResponseErrorCodes {
        ParseError = json_rpc_error_codes::PARSE_ERROR,
        InvalidRequest = json_rpc_error_codes::INVALID_REQUEST,
        MethodNotFound = json_rpc_error_codes::METHOD_NOT_FOUND,
        InvalidParams = json_rpc_error_codes::INVALID_PARAMS,
        InternalError = json_rpc_error_codes::INTERNAL_ERROR,
        ServerNotInitialized = lsp_error_codes::SERVER_NOT_INITIALIZED,
        UnknownErrorCode = lsp_error_codes::UNKNOWN_ERROR_CODE,
        RequestFailed = lsp_error_codes::REQUEST_FAILED,
        ServerCancelled = lsp_error_codes::SERVER_CANCELLED,
        ContentModified = lsp_error_codes::CONTENT_MODIFIED,
        RequestCancelled = lsp_error_codes::REQUEST_CANCELLED,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ResponseErrorCode {
        Reserved(ReservedResponseErrorCodes),
        Other(i64),
    }

    impl ResponseErrorCode {
        pub fn code(&self) -> i64 {
            match self {
                ResponseErrorCode::Reserved(reserved_code) => *reserved_code as i64,
                ResponseErrorCode::Other(other) => *other,
            }
        }
    }

    impl From<ReservedResponseErrorCodes> for ResponseErrorCode {
        fn from(reserved_code: ReservedResponseErrorCodes) -> Self {
            ResponseErrorCode::Reserved(reserved_code)
        }
    }

    impl Serialize for ResponseErrorCode {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            match self {
                ResponseErrorCode::Reserved(reserved_code) => reserved_code.serialize(serializer),
                ResponseErrorCode::Other(other) => serializer.serialize_i64(*other),
            }
        }
    }

    impl<'de> Deserialize<'de> for ResponseErrorCode {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            i64::deserialize(deserializer).map(|code| {
                ReservedResponseErrorCodes::from_repr(code)
                    .map(Self::Reserved)
                    .unwrap_or(Self::Other(code))
            })
        }
    }

    mod json_rpc_error_codes {
        pub const PARSE_ERROR: i64 = -32700;
        pub const INVALID_REQUEST: i64 = -32600;
        pub const METHOD_NOT_FOUND: i64 = -32601;
        pub const INVALID_PARAMS: i64 = -32602;
        pub const INTERNAL_ERROR: i64 = -32603;
    }

    mod lsp_error_codes {
        pub const SERVER_NOT_INITIALIZED: i64 = -32002;
        pub const UNKNOWN_ERROR_CODE: i64 = -32001;
        pub const REQUEST_FAILED: i64 = -32803;
        pub const SERVER_CANCELLED: i64 = -32802;
        pub const CONTENT_MODIFIED: i64 = -32801;
        pub const REQUEST_CANCELLED: i64 = -32800;
    }

}
