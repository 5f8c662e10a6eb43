use std::fmt::Display;

use derive_more::{Deref, From, Into};
use lsp_types::{request::Request, NumberOrString};
use serde::{ser::SerializeMap, Deserialize, Serialize};
use serde_json::Value;

use super::version::Version;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Deref, From, Into)]
#[serde(transparent)]
pub struct RequestId(NumberOrString);

impl From<i32> for RequestId {
    fn from(number: i32) -> Self {
        RequestId(NumberOrString::Number(number))
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            NumberOrString::Number(number) => write!(f, "{}", number),
            NumberOrString::String(string) => write!(f, "{:?}", string),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestMessage {
    pub id: RequestId,
    pub method: String,
    pub params: Option<Value>,
}

impl RequestMessage {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Builds a request for a method known to `lsp_types`. Params serializing to
    /// `null` are left out of the message.
    pub fn typed<R: Request>(
        id: impl Into<RequestId>,
        params: R::Params,
    ) -> Result<Self, serde_json::Error> {
        let params = serde_json::to_value(params)?;
        Ok(Self::new(id, R::METHOD, (!params.is_null()).then_some(params)))
    }
}

impl Serialize for RequestMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut message_map = serializer.serialize_map(Some(4))?;
        message_map.serialize_entry("jsonrpc", &Version)?;
        message_map.serialize_entry("id", &self.id)?;
        message_map.serialize_entry("method", &self.method)?;
        if let Some(params) = &self.params {
            message_map.serialize_entry("params", params)?;
        }
        message_map.end()
    }
}

impl<'de> Deserialize<'de> for RequestMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RequestMessageDom {
            #[serde(rename = "jsonrpc")]
            _jsonrpc: Version,
            id: RequestId,
            method: String,
            params: Option<Value>,
        }

        let request_message_dom = RequestMessageDom::deserialize(deserializer)?;

        Ok(RequestMessage {
            id: request_message_dom.id,
            method: request_message_dom.method,
            params: request_message_dom.params,
        })
    }
}

#[cfg(test)]
pub mod tests {
    use lsp_types::request::{Initialize, Shutdown};
    use once_cell::sync::Lazy;
    use serde_json::json;

    use super::*;

    pub static INITIALIZE_REQUEST_MOCK: Lazy<RequestMessage> = Lazy::new(|| {
        RequestMessage::new(1, Initialize::METHOD, Some(json!({ "capabilities": {} })))
    });

    static INITIALIZE_REQUEST_JSON: Lazy<Value> = Lazy::new(|| {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": { "capabilities": {} }
        })
    });

    #[test]
    fn serializes_request_message() {
        assert_eq!(
            *INITIALIZE_REQUEST_JSON,
            serde_json::to_value(&*INITIALIZE_REQUEST_MOCK).unwrap()
        )
    }

    #[test]
    fn deserializes_request_message() {
        assert_eq!(
            *INITIALIZE_REQUEST_MOCK,
            serde_json::from_value::<RequestMessage>(INITIALIZE_REQUEST_JSON.clone()).unwrap()
        )
    }

    #[test]
    fn serializes_members_in_protocol_order() {
        assert_eq!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"capabilities":{}}}"#,
            serde_json::to_string(&*INITIALIZE_REQUEST_MOCK).unwrap()
        )
    }

    #[test]
    fn omits_null_params_of_typed_requests() {
        let shutdown_request = RequestMessage::typed::<Shutdown>(0, ()).unwrap();
        assert_eq!(
            json!({ "jsonrpc": "2.0", "id": 0, "method": "shutdown" }),
            serde_json::to_value(shutdown_request).unwrap()
        )
    }

    #[test]
    fn displays_string_ids_quoted() {
        let request_id = RequestId::from(NumberOrString::String("abc".to_owned()));
        assert_eq!("\"abc\"", request_id.to_string());
        assert_eq!("7", RequestId::from(7).to_string());
    }
}
