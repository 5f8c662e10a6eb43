use lsp_types::notification::Notification;
use serde::{ser::SerializeMap, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::version::Version;

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    pub method: String,
    pub params: Option<Value>,
}

impl NotificationMessage {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    pub fn typed<N: Notification>(params: N::Params) -> Result<Self, serde_json::Error> {
        let params = serde_json::to_value(params)?;
        Ok(Self::new(N::METHOD, (!params.is_null()).then_some(params)))
    }
}

impl Serialize for NotificationMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut message_map = serializer.serialize_map(Some(3))?;
        message_map.serialize_entry("jsonrpc", &Version)?;
        message_map.serialize_entry("method", &self.method)?;
        if let Some(params) = &self.params {
            message_map.serialize_entry("params", params)?;
        }
        message_map.end()
    }
}

impl<'de> Deserialize<'de> for NotificationMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct NotificationMessageDom {
            #[serde(rename = "jsonrpc")]
            _jsonrpc: Version,
            #[serde(default, deserialize_with = "present_id")]
            id: Option<Value>,
            method: String,
            params: Option<Value>,
        }

        let notification_message_dom = NotificationMessageDom::deserialize(deserializer)?;

        // An id the request shape couldn't take still marks a request, never a notification.
        if let Some(id) = notification_message_dom.id {
            return Err(serde::de::Error::custom(format!(
                "unsupported request id {}",
                id
            )));
        }

        Ok(NotificationMessage {
            method: notification_message_dom.method,
            params: notification_message_dom.params,
        })
    }
}

fn present_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}
