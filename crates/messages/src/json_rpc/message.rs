use derive_more::From;
use serde::{Deserialize, Serialize};

use super::{
    notification::NotificationMessage, request::RequestMessage, response::ResponseMessage,
};

/// Any JSON-RPC message, told apart by which members it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
#[serde(untagged)]
pub enum Message {
    Request(RequestMessage),
    Response(ResponseMessage),
    Notification(NotificationMessage),
}

impl Message {
    pub fn method(&self) -> Option<&str> {
        match self {
            Message::Request(request) => Some(&request.method),
            Message::Notification(notification) => Some(&notification.method),
            Message::Response(_) => None,
        }
    }
}

#[cfg(test)]
pub mod tests {
    use serde_json::json;

    use crate::json_rpc::{
        request::tests::INITIALIZE_REQUEST_MOCK, response::tests::SHUTDOWN_RESPONSE_MOCK,
    };

    use super::*;

    #[test]
    fn deserializes_request() {
        let message = serde_json::from_value::<Message>(
            serde_json::to_value(&*INITIALIZE_REQUEST_MOCK).unwrap(),
        )
        .unwrap();
        assert_eq!(Message::Request(INITIALIZE_REQUEST_MOCK.clone()), message)
    }

    #[test]
    fn deserializes_response() {
        let message = serde_json::from_value::<Message>(
            serde_json::to_value(&*SHUTDOWN_RESPONSE_MOCK).unwrap(),
        )
        .unwrap();
        assert_eq!(Message::Response(SHUTDOWN_RESPONSE_MOCK.clone()), message)
    }

    #[test]
    fn deserializes_notification() {
        let message =
            serde_json::from_value::<Message>(json!({ "jsonrpc": "2.0", "method": "initialized", "params": {} }))
                .unwrap();
        assert_eq!(
            Message::Notification(NotificationMessage::new("initialized", Some(json!({})))),
            message
        )
    }

    #[test]
    fn never_mistakes_requests_for_notifications() {
        for id in [json!(3_000_000_000u64), json!(null), json!(true), json!(1.5)] {
            let message = serde_json::from_value::<Message>(json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": "workspace/configuration",
                "params": {}
            }));
            assert!(message.is_err(), "id {} decoded as {:?}", id, message)
        }
    }

    #[test]
    fn rejects_foreign_json_rpc_version() {
        assert!(serde_json::from_value::<Message>(
            json!({ "jsonrpc": "1.0", "id": 1, "method": "initialize" })
        )
        .is_err())
    }
}
