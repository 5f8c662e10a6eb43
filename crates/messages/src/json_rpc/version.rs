use serde::{de::Unexpected, Deserialize, Serialize};

const JSON_RPC_VERSION: &str = "2.0";

/// The `"jsonrpc": "2.0"` member every message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Version;

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(JSON_RPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        match version == JSON_RPC_VERSION {
            true => Ok(Version),
            false => Err(serde::de::Error::invalid_value(
                Unexpected::Str(&version),
                &JSON_RPC_VERSION,
            )),
        }
    }
}
