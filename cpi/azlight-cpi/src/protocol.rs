use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CLOUD_ERROR: &str = "Bosh::Clouds::CloudError";
pub const NOT_IMPLEMENTED: &str = "Bosh::Clouds::NotImplemented";
pub const INVALID_CALL: &str = "InvalidCall";

/// A CPI request as written by the director on stdin.
#[derive(Debug, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
    #[serde(default)]
    pub context: Map<String, Value>,
    pub api_version: Option<u32>,
}

impl Request {
    pub fn request_id(&self) -> &str {
        self.context
            .get("request_id")
            .and_then(Value::as_str)
            .unwrap_or("-")
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ResponseError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub ok_to_retry: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Response {
    pub result: Value,
    pub error: Option<ResponseError>,
    pub log: String,
}

impl Response {
    pub fn ok(result: Value) -> Self {
        Self {
            result,
            error: None,
            log: String::new(),
        }
    }

    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Self {
            result: Value::Null,
            error: Some(ResponseError {
                kind: kind.to_string(),
                message: message.into(),
                ok_to_retry: false,
            }),
            log: String::new(),
        }
    }
}
