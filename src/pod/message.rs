//! Line-delimited JSON frames exchanged over the pod socket.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

use crate::errors::{ErrorKind, PodError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Op {
    Describe,
    Invoke,
}

/// One request line: `{"id": "1", "op": "invoke", "var": "find-one", "args": [...]}`.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<String>,
    pub op: Op,
    #[serde(default)]
    pub var: Option<String>,
    #[serde(default)]
    pub args: Vec<Box<RawValue>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Done,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(rename = "ex-message", default, skip_serializing_if = "Option::is_none")]
    pub ex_message: Option<String>,
    #[serde(rename = "ex-data", default, skip_serializing_if = "Option::is_none")]
    pub ex_data: Option<ErrorData>,
}

impl Response {
    #[must_use]
    pub fn done(id: Option<String>, value: Value) -> Self {
        Self { id, status: Status::Done, value: Some(value), ex_message: None, ex_data: None }
    }

    #[must_use]
    pub fn error(id: Option<String>, err: &PodError) -> Self {
        Self {
            id,
            status: Status::Error,
            value: None,
            ex_message: Some(err.to_string()),
            ex_data: Some(ErrorData { kind: err.kind() }),
        }
    }
}
