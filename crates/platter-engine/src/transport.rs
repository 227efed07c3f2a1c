//! The transport boundary.
//!
//! The engine never speaks HTTP itself. It hands a fully resolved
//! request to a `Transport` implementation and interprets the reply.
//! Rejections propagate as-is; the only requirement on a failure is a
//! human-readable message.

use crate::error::EngineError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Request method. Bodies are attached only for `Post`, `Put`, `Patch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    /// Parse a method name (case-insensitive). Anything outside the
    /// supported set is a configuration error.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            other => Err(EngineError::configuration(format!(
                "invalid method `{other}`"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    /// Whether a resolved `data` value rides along as the request body.
    pub fn takes_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl Default for Method {
    fn default() -> Self {
        Self::Get
    }
}

/// Request configuration handed to the transport, after any `pre_req`
/// rewrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub headers: BTreeMap<String, String>,
}

impl RequestConfig {
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// One fully resolved outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub config: RequestConfig,
}

/// A successful transport reply: the response body.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportReply {
    pub data: Value,
}

/// Transport failure. Shape is implementation-defined beyond the message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External collaborator performing the actual network call.
///
/// Runs on one logical thread; implementations need not be `Send`.
#[async_trait(?Send)]
pub trait Transport {
    async fn invoke(&self, request: TransportRequest) -> Result<TransportReply, TransportError>;
}
