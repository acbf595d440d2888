//! Transport collaborator
//!
//! The query layer never performs I/O itself. Every request is handed to a
//! [`Transport`] as a method plus a parameter document, and the engine's
//! response document comes back. Implementations report a missing document
//! as [`Error::NotFound`](crate::Error::NotFound).

use crate::error::Error;
use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;

/// Engine API methods the query layer dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Search,
    Get,
    Bulk,
    Index,
    Update,
    Delete,
    PutMapping,
    PutSettings,
    CreateIndex,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Search => "search",
            Method::Get => "get",
            Method::Bulk => "bulk",
            Method::Index => "index",
            Method::Update => "update",
            Method::Delete => "delete",
            Method::PutMapping => "indices.putMapping",
            Method::PutSettings => "indices.putSettings",
            Method::CreateIndex => "indices.create",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sends request documents to a search engine
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one engine call and return its response document
    async fn send(&self, method: Method, params: Value) -> Result<Value>;
}

/// Scripted in-memory transport
///
/// Records every call and answers from a queue of prepared responses.
#[derive(Default)]
pub struct MemoryTransport {
    responses: Mutex<VecDeque<Result<Value>>>,
    calls: Mutex<Vec<(Method, Value)>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response document
    pub fn push_response(&self, response: Value) -> &Self {
        self.responses.lock().push_back(Ok(response));
        self
    }

    /// Queue an error
    pub fn push_error(&self, error: Error) -> &Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    /// All calls received so far, oldest first
    pub fn calls(&self) -> Vec<(Method, Value)> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<(Method, Value)> {
        self.calls.lock().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, method: Method, params: Value) -> Result<Value> {
        self.calls.lock().push((method, params));
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Transport(format!("no response queued for {}", method))))
    }
}
