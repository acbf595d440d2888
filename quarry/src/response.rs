//! Engine response documents
//!
//! Responses are read leniently: missing sections default to empty so that a
//! sparse reply (no aggregations, no `_source`) still interprets cleanly.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// `search` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub took: Option<u64>,
    #[serde(default)]
    pub hits: HitsResponse,
    #[serde(default)]
    pub aggregations: Map<String, Value>,
}

/// Read a response document, naming the request kind when its shape is wrong
fn interpret<T: DeserializeOwned>(kind: &str, raw: &Value) -> Result<T> {
    T::deserialize(raw).map_err(|e| Error::UnexpectedResponse(format!("{} response: {}", kind, e)))
}

impl SearchResponse {
    pub fn from_value(raw: Value) -> Result<Self> {
        interpret("search", &raw)
    }

    /// Total matching documents, 0 when the engine did not report it
    pub fn total(&self) -> u64 {
        self.hits.total.as_ref().map(TotalHits::value).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HitsResponse {
    #[serde(default)]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub max_score: Option<f64>,
    /// Raw hits, kept as-is so records can carry them as their original
    #[serde(default)]
    pub hits: Vec<Value>,
}

/// Total hits, either `{"value": n, "relation": ..}` or a bare count
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Object {
        value: u64,
        #[serde(default)]
        relation: Option<String>,
    },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Count(n) => *n,
            TotalHits::Object { value, .. } => *value,
        }
    }
}

/// Typed view of one search hit or `get` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index", default)]
    pub index: Option<String>,
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Option<Map<String, Value>>,
    #[serde(default)]
    pub highlight: Option<Value>,
}

impl Hit {
    pub fn from_raw(raw: &Value) -> Result<Self> {
        interpret("hit", raw)
    }

    /// Stored fields, empty when `_source` is absent or null
    pub fn source(&self) -> Map<String, Value> {
        self.source.clone().unwrap_or_default()
    }
}

/// `bulk` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub took: Option<u64>,
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<Value>,
}

impl BulkResponse {
    pub fn from_value(raw: Value) -> Result<Self> {
        interpret("bulk", &raw)
    }
}

/// One bulk item, keyed by the action that produced it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkItemResponse {
    #[serde(default)]
    pub index: Option<BulkItemResult>,
    #[serde(default)]
    pub create: Option<BulkItemResult>,
    #[serde(default)]
    pub update: Option<BulkItemResult>,
    #[serde(default)]
    pub delete: Option<BulkItemResult>,
}

impl BulkItemResponse {
    pub fn from_raw(raw: &Value) -> Result<Self> {
        interpret("bulk item", raw)
    }

    /// Result of whichever action this item reports
    pub fn result(&self) -> Option<&BulkItemResult> {
        self.index
            .as_ref()
            .or(self.create.as_ref())
            .or(self.update.as_ref())
            .or(self.delete.as_ref())
    }

    /// Id the engine assigned, empty when missing
    pub fn id(&self) -> String {
        self.result()
            .and_then(|r| r.id.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkItemResult {
    #[serde(rename = "_index", default)]
    pub index: Option<String>,
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// `index`, `update` and `delete` responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WriteResponse {
    #[serde(rename = "_index", default)]
    pub index: Option<String>,
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub result: Option<String>,
}

impl WriteResponse {
    pub fn from_raw(raw: &Value) -> Result<Self> {
        interpret("write", raw)
    }

    pub fn status(&self) -> WriteStatus {
        WriteStatus::parse(self.result.as_deref().unwrap_or(""))
    }
}

/// Outcome string of a write operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Created,
    Updated,
    Deleted,
    Noop,
    NotFound,
    Other(String),
}

impl WriteStatus {
    pub fn parse(result: &str) -> Self {
        match result {
            "created" => WriteStatus::Created,
            "updated" => WriteStatus::Updated,
            "deleted" => WriteStatus::Deleted,
            "noop" => WriteStatus::Noop,
            "not_found" => WriteStatus::NotFound,
            other => WriteStatus::Other(other.to_string()),
        }
    }

    /// Partial updates succeed when the document changed or was already current
    pub fn is_update_success(&self) -> bool {
        matches!(self, WriteStatus::Updated | WriteStatus::Noop)
    }
}

impl fmt::Display for WriteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStatus::Created => f.write_str("created"),
            WriteStatus::Updated => f.write_str("updated"),
            WriteStatus::Deleted => f.write_str("deleted"),
            WriteStatus::Noop => f.write_str("noop"),
            WriteStatus::NotFound => f.write_str("not_found"),
            WriteStatus::Other(s) => f.write_str(s),
        }
    }
}
