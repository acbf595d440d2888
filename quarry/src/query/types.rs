//! Request document types
//!
//! These types make up the search request the builder compiles and hands to
//! the transport. They serialize to the engine's Query DSL shape.

use crate::query::operator::Bucket;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Root search request handed to the transport as `search` parameters
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub index: String,

    /// Zero-based offset of the first hit
    pub from: usize,

    /// Maximum number of hits
    pub size: usize,

    /// Track total hits exactly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_total_hits: Option<TrackTotalHits>,

    pub body: SearchBody,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TrackTotalHits {
    Bool(bool),
    Count(usize),
}

/// Search body: query plus shaping
#[derive(Debug, Clone, Serialize)]
pub struct SearchBody {
    pub query: Value,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortClause>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,

    /// Fields to return in _source
    #[serde(rename = "_source", skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<String>,

    #[serde(skip_serializing_if = "Map::is_empty")]
    pub aggs: Map<String, Value>,
}

/// Highlighting configuration, field name to per-field options
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Highlight {
    pub fields: Map<String, Value>,
}

impl Highlight {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn from_desc(desc: bool) -> Self {
        if desc {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// A single sort directive. Order within the sort list is significant.
#[derive(Debug, Clone, PartialEq)]
pub enum SortClause {
    /// `{field: {"order": .., ..options}}`
    Field {
        field: String,
        order: SortOrder,
        options: Map<String, Value>,
    },
    /// Distance from a reference point, in metres
    GeoDistance {
        field: String,
        lat: f64,
        lon: f64,
        order: SortOrder,
    },
    /// Numeric painless script evaluated per document
    Script {
        source: String,
        params: Map<String, Value>,
        order: SortOrder,
    },
    /// Caller-supplied directive, emitted as is
    Raw(Value),
}

impl SortClause {
    pub fn to_value(&self) -> Value {
        match self {
            SortClause::Field {
                field,
                order,
                options,
            } => {
                let mut spec = Map::new();
                spec.insert("order".to_string(), json!(order.as_str()));
                for (key, value) in options {
                    spec.insert(key.clone(), value.clone());
                }
                json!({ field: spec })
            }
            SortClause::GeoDistance {
                field,
                lat,
                lon,
                order,
            } => json!({
                "_geo_distance": {
                    field: {"lat": lat, "lon": lon},
                    "order": order.as_str(),
                    "unit": "m"
                }
            }),
            SortClause::Script {
                source,
                params,
                order,
            } => json!({
                "_script": {
                    "script": {
                        "lang": "painless",
                        "params": params,
                        "source": source
                    },
                    "type": "number",
                    "order": order.as_str()
                }
            }),
            SortClause::Raw(value) => value.clone(),
        }
    }
}

impl Serialize for SortClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Aggregation specifications registered on a builder
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Bucket documents by distinct values of `field`
    Terms { field: String, size: Option<usize> },
    /// Caller-supplied aggregation body
    Raw(Value),
}

impl Aggregation {
    pub fn terms(field: impl Into<String>) -> Self {
        Aggregation::Terms {
            field: field.into(),
            size: None,
        }
    }

    pub fn terms_with_size(field: impl Into<String>, size: usize) -> Self {
        Aggregation::Terms {
            field: field.into(),
            size: Some(size),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Aggregation::Terms { field, size } => {
                let mut terms = Map::new();
                terms.insert("field".to_string(), json!(field));
                if let Some(size) = size {
                    terms.insert("size".to_string(), json!(size));
                }
                json!({ "terms": terms })
            }
            Aggregation::Raw(value) => value.clone(),
        }
    }
}

/// Four-bucket bool container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Value>,
    pub must_not: Vec<Value>,
    pub filter: Vec<Value>,
    pub should: Vec<Value>,
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    pub fn push(&mut self, bucket: Bucket, clause: Value) {
        match bucket {
            Bucket::Must => self.must.push(clause),
            Bucket::MustNot => self.must_not.push(clause),
            Bucket::Filter => self.filter.push(clause),
            Bucket::Should => {
                self.should.push(clause);
                self.minimum_should_match.get_or_insert(1);
            }
        }
    }

    pub fn bucket(&self, bucket: Bucket) -> &[Value] {
        match bucket {
            Bucket::Must => &self.must,
            Bucket::MustNot => &self.must_not,
            Bucket::Filter => &self.filter,
            Bucket::Should => &self.should,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
            && self.should.is_empty()
    }

    /// Bool document with empty buckets left out
    pub fn to_value(&self) -> Value {
        let mut container = Map::new();
        for bucket in [Bucket::Must, Bucket::MustNot, Bucket::Filter, Bucket::Should] {
            let clauses = self.bucket(bucket);
            if !clauses.is_empty() {
                container.insert(bucket.as_str().to_string(), Value::Array(clauses.to_vec()));
            }
        }
        if !self.should.is_empty() {
            if let Some(min) = self.minimum_should_match {
                container.insert("minimum_should_match".to_string(), json!(min));
            }
        }
        Value::Object(container)
    }
}

/// Accumulated query state of a builder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBody {
    pub bool_query: BoolQuery,
    /// `match` leaves, one per field
    pub matches: Map<String, Value>,
    /// `match_phrase` leaves, one per field
    pub match_phrases: Map<String, Value>,
    /// Function-score envelope around the compiled query
    pub function_score: Option<Map<String, Value>>,
}

impl QueryBody {
    /// True when no predicate of any kind has been added
    pub fn is_empty(&self) -> bool {
        self.bool_query.is_empty()
            && self.matches.is_empty()
            && self.match_phrases.is_empty()
            && self.function_score.is_none()
    }

    /// Compile to a query document; an empty body compiles to `match_all`.
    ///
    /// A lone `match`/`match_phrase` leaf is the query itself. Otherwise every
    /// leaf joins the bool tree's `must` so the root keeps a single clause.
    pub fn compile(&self) -> Value {
        let leaves = self
            .matches
            .iter()
            .map(|(field, value)| json!({"match": {field.as_str(): value}}))
            .chain(
                self.match_phrases
                    .iter()
                    .map(|(field, value)| json!({"match_phrase": {field.as_str(): value}})),
            )
            .collect::<Vec<_>>();

        let inner = if self.bool_query.is_empty() && leaves.len() <= 1 {
            leaves.into_iter().next().unwrap_or_else(match_all)
        } else {
            let mut bool_query = self.bool_query.clone();
            for leaf in leaves {
                bool_query.push(Bucket::Must, leaf);
            }
            json!({ "bool": bool_query.to_value() })
        };

        match &self.function_score {
            Some(spec) => {
                let mut envelope = spec.clone();
                envelope.entry("query").or_insert(inner);
                json!({ "function_score": envelope })
            }
            None => inner,
        }
    }
}

/// The universal match-everything clause
pub fn match_all() -> Value {
    json!({"match_all": {}})
}
