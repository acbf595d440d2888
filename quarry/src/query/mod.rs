//! Query construction: operator translation, request types and the fluent builder

pub mod builder;
pub mod operator;
pub mod types;

pub use builder::{Builder, DEFAULT_GEO_DISTANCE, DEFAULT_GEO_FIELD, DEFAULT_TAKE};
pub use operator::{translate, Bucket, Operator};
pub use types::{
    Aggregation, BoolQuery, Highlight, QueryBody, SearchBody, SearchRequest, SortClause,
    SortOrder, TrackTotalHits,
};
