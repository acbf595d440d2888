//! Fluent query builder and response interpreter for Elasticsearch
//!
//! Quarry turns chained predicate, sort, aggregation and paging calls into
//! Query DSL request documents, hands them to a [`Transport`], and reads the
//! engine's replies back into records.
//!
//! ```ignore
//! let model = Model::new("books", transport);
//! let page = model
//!     .query()
//!     .where_eq("status", "published")
//!     .where_op("price", "<=", 20)?
//!     .order_by("created_at", true)
//!     .page(10, 1)
//!     .await?;
//! ```
//!
//! # Predicates
//!
//! Operators and the clauses they produce:
//! - `=` / `!=` - `term` in `must` / `must_not`
//! - `>` `<` `>=` `<=` and `range` - `range`
//! - `in` / `not in` - `terms`
//! - `like` - `match`
//! - `regex` / `prefix` - `regexp` / `prefix`
//! - `filter` / `nested` - verbatim fragment / `nested`, in `filter`
//! - `multi match` - `multi_match`
//! - `or` - `bool.should` group on one field
//!
//! # Commands
//!
//! Document commands (`find`, `insert`, `create`, `update`, `upsert`,
//! `delete`) and index commands (`update_mapping`, `update_setting`,
//! `create_index`) live on the same builder.

pub mod command;
pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod paginator;
pub mod query;
pub mod response;
pub mod transport;

pub use config::{Config, ConnectionConfig, LoggingConfig};
pub use error::Error;
pub use merge::{merge, merge_two};
pub use model::{Model, QueryParam};
pub use paginator::Paginator;
pub use query::{Builder, Operator, SortOrder};
pub use transport::{MemoryTransport, Method, Transport};

/// Result type for query operations
pub type Result<T> = std::result::Result<T, Error>;
