//! HTTP transport for quarry
//!
//! [`HttpTransport`] implements [`quarry::Transport`] against the engine's
//! REST API with `reqwest`. [`TransportFactory`] hands out one shared
//! transport per configured connection group.
//!
//! | method | route |
//! |---|---|
//! | `search` | `POST /{index}/_search` |
//! | `get` / `delete` | `GET` / `DELETE /{index}/_doc/{id}` |
//! | `bulk` | `POST /_bulk` (NDJSON) |
//! | `index` | `PUT /{index}/_doc/{id}` or `POST /{index}/_doc` |
//! | `update` | `POST /{index}/_update/{id}` |
//! | `indices.putMapping` | `PUT /{index}/_mapping` |
//! | `indices.putSettings` | `PUT /{index}/_settings` |
//! | `indices.create` | `PUT /{index}` |

pub mod client;
pub mod factory;
pub mod route;

pub use client::HttpTransport;
pub use factory::TransportFactory;
pub use route::{route, Route, RouteBody};
