//! Mapping from transport methods to engine REST calls

use quarry::{Error, Method, Result};
use reqwest::Method as HttpMethod;
use serde_json::{Map, Value};

/// Request body of a routed call
#[derive(Debug, Clone, PartialEq)]
pub enum RouteBody {
    Json(Value),
    /// Newline-delimited JSON, one document per line
    NdJson(String),
}

/// A resolved REST call, relative to a host
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub http_method: HttpMethod,
    /// Path segments, percent-encoded when the URL is built
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<RouteBody>,
}

impl Route {
    fn new(http_method: HttpMethod, segments: Vec<String>) -> Self {
        Self {
            http_method,
            segments,
            query: Vec::new(),
            body: None,
        }
    }

    fn json(mut self, body: Value) -> Self {
        self.body = Some(RouteBody::Json(body));
        self
    }

    /// Path as sent, for logs and tests
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Resolve a transport call to its REST route
pub fn route(method: Method, params: &Value) -> Result<Route> {
    let route = match method {
        Method::Search => {
            let index = required(method, params, "index")?;
            let mut body = match params.get("body") {
                Some(Value::Object(body)) => body.clone(),
                _ => Map::new(),
            };
            for key in ["from", "size", "track_total_hits"] {
                if let Some(value) = params.get(key) {
                    body.insert(key.to_string(), value.clone());
                }
            }
            Route::new(HttpMethod::POST, vec![index, "_search".into()]).json(Value::Object(body))
        }
        Method::Get => Route::new(
            HttpMethod::GET,
            vec![
                required(method, params, "index")?,
                "_doc".into(),
                required(method, params, "id")?,
            ],
        ),
        Method::Delete => Route::new(
            HttpMethod::DELETE,
            vec![
                required(method, params, "index")?,
                "_doc".into(),
                required(method, params, "id")?,
            ],
        ),
        Method::Bulk => {
            let lines = match params.get("body") {
                Some(Value::Array(lines)) => lines,
                _ => {
                    return Err(Error::Transport(
                        "bulk request needs a list of lines in 'body'".into(),
                    ))
                }
            };
            let mut ndjson = String::new();
            for line in lines {
                ndjson.push_str(&serde_json::to_string(line)?);
                ndjson.push('\n');
            }
            let mut route = Route::new(HttpMethod::POST, vec!["_bulk".into()]);
            route.body = Some(RouteBody::NdJson(ndjson));
            route
        }
        Method::Index => {
            let index = required(method, params, "index")?;
            let mut route = match optional(params, "id") {
                Some(id) => Route::new(HttpMethod::PUT, vec![index, "_doc".into(), id]),
                None => Route::new(HttpMethod::POST, vec![index, "_doc".into()]),
            };
            for key in ["routing", "timestamp"] {
                if let Some(value) = optional(params, key) {
                    route.query.push((key.to_string(), value));
                }
            }
            route.json(body(params))
        }
        Method::Update => Route::new(
            HttpMethod::POST,
            vec![
                required(method, params, "index")?,
                "_update".into(),
                required(method, params, "id")?,
            ],
        )
        .json(body(params)),
        Method::PutMapping => Route::new(
            HttpMethod::PUT,
            vec![required(method, params, "index")?, "_mapping".into()],
        )
        .json(body(params)),
        Method::PutSettings => {
            let doc = body(params);
            let settings = doc.get("settings").cloned().unwrap_or(doc);
            Route::new(
                HttpMethod::PUT,
                vec![required(method, params, "index")?, "_settings".into()],
            )
            .json(settings)
        }
        Method::CreateIndex => {
            Route::new(HttpMethod::PUT, vec![required(method, params, "index")?]).json(body(params))
        }
    };
    Ok(route)
}

fn body(params: &Value) -> Value {
    params
        .get("body")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Parameter as a path or query string; numbers are accepted for ids
fn optional(params: &Value, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required(method: Method, params: &Value, key: &str) -> Result<String> {
    optional(params, key)
        .ok_or_else(|| Error::Transport(format!("{} request is missing '{}'", method, key)))
}
