//! reqwest-backed transport

use crate::route::{route, Route, RouteBody};
use async_trait::async_trait;
use quarry::{ConnectionConfig, Error, Method, Result, Transport};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Transport that talks to the engine's REST API
///
/// Requests rotate over the configured hosts.
pub struct HttpTransport {
    client: Client,
    hosts: Vec<Url>,
    next: AtomicUsize,
}

impl HttpTransport {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        if config.hosts.is_empty() {
            return Err(Error::Config("connection has no hosts".into()));
        }

        let hosts = config
            .hosts
            .iter()
            .map(|host| {
                Url::parse(host)
                    .map_err(|e| Error::Config(format!("invalid host '{}': {}", host, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let timeout = Duration::try_from_secs_f64(config.timeout_secs)
            .map_err(|e| Error::Config(format!("invalid timeout {}: {}", config.timeout_secs, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(config.max_connections)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            client,
            hosts,
            next: AtomicUsize::new(0),
        })
    }

    /// Hosts in rotation order
    pub fn hosts(&self) -> &[Url] {
        &self.hosts
    }

    fn url(&self, route: &Route) -> Result<Url> {
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.hosts.len();
        let mut url = self.hosts[slot].clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("host '{}' cannot take a path", self.hosts[slot])))?
            .pop_if_empty()
            .extend(&route.segments);
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, method: Method, params: Value) -> Result<Value> {
        let route = route(method, &params)?;
        let url = self.url(&route)?;
        debug!(method = %method, http_method = %route.http_method, url = %url, "Sending engine request");

        let mut request = self
            .client
            .request(route.http_method.clone(), url)
            .query(&route.query);
        request = match route.body {
            Some(RouteBody::Json(ref body)) => request.json(body),
            Some(RouteBody::NdJson(ref lines)) => request
                .header(CONTENT_TYPE, "application/x-ndjson")
                .body(lines.clone()),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(json!({}));
            }
            return serde_json::from_str(&text).map_err(|e| {
                Error::UnexpectedResponse(format!("{} returned a non-JSON body: {}", method, e))
            });
        }

        if status == StatusCode::NOT_FOUND && matches!(method, Method::Get | Method::Delete) {
            debug!(method = %method, path = %route.path(), "Document not found");
            return Err(Error::NotFound(route.path()));
        }

        let reason = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| {
                body.pointer("/error/reason")
                    .and_then(Value::as_str)
                    .map(String::from)
            })
            .unwrap_or(text);
        warn!(method = %method, status = status.as_u16(), reason = %reason, "Engine rejected request");
        Err(Error::Engine {
            status: status.as_u16(),
            reason,
        })
    }
}
