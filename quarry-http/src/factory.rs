//! Transports for named connection groups

use crate::client::HttpTransport;
use parking_lot::Mutex;
use quarry::config::DEFAULT_CONNECTION;
use quarry::{Config, Result, Transport};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Builds one shared transport per connection group
pub struct TransportFactory {
    config: Config,
    transports: Mutex<HashMap<String, Arc<dyn Transport>>>,
}

impl TransportFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            transports: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transport for `group`, created on first use and reused afterwards
    pub fn create(&self, group: &str) -> Result<Arc<dyn Transport>> {
        let mut transports = self.transports.lock();
        if let Some(transport) = transports.get(group) {
            return Ok(Arc::clone(transport));
        }

        let connection = self.config.connection(group)?;
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(connection)?);
        info!(group = %group, hosts = ?connection.hosts, "Created engine transport");
        transports.insert(group.to_string(), Arc::clone(&transport));
        Ok(transport)
    }

    pub fn default_transport(&self) -> Result<Arc<dyn Transport>> {
        self.create(DEFAULT_CONNECTION)
    }
}
