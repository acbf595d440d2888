//! Records and the index they live in
//!
//! A [`Model`] names an index, carries its field casts and mapping, and holds
//! the transport used to reach it. The same type doubles as a record: search
//! hits come back as fresh instances carrying the hit's stored fields as
//! attributes and the raw hit as their original.

use crate::error::Error;
use crate::query::builder::{Builder, DEFAULT_GEO_DISTANCE};
use crate::query::types::SortOrder;
use crate::transport::Transport;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct Model {
    index: String,
    casts: Map<String, Value>,
    mapping: Map<String, Value>,
    client: Arc<dyn Transport>,
    attributes: Map<String, Value>,
    original: Value,
}

impl Model {
    pub fn new(index: impl Into<String>, client: Arc<dyn Transport>) -> Self {
        Self {
            index: index.into(),
            casts: Map::new(),
            mapping: Map::new(),
            client,
            attributes: Map::new(),
            original: Value::Null,
        }
    }

    /// Field name to type name (or full field mapping) used when creating the index
    pub fn with_casts(mut self, casts: Map<String, Value>) -> Self {
        self.casts = casts;
        self
    }

    /// Index mapping document, `{"properties": {...}}`
    pub fn with_mapping(mut self, mapping: Map<String, Value>) -> Self {
        self.mapping = mapping;
        self
    }

    /// Start a query against this model's index
    pub fn query(&self) -> Builder<'_> {
        Builder::new(self)
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn casts(&self) -> &Map<String, Value> {
        &self.casts
    }

    pub fn mapping(&self) -> &Map<String, Value> {
        &self.mapping
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.client
    }

    /// Empty record bound to the same index, casts and transport
    pub fn new_instance(&self) -> Self {
        Self {
            index: self.index.clone(),
            casts: self.casts.clone(),
            mapping: self.mapping.clone(),
            client: Arc::clone(&self.client),
            attributes: Map::new(),
            original: Value::Null,
        }
    }

    pub fn set_attributes(&mut self, attributes: Map<String, Value>) {
        self.attributes = attributes;
    }

    pub fn set_original(&mut self, original: Value) {
        self.original = original;
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Raw engine document this record was built from
    pub fn original(&self) -> &Value {
        &self.original
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Attributes as a typed record
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(Value::Object(self.attributes.clone()))?)
    }

    /// Leaf fields declared in the mapping, nested objects flattened with dots
    pub fn search_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if let Some(Value::Object(properties)) = self.mapping.get("properties") {
            collect_fields(properties, "", &mut fields);
        }
        fields
    }

    /// Builder with `params` applied, skipping fields the mapping doesn't declare
    pub fn when_query(&self, params: &[QueryParam]) -> Result<Builder<'_>> {
        let fields = self.search_fields();
        let mut builder = self.query();

        for param in params {
            if !fields.iter().any(|f| f == &param.field) {
                debug!(index = %self.index, field = %param.field, "Skipping unsearchable field");
                continue;
            }

            if param.operator.trim().eq_ignore_ascii_case("geo") {
                let point = GeoPoint::from_value(&param.field, &param.value)?;
                builder
                    .geo(point.lat, point.lng, &param.field, point.distance)
                    .order_by_geo(point.lat, point.lng, &param.field, SortOrder::Asc);
            } else {
                builder.where_op(&param.field, &param.operator, param.value.clone())?;
            }
        }

        Ok(builder)
    }
}

fn collect_fields(properties: &Map<String, Value>, prefix: &str, out: &mut Vec<String>) {
    for (name, spec) in properties {
        let Value::Object(spec) = spec else {
            continue;
        };
        if spec.contains_key("type") {
            out.push(format!("{}{}", prefix, name));
        } else if let Some(Value::Object(children)) = spec.get("properties") {
            collect_fields(children, &format!("{}{}.", prefix, name), out);
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("index", &self.index)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.attributes).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// One request filter: `field operator value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParam {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

impl QueryParam {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

struct GeoPoint {
    lat: f64,
    lng: f64,
    distance: u32,
}

impl GeoPoint {
    /// `{lat, lng, distance?}`; coordinates may be numbers or numeric strings
    fn from_value(field: &str, value: &Value) -> Result<Self> {
        let coordinate = |key: &str| -> Result<f64> {
            let raw = value.get(key);
            raw.and_then(Value::as_f64)
                .or_else(|| raw.and_then(Value::as_str).and_then(|s| s.trim().parse().ok()))
                .ok_or_else(|| {
                    Error::InvalidPredicate(format!("geo filter on '{}' needs a numeric '{}'", field, key))
                })
        };

        let distance = match value.get("distance") {
            None | Some(Value::Null) => DEFAULT_GEO_DISTANCE,
            Some(raw) => raw
                .as_u64()
                .and_then(|d| u32::try_from(d).ok())
                .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()))
                .ok_or_else(|| {
                    Error::InvalidPredicate(format!("geo distance on '{}' must be whole metres", field))
                })?,
        };

        Ok(Self {
            lat: coordinate("lat")?,
            lng: coordinate("lng")?,
            distance,
        })
    }
}
