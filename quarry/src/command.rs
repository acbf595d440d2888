//! Document and index commands
//!
//! Non-search requests issued through a [`Builder`]: single-document reads,
//! bulk and single inserts, partial updates, deletes and index management.
//! Writes report success through the engine's `result` string, never through
//! errors.

use crate::merge::{merge_maps, merge_two};
use crate::model::Model;
use crate::query::builder::Builder;
use crate::response::{BulkItemResponse, BulkResponse, Hit, WriteResponse, WriteStatus};
use crate::transport::Method;
use crate::Result;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Keys of a new document that travel as request parameters instead of body
const RESERVED_KEYS: [&str; 3] = ["id", "routing", "timestamp"];

#[derive(Debug, Serialize)]
struct DocumentRequest<'a> {
    index: &'a str,
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    index: &'a str,
    id: &'a str,
    body: UpdateBody,
}

#[derive(Debug, Serialize)]
struct UpdateBody {
    doc: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_as_upsert: Option<bool>,
}

#[derive(Debug, Serialize)]
struct IndexRequest<'a> {
    index: &'a str,
    body: Value,
}

impl<'m> Builder<'m> {
    /// Fetch one document by id; `None` when it doesn't exist
    pub async fn find(&self, id: &str) -> Result<Option<Model>> {
        let index = self.model().index();
        let params = serde_json::to_value(DocumentRequest { index, id })?;
        let raw = match self.dispatch(Method::Get, params).await {
            Ok(raw) => raw,
            Err(e) if e.is_not_found() => {
                debug!(index = %index, id = %id, "Document not found");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let hit = Hit::from_raw(&raw)?;
        Ok(Some(self.record(hit.source(), raw)))
    }

    /// Index several documents in one bulk request
    ///
    /// A record's `_id` field, when present, becomes the document id. Returned
    /// records pair each input with the id the engine assigned, by position.
    pub async fn insert(&self, records: Vec<Map<String, Value>>) -> Result<Vec<Model>> {
        let index = self.model().index();
        let mut body = Vec::with_capacity(records.len() * 2);
        for record in &records {
            let mut document = record.clone();
            let mut header = Map::new();
            header.insert("_index".to_string(), json!(index));
            if let Some(id) = document.remove("_id") {
                header.insert("_id".to_string(), id);
            }
            body.push(json!({ "index": header }));
            body.push(Value::Object(document));
        }

        let raw = self.dispatch(Method::Bulk, json!({ "body": body })).await?;
        let response = BulkResponse::from_value(raw)?;
        if response.errors {
            warn!(index = %index, "Bulk insert reported item errors");
        }

        records
            .into_iter()
            .zip(response.items)
            .map(|(record, item)| {
                let assigned = BulkItemResponse::from_raw(&item)?.id();
                let mut id = Map::new();
                id.insert("_id".to_string(), json!(assigned));
                Ok(self.record(merge_maps(record, id), item))
            })
            .collect()
    }

    /// Index one document; `None` unless the engine reports it as created
    ///
    /// `id`, `routing` and `timestamp` are taken out of the record and sent as
    /// request parameters.
    pub async fn create(&self, record: Map<String, Value>) -> Result<Option<Model>> {
        let index = self.model().index();
        let mut body = record;
        let mut reserved = Map::new();
        for key in RESERVED_KEYS {
            if let Some(value) = body.remove(key) {
                reserved.insert(key.to_string(), value);
            }
        }

        let request = serde_json::to_value(IndexRequest {
            index,
            body: Value::Object(body.clone()),
        })?;
        let params = merge_two(&Value::Object(reserved), &request);

        let raw = self.dispatch(Method::Index, params).await?;
        let response = WriteResponse::from_raw(&raw)?;
        let status = response.status();
        if status != WriteStatus::Created {
            warn!(index = %index, status = %status, "Document was not created");
            return Ok(None);
        }

        let mut id = Map::new();
        id.insert("_id".to_string(), json!(response.id.unwrap_or_default()));
        Ok(Some(self.record(merge_maps(body, id), raw)))
    }

    /// Partial update; true when the document changed or already matched
    pub async fn update(&self, record: Map<String, Value>, id: &str) -> Result<bool> {
        self.send_update(id, record, None).await
    }

    /// Partial update that creates the document when missing; true when
    /// the document was updated, created or already matched
    pub async fn upsert(&self, id: &str, data: Map<String, Value>) -> Result<bool> {
        self.send_update(id, data, Some(true)).await
    }

    /// Delete by id; a document that is already gone counts as deleted
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let index = self.model().index();
        let params = serde_json::to_value(DocumentRequest { index, id })?;
        let raw = match self.dispatch(Method::Delete, params).await {
            Ok(raw) => raw,
            Err(e) if e.is_not_found() => {
                debug!(index = %index, id = %id, "Delete of missing document");
                return Ok(true);
            }
            Err(e) => return Err(e),
        };

        let status = WriteResponse::from_raw(&raw)?.status();
        if status != WriteStatus::Deleted {
            warn!(index = %index, id = %id, status = %status, "Delete failed");
            return Ok(false);
        }
        Ok(true)
    }

    /// Add or change field mappings; bare strings are read as type names
    pub async fn update_mapping(&self, fields: Map<String, Value>) -> Result<Value> {
        let body = json!({ "properties": normalize_fields(&fields) });
        self.admin(Method::PutMapping, body).await
    }

    pub async fn update_setting(&self, settings: Map<String, Value>) -> Result<Value> {
        self.admin(Method::PutSettings, json!({ "settings": settings }))
            .await
    }

    /// Create the index from the model's casts, with `mappings` overriding them
    pub async fn create_index(
        &self,
        mappings: Map<String, Value>,
        settings: Map<String, Value>,
    ) -> Result<Value> {
        let properties = merge_maps(
            normalize_fields(self.model().casts()),
            normalize_fields(&mappings),
        );

        let mut body = Map::new();
        body.insert(
            "mappings".to_string(),
            json!({ "properties": properties }),
        );
        if !settings.is_empty() {
            body.insert("settings".to_string(), Value::Object(settings));
        }
        self.admin(Method::CreateIndex, Value::Object(body)).await
    }

    async fn send_update(
        &self,
        id: &str,
        doc: Map<String, Value>,
        doc_as_upsert: Option<bool>,
    ) -> Result<bool> {
        let index = self.model().index();
        let params = serde_json::to_value(UpdateRequest {
            index,
            id,
            body: UpdateBody { doc, doc_as_upsert },
        })?;

        let raw = self.dispatch(Method::Update, params).await?;
        let status = WriteResponse::from_raw(&raw)?.status();
        let success = status.is_update_success()
            || (doc_as_upsert == Some(true) && status == WriteStatus::Created);
        if !success {
            warn!(index = %index, id = %id, status = %status, "Update failed");
        }
        Ok(success)
    }

    async fn admin(&self, method: Method, body: Value) -> Result<Value> {
        let params = serde_json::to_value(IndexRequest {
            index: self.model().index(),
            body,
        })?;
        self.dispatch(method, params).await
    }
}

/// Field spec for a mapping: a type name becomes `{"type": name}`
fn normalize_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, spec)| {
            let spec = match spec {
                Value::String(type_name) => json!({ "type": type_name }),
                Value::Object(_) => spec.clone(),
                _ => json!({}),
            };
            (name.clone(), spec)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::transport::MemoryTransport;
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryTransport>, Model) {
        let transport = Arc::new(MemoryTransport::new());
        let casts = json!({"title": "text", "price": "float", "tags": {"type": "keyword"}});
        let model = Model::new("books", transport.clone())
            .with_casts(casts.as_object().cloned().unwrap());
        (transport, model)
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    #[tokio::test]
    async fn test_find_existing() {
        let (transport, model) = setup();
        transport.push_response(json!({
            "_index": "books", "_id": "1", "found": true, "_source": {"title": "Dune"}
        }));

        let record = model.query().find("1").await.unwrap().unwrap();
        assert_eq!(record.get("title"), Some(&json!("Dune")));
        assert_eq!(record.original()["found"], json!(true));
        assert_eq!(
            transport.last_call(),
            Some((Method::Get, json!({"index": "books", "id": "1"})))
        );
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let (transport, model) = setup();
        transport.push_error(Error::NotFound("books/404".into()));
        assert!(model.query().find("404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_other_errors_propagate() {
        let (transport, model) = setup();
        transport.push_error(Error::Transport("connection refused".into()));
        assert!(model.query().find("1").await.is_err());
    }

    // ========================================================================
    // Writes
    // ========================================================================

    #[tokio::test]
    async fn test_insert_pairs_ids_by_position() {
        let (transport, model) = setup();
        transport.push_response(json!({
            "took": 3,
            "errors": false,
            "items": [
                {"index": {"_index": "books", "_id": "a1", "result": "created", "status": 201}},
                {"index": {"_index": "books", "_id": "b2", "result": "created", "status": 201}}
            ]
        }));

        let records = model
            .query()
            .insert(vec![object(json!({"name": "a"})), object(json!({"name": "b"}))])
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].attributes(),
            &object(json!({"name": "a", "_id": "a1"}))
        );
        assert_eq!(records[1].get("_id"), Some(&json!("b2")));
        assert_eq!(records[1].original()["index"]["status"], json!(201));

        let (method, params) = transport.last_call().unwrap();
        assert_eq!(method, Method::Bulk);
        assert_eq!(
            params["body"],
            json!([
                {"index": {"_index": "books"}},
                {"name": "a"},
                {"index": {"_index": "books"}},
                {"name": "b"}
            ])
        );
    }

    #[tokio::test]
    async fn test_insert_explicit_id_moves_to_header() {
        let (transport, model) = setup();
        transport.push_response(json!({"errors": false, "items": []}));

        let records = model
            .query()
            .insert(vec![object(json!({"_id": "x", "name": "a"}))])
            .await
            .unwrap();
        assert!(records.is_empty());

        let (_, params) = transport.last_call().unwrap();
        assert_eq!(
            params["body"],
            json!([{"index": {"_index": "books", "_id": "x"}}, {"name": "a"}])
        );
    }

    #[tokio::test]
    async fn test_create_splits_reserved_keys() {
        let (transport, model) = setup();
        transport.push_response(json!({"_index": "books", "_id": "7", "result": "created"}));

        let record = model
            .query()
            .create(object(json!({"id": "7", "routing": "r1", "title": "Dune"})))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.attributes(), &object(json!({"title": "Dune", "_id": "7"})));
        assert_eq!(record.original()["result"], json!("created"));

        let (method, params) = transport.last_call().unwrap();
        assert_eq!(method, Method::Index);
        assert_eq!(
            params,
            json!({"id": "7", "routing": "r1", "index": "books", "body": {"title": "Dune"}})
        );
    }

    #[tokio::test]
    async fn test_create_not_created_is_none() {
        let (transport, model) = setup();
        transport.push_response(json!({"_id": "7", "result": "updated"}));
        let created = model
            .query()
            .create(object(json!({"title": "Dune"})))
            .await
            .unwrap();
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn test_update_statuses() {
        let (transport, model) = setup();
        transport
            .push_response(json!({"result": "updated"}))
            .push_response(json!({"result": "noop"}))
            .push_response(json!({"result": "not_found"}));

        let builder = model.query();
        assert!(builder.update(object(json!({"price": 5})), "1").await.unwrap());
        assert!(builder.update(object(json!({"price": 5})), "1").await.unwrap());
        assert!(!builder.update(object(json!({"price": 5})), "1").await.unwrap());

        assert_eq!(
            transport.last_call(),
            Some((
                Method::Update,
                json!({"index": "books", "id": "1", "body": {"doc": {"price": 5}}})
            ))
        );
    }

    #[tokio::test]
    async fn test_upsert_created_is_success() {
        let (transport, model) = setup();
        transport
            .push_response(json!({"result": "created"}))
            .push_response(json!({"result": "created"}));

        let builder = model.query();
        assert!(builder.upsert("9", object(json!({"title": "New"}))).await.unwrap());
        assert!(!builder.update(object(json!({"title": "New"})), "9").await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_sets_flag() {
        let (transport, model) = setup();
        transport.push_response(json!({"result": "noop"}));

        assert!(model
            .query()
            .upsert("9", object(json!({"title": "New"})))
            .await
            .unwrap());
        let (_, params) = transport.last_call().unwrap();
        assert_eq!(
            params["body"],
            json!({"doc": {"title": "New"}, "doc_as_upsert": true})
        );
    }

    #[tokio::test]
    async fn test_delete_outcomes() {
        let (transport, model) = setup();
        transport
            .push_response(json!({"result": "deleted"}))
            .push_error(Error::NotFound("books/2".into()))
            .push_response(json!({"result": "noop"}));

        let builder = model.query();
        assert!(builder.delete("1").await.unwrap());
        assert!(builder.delete("2").await.unwrap());
        assert!(!builder.delete("3").await.unwrap());
        assert_eq!(transport.call_count(), 3);
    }

    // ========================================================================
    // Index management
    // ========================================================================

    #[tokio::test]
    async fn test_update_mapping_normalises() {
        let (transport, model) = setup();
        transport.push_response(json!({"acknowledged": true}));

        let ack = model
            .query()
            .update_mapping(object(json!({
                "title": "text",
                "meta": {"type": "object", "enabled": false},
                "broken": 42
            })))
            .await
            .unwrap();
        assert_eq!(ack, json!({"acknowledged": true}));

        assert_eq!(
            transport.last_call(),
            Some((
                Method::PutMapping,
                json!({
                    "index": "books",
                    "body": {"properties": {
                        "title": {"type": "text"},
                        "meta": {"type": "object", "enabled": false},
                        "broken": {}
                    }}
                })
            ))
        );
    }

    #[tokio::test]
    async fn test_update_setting() {
        let (transport, model) = setup();
        transport.push_response(json!({"acknowledged": true}));
        model
            .query()
            .update_setting(object(json!({"number_of_replicas": 0})))
            .await
            .unwrap();

        let (method, params) = transport.last_call().unwrap();
        assert_eq!(method, Method::PutSettings);
        assert_eq!(params["body"], json!({"settings": {"number_of_replicas": 0}}));
    }

    #[tokio::test]
    async fn test_create_index_overrides_casts() {
        let (transport, model) = setup();
        transport.push_response(json!({"acknowledged": true}));
        transport.push_response(json!({"acknowledged": true}));

        let builder = model.query();
        builder
            .create_index(
                object(json!({"price": "double", "isbn": "keyword"})),
                object(json!({"number_of_shards": 1})),
            )
            .await
            .unwrap();

        let (method, params) = transport.last_call().unwrap();
        assert_eq!(method, Method::CreateIndex);
        assert_eq!(
            params["body"],
            json!({
                "mappings": {"properties": {
                    "title": {"type": "text"},
                    "price": {"type": "double"},
                    "tags": {"type": "keyword"},
                    "isbn": {"type": "keyword"}
                }},
                "settings": {"number_of_shards": 1}
            })
        );

        builder.create_index(Map::new(), Map::new()).await.unwrap();
        let (_, params) = transport.last_call().unwrap();
        assert!(params["body"].get("settings").is_none());
    }
}
