use anyhow::Result;
use quarry::{Model, Transport};
use std::sync::Arc;

/// Print one document; a missing document is an error
pub async fn run_get(transport: Arc<dyn Transport>, index: &str, id: &str) -> Result<()> {
    let model = Model::new(index, transport);
    match model.query().find(id).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => anyhow::bail!("Document {}/{} not found", index, id),
    }
    Ok(())
}

pub async fn run_delete(transport: Arc<dyn Transport>, index: &str, id: &str) -> Result<()> {
    let model = Model::new(index, transport);
    if model.query().delete(id).await? {
        tracing::info!(index = %index, id = %id, "Deleted");
        Ok(())
    } else {
        anyhow::bail!("Engine did not delete {}/{}", index, id)
    }
}
