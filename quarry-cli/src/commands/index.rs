use super::parse_fields;
use anyhow::Result;
use quarry::{Model, Transport};
use serde_json::Map;
use std::sync::Arc;

/// Create an index with the given field types
pub async fn run_create_index(transport: Arc<dyn Transport>, index: &str, fields: &[String]) -> Result<()> {
    let mappings = parse_fields(fields)?;
    let model = Model::new(index, transport);
    let ack = model.query().create_index(mappings, Map::new()).await?;
    tracing::info!(index = %index, "Index created");
    println!("{}", serde_json::to_string_pretty(&ack)?);
    Ok(())
}

pub async fn run_put_mapping(transport: Arc<dyn Transport>, index: &str, fields: &[String]) -> Result<()> {
    if fields.is_empty() {
        anyhow::bail!("put-mapping needs at least one --field NAME=TYPE");
    }
    let model = Model::new(index, transport);
    let ack = model.query().update_mapping(parse_fields(fields)?).await?;
    println!("{}", serde_json::to_string_pretty(&ack)?);
    Ok(())
}
