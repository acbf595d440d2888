pub mod document;
pub mod index;
pub mod search;

pub use document::{run_delete, run_get};
pub use index::{run_create_index, run_put_mapping};
pub use search::{run_dry_run, run_search, SearchArgs};

use anyhow::{bail, Result};
use serde_json::{Map, Value};

/// Command-line value: JSON when it parses, otherwise a plain string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// `NAME=TYPE` pairs into a field map
pub fn parse_fields(fields: &[String]) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    for field in fields {
        let Some((name, field_type)) = field.split_once('=') else {
            bail!("Field '{}' must look like NAME=TYPE", field);
        };
        if name.is_empty() || field_type.is_empty() {
            bail!("Field '{}' must look like NAME=TYPE", field);
        }
        map.insert(name.to_string(), parse_value(field_type));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("[1,2]"), json!([1, 2]));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("rust"), json!("rust"));
        assert_eq!(parse_value("\"7\""), json!("7"));
    }

    #[test]
    fn test_parse_fields() {
        let fields = parse_fields(&[
            "title=text".to_string(),
            "meta={\"type\":\"object\",\"enabled\":false}".to_string(),
        ])
        .unwrap();
        assert_eq!(fields["title"], json!("text"));
        assert_eq!(fields["meta"]["enabled"], json!(false));

        assert!(parse_fields(&["title".to_string()]).is_err());
        assert!(parse_fields(&["=text".to_string()]).is_err());
    }
}
