//! JSON Schema export for the server config.

use crate::ServerConfig;
use schemars::{Schema, schema_for};

/// JSON Schema for `ServerConfig`, numeric bounds included.
#[must_use]
pub fn server_config_schema() -> Schema {
    schema_for!(ServerConfig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn schema_lists_camel_case_properties_with_bounds() -> Result<(), Box<dyn Error>> {
        let schema = serde_json::to_value(server_config_schema())?;
        let properties = schema
            .get("properties")
            .ok_or_else(|| std::io::Error::other("schema has no properties"))?;

        assert!(properties.get("databaseUrl").is_some());
        assert!(properties.get("defaultSchema").is_some());
        assert_eq!(properties["maxConnections"]["minimum"], 1);
        assert_eq!(properties["maxConnections"]["maximum"], 100);
        assert_eq!(properties["connectionTimeout"]["maximum"], 300);
        assert_eq!(properties["statementTimeout"]["minimum"], 0);
        Ok(())
    }

    #[test]
    fn optional_fields_are_not_required() -> Result<(), Box<dyn Error>> {
        let schema = serde_json::to_value(server_config_schema())?;
        let required: Vec<&str> = schema["required"]
            .as_array()
            .ok_or_else(|| std::io::Error::other("schema has no required list"))?
            .iter()
            .filter_map(serde_json::Value::as_str)
            .collect();

        assert!(required.contains(&"databaseUrl"));
        assert!(required.contains(&"maxConnections"));
        assert!(!required.contains(&"requireSsl"));
        assert!(!required.contains(&"defaultSchema"));
        Ok(())
    }
}
