//! Carbon file parser
//!
//! A carbon file holds one or more YAML documents separated by `---`. Each
//! document maps a service name to its compose fields:
//!
//! ```yaml
//! web:
//!   image: nginx
//!   depends_on:
//!     - db
//! ---
//! db:
//!   image: postgres
//! ```

use super::{ServiceDefinition, ServiceFields};
use crate::error::{CarbonError, Result};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::Path;

/// File names recognised as carbon files
pub const CARBON_FILES: &[&str] = &["carbon.yml", "carbon.yaml"];

/// Parse a carbon file read from `file`
pub fn parse_file(file: &Path) -> Result<Vec<ServiceDefinition>> {
    let content = std::fs::read_to_string(file).map_err(|e| CarbonError::CatalogParse {
        path: file.to_path_buf(),
        message: format!("Failed to read file: {}", e),
    })?;

    parse_str(&content, file)
}

/// Parse carbon file contents. `file` is only recorded on the definitions.
pub fn parse_str(content: &str, file: &Path) -> Result<Vec<ServiceDefinition>> {
    let parse_error = |message: String| CarbonError::CatalogParse {
        path: file.to_path_buf(),
        message,
    };

    let mut services = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let value = Value::deserialize(document)
            .map_err(|e| parse_error(format!("Failed to parse YAML: {}", e)))?;

        let mapping = match value {
            Value::Null => continue,
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(parse_error(
                    "a document must map service names to their fields".to_string(),
                ))
            }
        };

        for (name, body) in mapping {
            let name = name
                .as_str()
                .ok_or_else(|| parse_error("service names must be strings".to_string()))?
                .to_string();

            let fields = to_fields(body)
                .map_err(|message| parse_error(format!("service '{}': {}", name, message)))?;

            let mut service = ServiceDefinition::new(&name, fields);
            service.source_file = file.to_path_buf();
            services.push(service);
        }
    }

    Ok(services)
}

fn to_fields(body: Value) -> std::result::Result<ServiceFields, String> {
    match body {
        Value::Null => Ok(ServiceFields::new()),
        Value::Mapping(mapping) => mapping
            .into_iter()
            .map(|(key, value)| match key {
                Value::String(key) => Ok((key, value)),
                other => Err(format!("field names must be strings, found {:?}", other)),
            })
            .collect(),
        _ => Err("fields must be a mapping".to_string()),
    }
}

/// Dependencies declared in `depends_on`, short or long form
pub fn depends_on(fields: &ServiceFields) -> Vec<String> {
    match fields.get("depends_on") {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::Mapping(map)) => map
            .keys()
            .filter_map(|key| key.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_multiple_documents() {
        let yaml = r#"
web:
  image: nginx
  ports:
    - "8080:80"
  depends_on:
    - db
---
db:
  image: postgres
"#;

        let services = parse_str(yaml, Path::new("/stores/a/carbon.yml")).unwrap();
        assert_eq!(services.len(), 2);

        let web = &services[0];
        assert_eq!(web.name, "web");
        assert_eq!(web.image, "nginx");
        assert_eq!(web.depends_on, vec!["db"]);
        assert_eq!(web.source_file, PathBuf::from("/stores/a/carbon.yml"));
        assert!(web.fields.contains_key("ports"));

        let db = &services[1];
        assert_eq!(db.name, "db");
        assert!(db.depends_on.is_empty());
    }

    #[test]
    fn test_parse_long_form_depends_on() {
        let yaml = r#"
api:
  image: node
  depends_on:
    db:
      condition: service_healthy
    cache:
      condition: service_started
"#;

        let services = parse_str(yaml, Path::new("carbon.yml")).unwrap();
        let mut deps = services[0].depends_on.clone();
        deps.sort();
        assert_eq!(deps, vec!["cache", "db"]);
    }

    #[test]
    fn test_parse_skips_empty_documents() {
        let yaml = "---\n---\nweb:\n  image: nginx\n";
        let services = parse_str(yaml, Path::new("carbon.yml")).unwrap();
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn test_parse_service_without_fields() {
        let services = parse_str("bare:\n", Path::new("carbon.yml")).unwrap();
        assert_eq!(services[0].name, "bare");
        assert_eq!(services[0].image, "");
    }

    #[test]
    fn test_parse_rejects_non_mapping_document() {
        let result = parse_str("- just\n- a list\n", Path::new("carbon.yml"));
        assert!(matches!(result, Err(CarbonError::CatalogParse { .. })));
    }

    #[test]
    fn test_parse_rejects_invalid_yaml() {
        let result = parse_str("web: [unclosed\n", Path::new("carbon.yml"));
        assert!(matches!(result, Err(CarbonError::CatalogParse { .. })));
    }
}
