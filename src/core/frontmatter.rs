//! Frontmatter - leading `---` YAML blocks
//!
//! The block is parsed as a YAML mapping. Scalars are kept as strings
//! (`priority: 2` reads as `"2"`), while lists and nested mappings keep their
//! structure as JSON values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_yaml::Value as Yaml;
use tracing::warn;

const DELIMITER: &str = "---";

/// Parsed frontmatter fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontmatter {
    fields: BTreeMap<String, Value>,
}

impl Frontmatter {
    /// A string-valued field
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    fn parse(yaml: &str) -> Self {
        if yaml.trim().is_empty() {
            return Self::default();
        }

        let fields = match serde_yaml::from_str::<Yaml>(yaml) {
            Ok(Yaml::Mapping(map)) => map
                .into_iter()
                .filter_map(|(k, v)| Some((scalar(&k)?, to_json(v))))
                .collect(),
            Ok(Yaml::Null) => BTreeMap::new(),
            Ok(_) => {
                warn!("Frontmatter is not a mapping; ignoring it");
                BTreeMap::new()
            }
            Err(e) => {
                warn!("Invalid frontmatter YAML: {}", e);
                BTreeMap::new()
            }
        };

        Self { fields }
    }
}

/// Split a document into its frontmatter (if any) and the remaining body
///
/// A block only counts when the first line is `---` and a closing `---`
/// line follows; otherwise the whole input is body. A block that is not
/// valid YAML still ends at its closing line but yields no fields.
pub fn split(content: &str) -> (Option<Frontmatter>, &str) {
    let mut lines = content.split_inclusive('\n');

    let start = match lines.next() {
        Some(first) if first.trim_end() == DELIMITER => first.len(),
        _ => return (None, content),
    };

    let mut offset = start;
    for line in lines {
        let line_start = offset;
        offset += line.len();

        if line.trim() == DELIMITER {
            let yaml = &content[start..line_start];
            return (Some(Frontmatter::parse(yaml)), &content[offset..]);
        }
    }

    // Unterminated block
    (None, content)
}

fn scalar(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn to_json(value: Yaml) -> Value {
    match value {
        Yaml::Null => Value::Null,
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(to_json).collect()),
        Yaml::Mapping(map) => Value::Object(
            map.into_iter()
                .filter_map(|(k, v)| Some((scalar(&k)?, to_json(v))))
                .collect(),
        ),
        Yaml::Tagged(tagged) => to_json(tagged.value),
        other => scalar(&other).map_or(Value::Null, Value::String),
    }
}
