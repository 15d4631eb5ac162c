use crate::domain::model::Document;
use crate::domain::ports::{Format, FormatAdapter};
use crate::utils::error::{RegistryError, Result};
use serde_json::Value;

pub const DEFAULT_KEY_PREFIX: &str = "ID:";

/// Top-level JSON object of `"<prefix><id>": { vehicle document }`, pretty-printed.
#[derive(Debug, Clone)]
pub struct JsonAdapter {
    key_prefix: String,
}

impl JsonAdapter {
    pub fn new(key_prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
        }
    }
}

impl Default for JsonAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

impl FormatAdapter for JsonAdapter {
    fn format(&self) -> Format {
        Format::Json
    }

    fn entry_key(&self, id: u64) -> String {
        format!("{}{}", self.key_prefix, id)
    }

    /// Accepts both prefixed keys and bare numeric keys.
    fn parse_entry_key(&self, key: &str) -> Option<u64> {
        key.strip_prefix(self.key_prefix.as_str())
            .unwrap_or(key)
            .trim()
            .parse()
            .ok()
    }

    fn encode(&self, entries: &[(String, Document)]) -> Result<Vec<u8>> {
        let root = entries
            .iter()
            .map(|(key, doc)| (key.clone(), Value::Object(doc.clone())))
            .collect::<Document>();

        let mut data = serde_json::to_vec_pretty(&Value::Object(root))?;
        data.push(b'\n');
        Ok(data)
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<(String, Document)>> {
        let root: Value = serde_json::from_slice(data)?;
        let Value::Object(entries) = root else {
            return Err(RegistryError::malformed(
                "root",
                "expected a JSON object keyed by vehicle id",
            ));
        };

        entries
            .into_iter()
            .map(|(key, value)| match value {
                Value::Object(doc) => Ok((key, doc)),
                other => Err(RegistryError::malformed(
                    &key,
                    format!("expected a JSON object, got {}", other),
                )),
            })
            .collect()
    }
}
