use crate::domain::model::Document;
use crate::utils::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    /// Replaces any previous content at `path`.
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    /// Appends the format extension unless the name already carries it.
    pub fn file_name(&self, base: &str) -> String {
        let suffix = format!(".{}", self.extension());
        if base.to_ascii_lowercase().ends_with(&suffix) {
            base.to_string()
        } else {
            format!("{}{}", base, suffix)
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            other => Err(RegistryError::InvalidConfigValueError {
                field: "format".to_string(),
                value: other.to_string(),
                reason: "Unsupported format. Valid formats: json, xml".to_string(),
            }),
        }
    }
}

/// What to do with a record that matches no vehicle variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRecordPolicy {
    #[default]
    Skip,
    Fail,
}

/// Converts wrapped vehicle documents to and from one wire format.
pub trait FormatAdapter {
    fn format(&self) -> Format;
    fn entry_key(&self, id: u64) -> String;
    fn parse_entry_key(&self, key: &str) -> Option<u64>;
    fn encode(&self, entries: &[(String, Document)]) -> Result<Vec<u8>>;
    fn decode(&self, data: &[u8]) -> Result<Vec<(String, Document)>>;
}

pub trait ConfigProvider {
    fn data_dir(&self) -> &str;
    fn store_name(&self) -> &str;
    fn format(&self) -> Format;
    fn key_prefix(&self) -> &str;
    fn unknown_records(&self) -> UnknownRecordPolicy;
}
