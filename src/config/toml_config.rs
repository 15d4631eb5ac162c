use crate::adapters::json::DEFAULT_KEY_PREFIX;
use crate::config::{LogFormat, DEFAULT_DATA_DIR, DEFAULT_STORE_NAME};
use crate::core::{ConfigProvider, Format, UnknownRecordPolicy};
use crate::utils::error::{RegistryError, Result};
use crate::utils::validation::{validate_file_name, validate_path, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub storage: StorageConfig,
    pub exchange: Option<ExchangeConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: Option<String>,
    pub name: Option<String>,
    pub format: Option<Format>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub key_prefix: Option<String>,
    pub on_unknown_record: Option<UnknownRecordPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<LogFormat>,
    pub verbose: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RegistryError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RegistryError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FLEET_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RegistryError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("storage.data_dir", self.data_dir())?;
        validate_file_name("storage.name", self.store_name())?;

        if self.data_dir().contains("${") {
            return Err(RegistryError::InvalidConfigValueError {
                field: "storage.data_dir".to_string(),
                value: self.data_dir().to_string(),
                reason: "Unresolved environment variable".to_string(),
            });
        }

        Ok(())
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging
            .as_ref()
            .and_then(|l| l.format)
            .unwrap_or_default()
    }

    pub fn verbose(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.verbose)
            .unwrap_or(false)
    }

    #[cfg(feature = "cli")]
    fn exchange_mut(&mut self) -> &mut ExchangeConfig {
        self.exchange.get_or_insert(ExchangeConfig {
            key_prefix: None,
            on_unknown_record: None,
        })
    }

    /// 命令列參數優先於檔案設定
    #[cfg(feature = "cli")]
    pub fn apply_overrides(&mut self, cli: &crate::config::CliConfig) {
        if let Some(data_dir) = &cli.data_dir {
            self.storage.data_dir = Some(data_dir.clone());
        }
        if let Some(name) = &cli.name {
            self.storage.name = Some(name.clone());
        }
        if let Some(format) = cli.format {
            self.storage.format = Some(format);
        }
        if let Some(prefix) = &cli.key_prefix {
            self.exchange_mut().key_prefix = Some(prefix.clone());
        }
        if cli.strict {
            self.exchange_mut().on_unknown_record = Some(UnknownRecordPolicy::Fail);
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn data_dir(&self) -> &str {
        self.storage.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR)
    }

    fn store_name(&self) -> &str {
        self.storage.name.as_deref().unwrap_or(DEFAULT_STORE_NAME)
    }

    fn format(&self) -> Format {
        self.storage.format.unwrap_or_default()
    }

    fn key_prefix(&self) -> &str {
        self.exchange
            .as_ref()
            .and_then(|e| e.key_prefix.as_deref())
            .unwrap_or(DEFAULT_KEY_PREFIX)
    }

    fn unknown_records(&self) -> UnknownRecordPolicy {
        self.exchange
            .as_ref()
            .and_then(|e| e.on_unknown_record)
            .unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[storage]
data_dir = "./fleet-data"
name = "depot"
format = "xml"

[exchange]
key_prefix = "VEH-"
on_unknown_record = "fail"

[logging]
format = "json"
verbose = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.data_dir(), "./fleet-data");
        assert_eq!(config.store_name(), "depot");
        assert_eq!(config.format(), Format::Xml);
        assert_eq!(config.key_prefix(), "VEH-");
        assert_eq!(config.unknown_records(), UnknownRecordPolicy::Fail);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert!(config.verbose());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("[storage]\n").unwrap();

        assert_eq!(config.data_dir(), DEFAULT_DATA_DIR);
        assert_eq!(config.store_name(), DEFAULT_STORE_NAME);
        assert_eq!(config.format(), Format::Json);
        assert_eq!(config.key_prefix(), "ID:");
        assert_eq!(config.unknown_records(), UnknownRecordPolicy::Skip);
        assert_eq!(config.log_format(), LogFormat::Compact);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("VEHICLE_REGISTRY_TEST_DIR", "/srv/fleet");

        let toml_content = r#"
[storage]
data_dir = "${VEHICLE_REGISTRY_TEST_DIR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.data_dir(), "/srv/fleet");

        std::env::remove_var("VEHICLE_REGISTRY_TEST_DIR");
    }

    #[test]
    fn test_unresolved_env_var_fails_validation() {
        let toml_content = r#"
[storage]
data_dir = "${VEHICLE_REGISTRY_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(TomlConfig::from_toml_str("[storage]\nformat = \"yaml\"\n").is_err());
        assert!(
            TomlConfig::from_toml_str("[storage]\n[exchange]\non_unknown_record = \"ignore\"\n")
                .is_err()
        );

        let config = TomlConfig::from_toml_str("[storage]\nname = \"  \"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[storage]\nname = \"file-test\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.store_name(), "file-test");
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_overrides_file_values() {
        use clap::Parser;

        let mut config = TomlConfig::from_toml_str(
            "[storage]\ndata_dir = \"./a\"\nname = \"depot\"\n[exchange]\nkey_prefix = \"VEH-\"\n",
        )
        .unwrap();
        let cli = crate::config::CliConfig::try_parse_from([
            "vehicle-registry",
            "--data-dir",
            "./b",
            "--strict",
            "list",
        ])
        .unwrap();

        config.apply_overrides(&cli);

        assert_eq!(config.data_dir(), "./b");
        assert_eq!(config.store_name(), "depot");
        assert_eq!(config.key_prefix(), "VEH-");
        assert_eq!(config.unknown_records(), UnknownRecordPolicy::Fail);
    }
}
