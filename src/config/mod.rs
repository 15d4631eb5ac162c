pub mod cli;
pub mod toml_config;

use crate::core::{ConfigProvider, Format, UnknownRecordPolicy};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_STORE_NAME: &str = "vehicles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[cfg(feature = "cli")]
pub use args::{CliConfig, Command};

#[cfg(feature = "cli")]
mod args {
    use super::*;
    use crate::adapters::json::DEFAULT_KEY_PREFIX;
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_file_name, validate_path, Validate};
    use clap::{Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "vehicle-registry")]
    #[command(about = "A small registry of cars, trucks, motorcycles and buses")]
    pub struct CliConfig {
        /// Path to a TOML configuration file
        #[arg(short, long, global = true)]
        pub config: Option<String>,

        /// Directory holding the registry files [default: ./data]
        #[arg(long, global = true)]
        pub data_dir: Option<String>,

        /// Base name of the registry file [default: vehicles]
        #[arg(long, global = true)]
        pub name: Option<String>,

        /// Storage format of the registry file: json or xml [default: json]
        #[arg(long, global = true)]
        pub format: Option<Format>,

        /// Prefix for vehicle keys in JSON files [default: "ID:"]
        #[arg(long, global = true)]
        pub key_prefix: Option<String>,

        /// Fail on records that match no vehicle variant instead of skipping them
        #[arg(long, global = true)]
        pub strict: bool,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        /// Emit logs as JSON lines
        #[arg(long, global = true)]
        pub log_json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// List every registered vehicle
        List,
        /// Print one vehicle as a JSON document
        Show { id: u64 },
        /// Add a vehicle from a JSON document
        Add { document: String },
        /// Replace the vehicle stored under an ID with a JSON document
        Update { id: u64, document: String },
        /// Remove a vehicle
        Remove { id: u64 },
        /// Write the registry to another file
        Export {
            #[arg(long)]
            to: Format,
            #[arg(long)]
            output: Option<String>,
        },
        /// Merge vehicles from another file into the registry
        Import {
            #[arg(long)]
            from: Format,
            #[arg(long)]
            source: Option<String>,
        },
        /// Seed the registry with a sample fleet
        Demo,
    }

    impl ConfigProvider for CliConfig {
        fn data_dir(&self) -> &str {
            self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR)
        }

        fn store_name(&self) -> &str {
            self.name.as_deref().unwrap_or(DEFAULT_STORE_NAME)
        }

        fn format(&self) -> Format {
            self.format.unwrap_or_default()
        }

        fn key_prefix(&self) -> &str {
            self.key_prefix.as_deref().unwrap_or(DEFAULT_KEY_PREFIX)
        }

        fn unknown_records(&self) -> UnknownRecordPolicy {
            if self.strict {
                UnknownRecordPolicy::Fail
            } else {
                UnknownRecordPolicy::Skip
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("data_dir", self.data_dir())?;
            validate_file_name("name", self.store_name())?;
            Ok(())
        }
    }

}
