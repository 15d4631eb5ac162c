pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{
    codec::{FromDocument, ToDocument},
    exchange::ExchangeOptions,
    registry::VehicleDatabase,
};
pub use domain::model::{Document, Driver, Engine, LicenseClass, Passenger, Person, Ticket};
pub use domain::ports::{ConfigProvider, Format, Storage, UnknownRecordPolicy};
pub use domain::vehicle::{VariantTag, Vehicle, VehicleKind};
pub use utils::error::{RegistryError, Result};
