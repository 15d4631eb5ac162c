use crate::adapters::adapter_for;
use crate::adapters::json::DEFAULT_KEY_PREFIX;
use crate::core::codec::{decode_vehicle, ToDocument};
use crate::core::registry::VehicleDatabase;
use crate::domain::model::Document;
use crate::domain::ports::{ConfigProvider, Format, Storage, UnknownRecordPolicy};
use crate::domain::vehicle::Vehicle;
use crate::utils::error::{RegistryError, Result};
use crate::utils::validation::validate_file_name;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOptions {
    /// Prefix of JSON entry keys, e.g. `ID:` in `"ID:3"`.
    pub key_prefix: String,
    pub unknown_records: UnknownRecordPolicy,
}

impl Default for ExchangeOptions {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            unknown_records: UnknownRecordPolicy::Skip,
        }
    }
}

impl ExchangeOptions {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            key_prefix: config.key_prefix().to_string(),
            unknown_records: config.unknown_records(),
        }
    }

    pub fn strict(mut self) -> Self {
        self.unknown_records = UnknownRecordPolicy::Fail;
        self
    }
}

fn in_entry(key: &str, err: RegistryError) -> RegistryError {
    match err {
        RegistryError::MalformedRecord { record, reason } => RegistryError::MalformedRecord {
            record: format!("{}/{}", key, record),
            reason,
        },
        other => other,
    }
}

impl VehicleDatabase {
    /// Writes every entry to `<name>.<ext>` in `storage`, replacing the file.
    ///
    /// Returns the file name that was written.
    pub fn export_to<S: Storage>(
        &self,
        storage: &S,
        format: Format,
        name: &str,
        options: &ExchangeOptions,
    ) -> Result<String> {
        validate_file_name("name", name)?;
        let adapter = adapter_for(format, &options.key_prefix);

        let entries: Vec<(String, Document)> = self
            .iter()
            .map(|(id, vehicle)| (adapter.entry_key(id), vehicle.to_document()))
            .collect();
        let data = adapter.encode(&entries)?;

        let file_name = format.file_name(name);
        tracing::debug!("Writing {} bytes to {}", data.len(), file_name);
        storage.write_file(&file_name, &data)?;

        tracing::info!("📤 Exported {} vehicles to {}", entries.len(), file_name);
        Ok(file_name)
    }

    /// Reads `<source>.<ext>` and adds every decoded vehicle to `target`.
    ///
    /// Nothing is inserted unless the whole file decodes and none of its ids
    /// collide with `target` or with each other. Returns the number imported.
    pub fn import_from<S: Storage>(
        storage: &S,
        format: Format,
        source: Option<&str>,
        target: &mut VehicleDatabase,
        options: &ExchangeOptions,
    ) -> Result<usize> {
        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RegistryError::ImportSourceMissing {
                location: "no source given".to_string(),
            })?;
        validate_file_name("source", source)?;

        let file_name = format.file_name(source);
        let data = match storage.read_file(&file_name) {
            Ok(data) => data,
            Err(RegistryError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RegistryError::ImportSourceMissing {
                    location: file_name,
                })
            }
            Err(e) => return Err(e),
        };

        let adapter = adapter_for(format, &options.key_prefix);
        let mut staged: Vec<(u64, Vehicle)> = Vec::new();
        let mut skipped = 0usize;

        for (key, doc) in adapter.decode(&data)? {
            let Some(vehicle) =
                decode_vehicle(&doc, options.unknown_records).map_err(|e| in_entry(&key, e))?
            else {
                skipped += 1;
                continue;
            };

            let id = adapter.parse_entry_key(&key).ok_or_else(|| {
                RegistryError::malformed(&key, "cannot read a vehicle id from the entry key")
            })?;
            if id != vehicle.id() {
                tracing::warn!(
                    "Entry {} carries vehicle id {}; keeping it under #{}",
                    key,
                    vehicle.id(),
                    id
                );
            }
            staged.push((id, vehicle));
        }

        // 全部檢查通過才寫入，避免匯入到一半
        let mut seen = HashSet::new();
        for (id, _) in &staged {
            if target.contains(*id) || !seen.insert(*id) {
                return Err(RegistryError::DuplicateId(*id));
            }
        }

        let imported = staged.len();
        for (id, vehicle) in staged {
            target.insert(id, vehicle)?;
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} records with no known vehicle variant", skipped);
        }
        tracing::info!("📥 Imported {} vehicles from {}", imported, file_name);
        Ok(imported)
    }

    /// Imports into a fresh registry.
    pub fn load_from<S: Storage>(
        storage: &S,
        format: Format,
        source: Option<&str>,
        options: &ExchangeOptions,
    ) -> Result<Self> {
        let mut db = Self::new();
        Self::import_from(storage, format, source, &mut db, options)?;
        Ok(db)
    }
}
