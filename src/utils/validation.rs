use crate::utils::error::{RegistryError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// 檔名只允許相對路徑，且不能以分隔符結尾
pub fn validate_file_name(field_name: &str, name: &str) -> Result<()> {
    validate_path(field_name, name)?;
    validate_non_empty_string(field_name, name)?;

    if name.ends_with('/') || name.ends_with('\\') {
        return Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "File name cannot end with a path separator".to_string(),
        });
    }

    if std::path::Path::new(name).is_absolute() {
        return Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "File name must be relative to the data directory".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RegistryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("storage.data_dir", "./data").is_ok());
        assert!(validate_path("storage.data_dir", "").is_err());
        assert!(validate_path("storage.data_dir", "da\0ta").is_err());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("storage.name", "fleet").is_ok());
        assert!(validate_file_name("storage.name", "backups/fleet.json").is_ok());
        assert!(validate_file_name("storage.name", "   ").is_err());
        assert!(validate_file_name("storage.name", "backups/").is_err());
        assert!(validate_file_name("storage.name", "/etc/fleet").is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("exchange.key_prefix", "ID:").is_ok());
        assert!(validate_non_empty_string("exchange.key_prefix", " \t").is_err());
    }
}
