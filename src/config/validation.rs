use super::models::{Config, StorageSettings};
use crate::jar::{CookieOptions, SameSite};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Index key must not be empty")]
    EmptyIndexKey,

    #[error("Cookie attribute {attribute} has an invalid value: {value:?}")]
    InvalidAttribute { attribute: &'static str, value: String },

    #[error("SameSite=None cookies must also be Secure")]
    InsecureSameSiteNone,

    #[error("Expiration override for '{key}' targets the index cookie '{index_key}'")]
    OverrideOnIndexKey { key: String, index_key: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_index_key(&config.storage)?;
    validate_cookie_options(&config.storage.cookie)?;
    validate_expiration_keys(&config.storage)?;
    Ok(())
}

fn validate_index_key(storage: &StorageSettings) -> Result<(), ValidationError> {
    if storage.index_key.trim().is_empty() {
        return Err(ValidationError::EmptyIndexKey);
    }
    Ok(())
}

/// Attribute values end up verbatim in `Set-Cookie` lines
fn validate_cookie_options(options: &CookieOptions) -> Result<(), ValidationError> {
    let attributes = [("Domain", &options.domain), ("Path", &options.path)];

    for (attribute, value) in attributes {
        if let Some(value) = value {
            let invalid = value.is_empty()
                || value
                    .chars()
                    .any(|c| c == ';' || c.is_control() || c.is_whitespace());
            if invalid {
                return Err(ValidationError::InvalidAttribute {
                    attribute,
                    value: value.clone(),
                });
            }
        }
    }

    if options.same_site == Some(SameSite::None) && !options.secure {
        return Err(ValidationError::InsecureSameSiteNone);
    }

    Ok(())
}

/// A key whose cookie name equals the index key can never be written
fn validate_expiration_keys(storage: &StorageSettings) -> Result<(), ValidationError> {
    for key in storage.expiration.keys.keys() {
        if format!("{}{}", storage.key_prefix, key) == storage.index_key {
            return Err(ValidationError::OverrideOnIndexKey {
                key: key.clone(),
                index_key: storage.index_key.clone(),
            });
        }
    }
    Ok(())
}
