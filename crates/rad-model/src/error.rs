//! Error types for radio configuration inputs

use thiserror::Error;

/// Errors raised by a settings tree
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    /// No leaf with this name exists in the tree
    #[error("unknown setting: {0}")]
    UnknownSetting(String),
}

/// Errors raised by a memory bank accessor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BankError {
    /// Slot index outside the bank's addressable range
    #[error("memory slot {slot} is outside the addressable range {lower}-{upper}")]
    SlotOutOfRange { slot: u32, lower: u32, upper: u32 },
}

/// Caller-input errors, detected before the device is touched where possible
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Settings profile document is malformed
    #[error("invalid settings profile: {0}")]
    ProfileFormat(String),

    /// Model identifier not present in the registry
    #[error("unknown radio model '{model}' (known models: {})", .known.join(", "))]
    UnknownModel { model: String, known: Vec<String> },

    /// More memories than the model has programmable slots
    #[error("{count} memories do not fit into {capacity} programmable slots")]
    MemoryRangeExceeded { count: usize, capacity: usize },

    /// A registry entry is inconsistent
    #[error("invalid model definition for '{model}': {reason}")]
    InvalidModelSpec { model: String, reason: String },

    /// A memory record could not be built
    #[error("invalid memory record: {0}")]
    InvalidRecord(String),

    /// Settings tree rejected an access
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Memory bank rejected an access
    #[error(transparent)]
    Bank(#[from] BankError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_lists_known_ids() {
        let err = ConfigError::UnknownModel {
            model: "zz99".into(),
            known: vec!["uv5r".into(), "rt470".into()],
        };
        assert_eq!(
            err.to_string(),
            "unknown radio model 'zz99' (known models: uv5r, rt470)"
        );
    }

    #[test]
    fn range_exceeded_names_counts() {
        let err = ConfigError::MemoryRangeExceeded {
            count: 130,
            capacity: 127,
        };
        assert!(err.to_string().contains("130"));
        assert!(err.to_string().contains("127"));
    }
}
