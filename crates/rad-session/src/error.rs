//! Error types for configuration sessions

use rad_model::ConfigError;
use thiserror::Error;

use crate::driver::DriverError;
use crate::session::SessionState;

/// Errors that end a configuration session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Serial port could not be opened or configured
    #[error("failed to open port {port}: {reason}")]
    TransportOpen { port: String, reason: String },

    /// Reading the radio's image failed
    #[error("failed to read from radio: {0}")]
    SyncRead(String),

    /// Writing the image back failed
    #[error("failed to write to radio: {0}")]
    SyncWrite(String),

    /// Settings were accepted locally but refused by the radio or its driver
    #[error("radio rejected settings: {0}")]
    DeviceRejectedSettings(String),

    /// Caller input was invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Driver failed outside a sync operation
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// No clone driver is linked for this model and port
    #[error("no clone driver available for {model} on {port}")]
    NoDriver { model: String, port: String },

    /// Operation called in the wrong session state
    #[error("cannot move session from {from} to {to}")]
    InvalidTransition { from: SessionState, to: SessionState },

    #[error("transport is not open")]
    NotOpen,

    #[error("radio image has not been read")]
    NotSynced,
}

/// Coarse classification of a session failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    TransportOpen,
    SyncRead,
    SyncWrite,
    DeviceRejectedSettings,
    ProfileFormat,
    UnknownModel,
    MemoryRangeExceeded,
    InvalidInput,
    NoDriver,
    Driver,
    InvalidState,
}

impl FailureKind {
    /// Short name used in user-facing messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::TransportOpen => "transport open error",
            Self::SyncRead => "sync read error",
            Self::SyncWrite => "sync write error",
            Self::DeviceRejectedSettings => "device rejected settings",
            Self::ProfileFormat => "profile format error",
            Self::UnknownModel => "unknown model",
            Self::MemoryRangeExceeded => "memory range exceeded",
            Self::InvalidInput => "invalid input",
            Self::NoDriver => "no driver",
            Self::Driver => "driver error",
            Self::InvalidState => "invalid session state",
        }
    }

    /// Whether the failure came from caller input rather than the device
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::ProfileFormat
                | Self::UnknownModel
                | Self::MemoryRangeExceeded
                | Self::InvalidInput
                | Self::NoDriver
        )
    }
}

impl SessionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::TransportOpen { .. } => FailureKind::TransportOpen,
            Self::SyncRead(_) => FailureKind::SyncRead,
            Self::SyncWrite(_) => FailureKind::SyncWrite,
            Self::DeviceRejectedSettings(_) => FailureKind::DeviceRejectedSettings,
            Self::Config(e) => match e {
                ConfigError::ProfileFormat(_) => FailureKind::ProfileFormat,
                ConfigError::UnknownModel { .. } => FailureKind::UnknownModel,
                ConfigError::MemoryRangeExceeded { .. } => FailureKind::MemoryRangeExceeded,
                _ => FailureKind::InvalidInput,
            },
            Self::Driver(_) => FailureKind::Driver,
            Self::NoDriver { .. } => FailureKind::NoDriver,
            Self::InvalidTransition { .. } | Self::NotOpen | Self::NotSynced => {
                FailureKind::InvalidState
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_classify_as_input() {
        let err = SessionError::from(ConfigError::MemoryRangeExceeded {
            count: 3,
            capacity: 2,
        });
        assert_eq!(err.kind(), FailureKind::MemoryRangeExceeded);
        assert!(err.kind().is_input_error());
    }

    #[test]
    fn device_errors_are_not_input_errors() {
        let err = SessionError::SyncWrite("timeout".into());
        assert_eq!(err.kind(), FailureKind::SyncWrite);
        assert!(!err.kind().is_input_error());
        assert_eq!(err.to_string(), "failed to write to radio: timeout");
    }
}
