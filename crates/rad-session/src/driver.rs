//! Clone driver seam
//!
//! Model-specific clone protocols live outside this crate. A
//! [`RadioDriver`] downloads a radio's image over a [`Link`], exposes the
//! image's settings tree and memory bank for local editing, and uploads
//! the edited image again.

use std::collections::HashMap;
use std::io;

use rad_model::{MemoryBank, ModelAdapter, SettingsGroup};
use thiserror::Error;
use tracing::debug;

use crate::error::SessionError;
use crate::transport::{Connector, Link, SerialConnector};

/// Errors reported by a driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Radio answered with something the driver did not expect
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Radio or driver refused a value
    #[error("{0}")]
    Rejected(String),

    #[error("radio image has not been downloaded")]
    NotLoaded,
}

/// Model-specific clone protocol
pub trait RadioDriver {
    /// Download the radio's image
    fn sync_in(&mut self, link: &mut dyn Link) -> Result<(), DriverError>;

    /// Upload the (edited) image
    fn sync_out(&mut self, link: &mut dyn Link) -> Result<(), DriverError>;

    /// Settings tree of the downloaded image
    fn settings(&self) -> Result<SettingsGroup, DriverError>;

    /// Store an edited settings tree into the image
    fn set_settings(&mut self, settings: &SettingsGroup) -> Result<(), DriverError>;

    /// Memory bank of the downloaded image
    fn memory_bank(&mut self) -> Result<&mut dyn MemoryBank, DriverError>;
}

/// Connector and driver for one radio
pub struct Backend {
    pub connector: Box<dyn Connector>,
    pub driver: Box<dyn RadioDriver>,
}

/// Chooses a backend for a model on a port
pub trait DriverCatalog {
    fn backend_for(&self, model: &ModelAdapter, port: &str) -> Result<Backend, SessionError>;
}

/// Builds a driver for a model
pub type DriverFactory = fn(&ModelAdapter) -> Box<dyn RadioDriver>;

/// Catalog of clone drivers for physical serial ports
///
/// Driver libraries register a factory per model id at startup.
#[derive(Default)]
pub struct SerialDriverCatalog {
    factories: HashMap<String, DriverFactory>,
}

impl SerialDriverCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the driver for a model id
    pub fn register(mut self, model_id: impl Into<String>, factory: DriverFactory) -> Self {
        self.factories.insert(model_id.into(), factory);
        self
    }

    pub fn supports(&self, model_id: &str) -> bool {
        self.factories.contains_key(model_id)
    }
}

impl DriverCatalog for SerialDriverCatalog {
    fn backend_for(&self, model: &ModelAdapter, port: &str) -> Result<Backend, SessionError> {
        let factory = self
            .factories
            .get(model.id())
            .ok_or_else(|| SessionError::NoDriver {
                model: model.display_name(),
                port: port.to_string(),
            })?;

        debug!("Using serial clone driver for {}", model.id());
        Ok(Backend {
            connector: Box::new(SerialConnector),
            driver: factory(model),
        })
    }
}
