//! Port selection
//!
//! `sim:<path>` ports run against a virtual radio whose image lives in a
//! JSON file; anything else is a physical serial port.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rad_model::ModelRegistry;
use rad_session::{RadioSession, SerialDriverCatalog, SessionError, SessionPlan, SessionReport};
use rad_sim::{RadioImage, VirtualCatalog, VirtualDevice};
use tracing::{debug, info};

const VIRTUAL_PREFIX: &str = "sim:";

/// Where a radio is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Port {
    /// Virtual radio persisted to an image file
    Virtual(PathBuf),
    /// Serial device path or name
    Serial(String),
}

impl Port {
    pub fn parse(port: &str) -> Self {
        match port.strip_prefix(VIRTUAL_PREFIX) {
            Some(path) => Self::Virtual(PathBuf::from(path)),
            None => Self::Serial(port.to_string()),
        }
    }
}

/// Run `plan` against the radio on `port`
pub fn execute(
    registry: &ModelRegistry,
    model_id: &str,
    port: &str,
    plan: SessionPlan,
) -> Result<SessionReport> {
    match Port::parse(port) {
        Port::Virtual(path) => {
            let adapter = registry.resolve(model_id).map_err(SessionError::from)?;
            let image = RadioImage::load_or_factory(&path, adapter)
                .with_context(|| format!("Failed to load virtual radio {}", path.display()))?;
            let device = VirtualDevice::new(image);
            let catalog = VirtualCatalog::new(device.clone());

            let report = RadioSession::new(registry, model_id, port, &catalog)?
                .with_pause(|delay| debug!("Virtual radio skips {:?} reset wait", delay))
                .execute(plan)?;

            if report.flushed {
                device
                    .image()
                    .save(&path)
                    .with_context(|| format!("Failed to save virtual radio {}", path.display()))?;
                info!("Saved virtual radio to {}", path.display());
            }
            Ok(report)
        }
        Port::Serial(name) => {
            // Clone drivers for physical radios are registered by driver
            // libraries; none are linked into this binary.
            let catalog = SerialDriverCatalog::new();
            Ok(RadioSession::new(registry, model_id, name, &catalog)?.execute(plan)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rad_model::{MemoryRecord, PowerLevel};
    use rad_session::FailureKind;

    fn kind(err: &anyhow::Error) -> Option<FailureKind> {
        err.downcast_ref::<SessionError>().map(SessionError::kind)
    }

    #[test]
    fn parse_ports() {
        assert_eq!(
            Port::parse("sim:/tmp/uv5r.json"),
            Port::Virtual(PathBuf::from("/tmp/uv5r.json"))
        );
        assert_eq!(Port::parse("COM3"), Port::Serial("COM3".into()));
        assert_eq!(
            Port::parse("/dev/ttyUSB0"),
            Port::Serial("/dev/ttyUSB0".into())
        );
    }

    #[test]
    fn virtual_radio_persists_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rt470.json");
        let port = format!("sim:{}", path.display());
        let registry = ModelRegistry::builtin();
        let records = vec![MemoryRecord::new("CH1", 446_006_250, PowerLevel::new("High", 5000))];

        execute(&registry, "rt470", &port, SessionPlan::reconfigure(None, Some(records))).unwrap();
        assert!(path.exists());

        let report = execute(&registry, "rt470", &port, SessionPlan::inspect()).unwrap();
        assert!(!report.flushed);
        let image = RadioImage::load(&path).unwrap();
        assert_eq!(image.occupied().count(), 1);
    }

    #[test]
    fn inspection_does_not_create_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uv5r.json");
        let port = format!("sim:{}", path.display());

        execute(&ModelRegistry::builtin(), "uv5r", &port, SessionPlan::inspect()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn unknown_model_on_virtual_port() {
        let err = execute(
            &ModelRegistry::builtin(),
            "zz99",
            "sim:/nonexistent/zz99.json",
            SessionPlan::inspect(),
        )
        .unwrap_err();
        assert_eq!(kind(&err), Some(FailureKind::UnknownModel));
    }

    #[test]
    fn physical_port_without_driver() {
        let err = execute(
            &ModelRegistry::builtin(),
            "uv5r",
            "/dev/ttyUSB0",
            SessionPlan::inspect(),
        )
        .unwrap_err();
        assert_eq!(kind(&err), Some(FailureKind::NoDriver));
    }
}
