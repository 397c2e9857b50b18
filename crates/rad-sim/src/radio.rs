//! Clone driver for virtual radios

use rad_model::{MemoryBank, ModelAdapter, SettingsGroup};
use rad_session::{Backend, DriverCatalog, DriverError, Link, RadioDriver, SessionError};
use tracing::debug;

use crate::device::{VirtualDevice, ACK, CMD_READ, CMD_WRITE, NAK};
use crate::image::RadioImage;

/// Driver speaking the virtual clone protocol
#[derive(Debug)]
pub struct VirtualRadio {
    model: String,
    image: Option<RadioImage>,
}

impl VirtualRadio {
    pub fn new(model: &ModelAdapter) -> Self {
        Self {
            model: model.id().to_string(),
            image: None,
        }
    }

    /// Downloaded (and possibly edited) image
    pub fn image(&self) -> Option<&RadioImage> {
        self.image.as_ref()
    }

    fn loaded(&mut self) -> Result<&mut RadioImage, DriverError> {
        self.image.as_mut().ok_or(DriverError::NotLoaded)
    }
}

fn exchange(link: &mut dyn Link, request: &[u8]) -> Result<Vec<u8>, DriverError> {
    link.write_all(request)?;
    link.flush()?;
    let mut reply = Vec::new();
    link.read_to_end(&mut reply)?;
    Ok(reply)
}

impl RadioDriver for VirtualRadio {
    fn sync_in(&mut self, link: &mut dyn Link) -> Result<(), DriverError> {
        let reply = exchange(link, &[CMD_READ])?;
        let body = match reply.split_first() {
            Some((&ACK, body)) => body,
            _ => return Err(DriverError::Protocol("radio did not acknowledge".into())),
        };

        let image: RadioImage =
            serde_json::from_slice(body).map_err(|e| DriverError::Protocol(e.to_string()))?;
        if image.model != self.model {
            return Err(DriverError::Protocol(format!(
                "radio identifies as '{}', expected '{}'",
                image.model, self.model
            )));
        }

        debug!(
            "Read {} image ({} bytes, {} memories)",
            image.model,
            body.len(),
            image.occupied().count()
        );
        self.image = Some(image);
        Ok(())
    }

    fn sync_out(&mut self, link: &mut dyn Link) -> Result<(), DriverError> {
        let image = self.image.as_ref().ok_or(DriverError::NotLoaded)?;
        let mut request = vec![CMD_WRITE];
        request.extend(serde_json::to_vec(image).map_err(|e| DriverError::Protocol(e.to_string()))?);

        let reply = exchange(link, &request)?;
        match reply.split_first() {
            Some((&ACK, _)) => {
                debug!("Wrote {} image ({} bytes)", image.model, request.len() - 1);
                Ok(())
            }
            Some((&NAK, reason)) => Err(DriverError::Rejected(
                String::from_utf8_lossy(reason).into_owned(),
            )),
            _ => Err(DriverError::Protocol("no acknowledgement for write".into())),
        }
    }

    fn settings(&self) -> Result<SettingsGroup, DriverError> {
        self.image
            .as_ref()
            .map(|image| image.settings.clone())
            .ok_or(DriverError::NotLoaded)
    }

    fn set_settings(&mut self, settings: &SettingsGroup) -> Result<(), DriverError> {
        self.loaded()?.settings = settings.clone();
        Ok(())
    }

    fn memory_bank(&mut self) -> Result<&mut dyn MemoryBank, DriverError> {
        let bank: &mut dyn MemoryBank = self.loaded()?;
        Ok(bank)
    }
}

/// Catalog routing every model to one virtual radio
#[derive(Debug, Clone)]
pub struct VirtualCatalog {
    device: VirtualDevice,
}

impl VirtualCatalog {
    pub fn new(device: VirtualDevice) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &VirtualDevice {
        &self.device
    }
}

impl DriverCatalog for VirtualCatalog {
    fn backend_for(&self, model: &ModelAdapter, port: &str) -> Result<Backend, SessionError> {
        debug!("Using virtual radio for {} on {}", model.id(), port);
        Ok(Backend {
            connector: Box::new(self.device.connector()),
            driver: Box::new(VirtualRadio::new(model)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rad_model::{LinkParams, ModelRegistry};
    use rad_session::Connector;

    #[test]
    fn driver_round_trip() {
        let registry = ModelRegistry::builtin();
        let uv25 = registry.resolve("uv25").unwrap();
        let device = VirtualDevice::factory(uv25);
        let mut link = device
            .connector()
            .open("sim:uv25", &LinkParams::default())
            .unwrap();
        let mut driver = VirtualRadio::new(uv25);

        assert!(matches!(driver.settings(), Err(DriverError::NotLoaded)));
        assert!(driver.image().is_none());
        driver.sync_in(&mut *link).unwrap();
        assert_eq!(driver.image(), Some(&device.image()));

        let mut settings = driver.settings().unwrap();
        rad_model::SettingsTree::write(&mut settings, "beep", false.into()).unwrap();
        driver.set_settings(&settings).unwrap();
        driver.sync_out(&mut *link).unwrap();

        assert_eq!(device.image().settings, settings);
    }

    #[test]
    fn wrong_model_is_protocol_error() {
        let registry = ModelRegistry::builtin();
        let device = VirtualDevice::factory(registry.resolve("uv5r").unwrap());
        let mut link = device
            .connector()
            .open("sim:uv5r", &LinkParams::default())
            .unwrap();
        let mut driver = VirtualRadio::new(registry.resolve("rt470").unwrap());

        let err = driver.sync_in(&mut *link).unwrap_err();
        assert!(err.to_string().contains("identifies as 'uv5r'"));
    }

    #[test]
    fn catalog_routes_to_its_device() {
        let registry = ModelRegistry::builtin();
        let rt470 = registry.resolve("rt470").unwrap();
        let catalog = VirtualCatalog::new(VirtualDevice::factory(rt470));

        let backend = catalog.backend_for(rt470, "sim:rt470").unwrap();
        let mut link = backend.connector.open("sim:rt470", rt470.link()).unwrap();

        assert!(catalog.device().is_open());
        link.close().unwrap();
        assert!(!catalog.device().is_open());
        assert_eq!(catalog.device().counters().opens, 1);
    }
}
