//! Virtual radio hardware
//!
//! A [`VirtualDevice`] stands in for a handheld on the end of a clone
//! cable. It speaks a minimal clone protocol over a [`VirtualLink`]:
//!
//! | Request | Reply |
//! |---|---|
//! | `R` | `ACK` followed by the JSON image |
//! | `W` + JSON image | `ACK`, or `NAK` followed by a reason |
//!
//! Requests are executed when the link is flushed. Faults can be injected
//! to exercise every failure path of a session, and counters record what
//! the device saw.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

use rad_model::{LinkParams, ModelAdapter, SettingsTree};
use rad_session::{Connector, Link, SessionError};
use tracing::{debug, trace};

use crate::image::RadioImage;

/// Clone read request
pub const CMD_READ: u8 = b'R';
/// Clone write request
pub const CMD_WRITE: u8 = b'W';
/// Positive acknowledgement
pub const ACK: u8 = 0x06;
/// Negative acknowledgement
pub const NAK: u8 = 0x15;

/// Failures the device should produce
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Faults {
    /// Opening the port fails
    pub fail_open: bool,
    /// Clone reads time out
    pub fail_sync_in: bool,
    /// Clone writes time out
    pub fail_sync_out: bool,
    /// Writes that change this setting are refused
    pub reject_setting: Option<String>,
}

/// What the device has seen so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub opens: u32,
    pub closes: u32,
    pub sync_ins: u32,
    pub sync_outs: u32,
    /// Highest number of links open at the same time
    pub max_open_links: u32,
}

#[derive(Debug)]
struct DeviceState {
    image: RadioImage,
    faults: Faults,
    counters: Counters,
    open_links: u32,
}

impl DeviceState {
    fn handle(&mut self, request: &[u8]) -> io::Result<Vec<u8>> {
        match request.split_first() {
            Some((&CMD_READ, _)) => {
                self.counters.sync_ins += 1;
                if self.faults.fail_sync_in {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "radio did not answer the clone request",
                    ));
                }
                let mut reply = vec![ACK];
                reply.extend(serde_json::to_vec(&self.image)?);
                Ok(reply)
            }
            Some((&CMD_WRITE, body)) => {
                self.counters.sync_outs += 1;
                if self.faults.fail_sync_out {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "radio stopped acknowledging blocks",
                    ));
                }
                let image: RadioImage = serde_json::from_slice(body)?;
                if let Some(reason) = self.refusal(&image) {
                    debug!("Virtual {} refused write: {}", self.image.model, reason);
                    let mut reply = vec![NAK];
                    reply.extend(reason.into_bytes());
                    return Ok(reply);
                }
                self.image = image;
                Ok(vec![ACK])
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unknown clone command",
            )),
        }
    }

    fn refusal(&self, incoming: &RadioImage) -> Option<String> {
        if incoming.model != self.image.model {
            return Some(format!("image for '{}' does not fit", incoming.model));
        }
        let name = self.faults.reject_setting.as_deref()?;
        let current = self.image.settings.read(name);
        let proposed = incoming.settings.read(name);
        if current != proposed {
            let shown = proposed.map(|v| v.to_string()).unwrap_or_default();
            Some(format!("value {} for {} out of range", shown, name))
        } else {
            None
        }
    }
}

/// Shared handle to one virtual radio
#[derive(Debug, Clone)]
pub struct VirtualDevice {
    inner: Rc<RefCell<DeviceState>>,
}

impl VirtualDevice {
    pub fn new(image: RadioImage) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DeviceState {
                image,
                faults: Faults::default(),
                counters: Counters::default(),
                open_links: 0,
            })),
        }
    }

    /// Radio fresh from the factory
    pub fn factory(model: &ModelAdapter) -> Self {
        Self::new(RadioImage::factory(model))
    }

    pub fn with_faults(self, faults: Faults) -> Self {
        self.set_faults(faults);
        self
    }

    pub fn set_faults(&self, faults: Faults) {
        self.inner.borrow_mut().faults = faults;
    }

    /// Current contents of the radio
    pub fn image(&self) -> RadioImage {
        self.inner.borrow().image.clone()
    }

    pub fn counters(&self) -> Counters {
        self.inner.borrow().counters
    }

    /// Whether any link to the device is still open
    pub fn is_open(&self) -> bool {
        self.inner.borrow().open_links > 0
    }

    pub fn connector(&self) -> VirtualConnector {
        VirtualConnector {
            device: self.clone(),
        }
    }
}

/// Opens links to a [`VirtualDevice`]
#[derive(Debug, Clone)]
pub struct VirtualConnector {
    device: VirtualDevice,
}

impl Connector for VirtualConnector {
    fn open(&self, port: &str, params: &LinkParams) -> Result<Box<dyn Link>, SessionError> {
        let mut state = self.device.inner.borrow_mut();
        if state.faults.fail_open {
            return Err(SessionError::TransportOpen {
                port: port.to_string(),
                reason: "device or resource busy".to_string(),
            });
        }

        state.counters.opens += 1;
        state.open_links += 1;
        state.counters.max_open_links = state.counters.max_open_links.max(state.open_links);
        debug!(
            "Virtual {} opened on {} at {} baud",
            state.image.model, port, params.baud_rate
        );

        Ok(Box::new(VirtualLink {
            device: self.device.clone(),
            port: port.to_string(),
            request: Vec::new(),
            reply: VecDeque::new(),
            closed: false,
        }))
    }
}

/// Byte link to a [`VirtualDevice`]
#[derive(Debug)]
pub struct VirtualLink {
    device: VirtualDevice,
    port: String,
    request: Vec<u8>,
    reply: VecDeque<u8>,
    closed: bool,
}

impl VirtualLink {
    fn ensure_open(&self) -> io::Result<()> {
        if self.closed {
            Err(io::Error::new(io::ErrorKind::NotConnected, "link closed"))
        } else {
            Ok(())
        }
    }
}

impl Read for VirtualLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_open()?;
        self.reply.read(buf)
    }
}

impl Write for VirtualLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_open()?;
        self.request.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        if self.request.is_empty() {
            return Ok(());
        }
        let request = std::mem::take(&mut self.request);
        trace!("{} <- {} bytes", self.port, request.len());
        let reply = self.device.inner.borrow_mut().handle(&request)?;
        trace!("{} -> {} bytes", self.port, reply.len());
        self.reply.extend(reply);
        Ok(())
    }
}

impl Link for VirtualLink {
    fn port_name(&self) -> &str {
        &self.port
    }

    fn close(&mut self) -> io::Result<()> {
        if !self.closed {
            self.closed = true;
            let mut state = self.device.inner.borrow_mut();
            state.open_links = state.open_links.saturating_sub(1);
            state.counters.closes += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rad_model::ModelRegistry;

    fn device() -> VirtualDevice {
        let registry = ModelRegistry::builtin();
        VirtualDevice::factory(registry.resolve("rt470x").unwrap())
    }

    fn exchange(link: &mut dyn Link, request: &[u8]) -> io::Result<Vec<u8>> {
        link.write_all(request)?;
        link.flush()?;
        let mut reply = Vec::new();
        link.read_to_end(&mut reply)?;
        Ok(reply)
    }

    #[test]
    fn read_returns_image() {
        let device = device();
        let mut link = device
            .connector()
            .open("sim:test", &LinkParams::default())
            .unwrap();

        let reply = exchange(&mut *link, &[CMD_READ]).unwrap();

        assert_eq!(reply[0], ACK);
        let image: RadioImage = serde_json::from_slice(&reply[1..]).unwrap();
        assert_eq!(image, device.image());
        assert_eq!(device.counters().sync_ins, 1);
    }

    #[test]
    fn refused_setting_is_nak() {
        let device = device().with_faults(Faults {
            reject_setting: Some("squelch".into()),
            ..Faults::default()
        });
        let mut image = device.image();
        image
            .settings
            .write("squelch", rad_model::SettingValue::Integer(42))
            .unwrap();

        let mut link = device
            .connector()
            .open("sim:test", &LinkParams::default())
            .unwrap();
        let mut request = vec![CMD_WRITE];
        request.extend(serde_json::to_vec(&image).unwrap());
        let reply = exchange(&mut *link, &request).unwrap();

        assert_eq!(reply[0], NAK);
        assert!(String::from_utf8_lossy(&reply[1..]).contains("squelch"));
        assert_ne!(device.image(), image);
    }

    #[test]
    fn close_is_counted_once() {
        let device = device();
        let mut link = device
            .connector()
            .open("sim:test", &LinkParams::default())
            .unwrap();
        assert!(device.is_open());

        link.close().unwrap();
        link.close().unwrap();

        assert!(!device.is_open());
        assert_eq!(device.counters().closes, 1);
        assert!(link.write_all(b"R").is_err());
    }

    #[test]
    fn open_fault() {
        let device = device().with_faults(Faults {
            fail_open: true,
            ..Faults::default()
        });
        let err = device
            .connector()
            .open("sim:test", &LinkParams::default())
            .err()
            .unwrap();
        assert!(matches!(err, SessionError::TransportOpen { .. }));
        assert_eq!(device.counters().opens, 0);
    }
}
