//! Serial transport
//!
//! A [`Connector`] opens a [`Link`] to a radio using the model's
//! [`LinkParams`]. The session owns the link through a [`LinkGuard`], which
//! closes it exactly once, whether the session finishes, fails, or unwinds.

use std::io::{self, Read, Write};

use rad_model::LinkParams;
use serialport::{FlowControl, SerialPort};
use tracing::{debug, warn};

use crate::error::SessionError;

/// An open byte stream to a radio
pub trait Link: Read + Write {
    /// Port this link was opened on
    fn port_name(&self) -> &str;

    /// Release the underlying device
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Opens links to radios
pub trait Connector {
    fn open(&self, port: &str, params: &LinkParams) -> Result<Box<dyn Link>, SessionError>;
}

/// Connector for physical serial ports
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    fn open(&self, port: &str, params: &LinkParams) -> Result<Box<dyn Link>, SessionError> {
        let open_error = |e: serialport::Error| SessionError::TransportOpen {
            port: port.to_string(),
            reason: e.to_string(),
        };

        let flow = if params.hardware_flow {
            FlowControl::Hardware
        } else {
            FlowControl::None
        };

        debug!(
            "Opening {} at {} baud (flow {:?}, RTS {}, DTR {})",
            port, params.baud_rate, flow, params.rts, params.dtr
        );

        let mut serial = serialport::new(port, params.baud_rate)
            .flow_control(flow)
            .timeout(params.timeout)
            .open()
            .map_err(open_error)?;

        serial
            .write_request_to_send(params.rts)
            .map_err(open_error)?;
        serial
            .write_data_terminal_ready(params.dtr)
            .map_err(open_error)?;

        Ok(Box::new(SerialLink {
            name: port.to_string(),
            port: serial,
        }))
    }
}

/// Link over a physical serial port
pub struct SerialLink {
    name: String,
    port: Box<dyn SerialPort>,
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Link for SerialLink {
    fn port_name(&self) -> &str {
        &self.name
    }
}

/// Owns an open link and closes it exactly once
pub struct LinkGuard {
    link: Box<dyn Link>,
    closed: bool,
}

impl LinkGuard {
    pub fn new(link: Box<dyn Link>) -> Self {
        Self {
            link,
            closed: false,
        }
    }

    pub fn link(&mut self) -> &mut dyn Link {
        &mut *self.link
    }

    pub fn port_name(&self) -> &str {
        self.link.port_name()
    }

    /// Close now and report the result
    pub fn close(mut self) -> io::Result<()> {
        self.closed = true;
        self.link.close()
    }
}

impl Drop for LinkGuard {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.link.close() {
                warn!("Error closing {}: {}", self.link.port_name(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingLink {
        closes: Rc<Cell<u32>>,
    }

    impl Read for CountingLink {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for CountingLink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Link for CountingLink {
        fn port_name(&self) -> &str {
            "/dev/null"
        }

        fn close(&mut self) -> io::Result<()> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn explicit_close_happens_once() {
        let closes = Rc::new(Cell::new(0));
        let guard = LinkGuard::new(Box::new(CountingLink {
            closes: closes.clone(),
        }));

        guard.close().unwrap();
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn dropping_closes() {
        let closes = Rc::new(Cell::new(0));
        {
            let mut guard = LinkGuard::new(Box::new(CountingLink {
                closes: closes.clone(),
            }));
            assert_eq!(guard.port_name(), "/dev/null");
            guard.link().write_all(b"x").unwrap();
        }
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn unwinding_closes() {
        let closes = Rc::new(Cell::new(0));
        let inner = closes.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = LinkGuard::new(Box::new(CountingLink { closes: inner }));
            panic!("interrupted during reset wait");
        }));

        assert!(result.is_err());
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn missing_port_is_open_error() {
        let err = SerialConnector
            .open("/dev/does-not-exist-radijator", &LinkParams::default())
            .err()
            .unwrap();
        assert!(matches!(err, SessionError::TransportOpen { .. }));
    }
}
