//! Radio Configuration Sessions
//!
//! Runs read-modify-write passes against a handheld transceiver:
//!
//! 1. open the serial link with the model's parameters
//! 2. download the radio's image and wait out its reset
//! 3. reconcile settings and program memories on the local copy
//! 4. upload the image
//! 5. close the link, on success and failure alike
//!
//! Clone protocols are supplied by a [`RadioDriver`] chosen through a
//! [`DriverCatalog`].
//!
//! # Example
//!
//! ```rust,no_run
//! use rad_model::ModelRegistry;
//! use rad_session::{RadioSession, SerialDriverCatalog, SessionPlan};
//!
//! let registry = ModelRegistry::builtin();
//! let catalog = SerialDriverCatalog::new();
//! let session = RadioSession::new(&registry, "uv5r", "/dev/ttyUSB0", &catalog)?;
//! let report = session.execute(SessionPlan::inspect())?;
//! println!("{} settings read", report.settings.leaves().len());
//! # Ok::<(), rad_session::SessionError>(())
//! ```

pub mod driver;
pub mod error;
pub mod session;
pub mod transport;

pub use driver::{Backend, DriverCatalog, DriverError, DriverFactory, RadioDriver, SerialDriverCatalog};
pub use error::{FailureKind, SessionError};
pub use session::{RadioSession, SessionPlan, SessionReport, SessionState};
pub use transport::{Connector, Link, LinkGuard, SerialConnector, SerialLink};
