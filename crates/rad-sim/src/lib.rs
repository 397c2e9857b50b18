//! Virtual Radio Library
//!
//! Stands in for a handheld transceiver so configuration sessions can run
//! without hardware:
//!
//! - **RadioImage**: a radio's settings tree and memory bank, persisted as JSON
//! - **VirtualDevice**: the radio itself, with fault injection and counters
//! - **VirtualRadio**: the clone driver that talks to it
//! - **VirtualCatalog**: a driver catalog that routes sessions to one device
//!
//! # Example
//!
//! ```rust
//! use rad_model::ModelRegistry;
//! use rad_session::{RadioSession, SessionPlan};
//! use rad_sim::{VirtualCatalog, VirtualDevice};
//!
//! let registry = ModelRegistry::builtin();
//! let device = VirtualDevice::factory(registry.resolve("uv5r").unwrap());
//! let catalog = VirtualCatalog::new(device.clone());
//!
//! let session = RadioSession::new(&registry, "uv5r", "sim:uv5r", &catalog).unwrap();
//! let report = session.execute(SessionPlan::inspect()).unwrap();
//!
//! assert!(!report.flushed);
//! assert_eq!(device.counters().closes, 1);
//! ```

pub mod device;
pub mod error;
pub mod image;
pub mod radio;

pub use device::{Counters, Faults, VirtualConnector, VirtualDevice, VirtualLink};
pub use error::SimError;
pub use image::RadioImage;
pub use radio::{VirtualCatalog, VirtualRadio};
