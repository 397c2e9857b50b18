//! Radio Configuration Model Library
//!
//! This crate describes desired handheld transceiver state independently of
//! any particular radio model, and reconciles it with a model's own layout:
//!
//! - **Memory records**: channel memories with DCS squelch, mode and step
//! - **Profile transposition**: multi-model settings profiles flattened to
//!   one model's internal setting names
//! - **Settings reconciliation**: apply only the profiled settings to a
//!   live settings tree
//! - **Memory programming**: clear a memory bank, then write records into
//!   consecutive slots from 1
//! - **Model registry**: memory range, reset delay, power levels and link
//!   parameters per model
//!
//! Device I/O is not part of this crate; drivers supply the settings tree
//! and memory bank after reading a radio's image.
//!
//! # Example
//!
//! ```rust
//! use rad_model::{profile, reconcile, ModelRegistry, SettingsGroup, SettingsTree};
//! use serde_json::json;
//!
//! let registry = ModelRegistry::builtin();
//! let uv5r = registry.resolve("uv5r").unwrap();
//!
//! let doc = json!({"Squelch": {"uv5r": {"name": "squelch", "value": 5}}});
//! let profile = profile::transpose(&doc, uv5r.id()).unwrap();
//!
//! let mut live = SettingsGroup::new("top", "").with_leaf("squelch", "Squelch", 3);
//! reconcile::apply(&mut live, &profile, false).unwrap();
//! assert_eq!(live.read("squelch").unwrap().to_string(), "5");
//! ```

pub mod dcs;
pub mod error;
pub mod memory;
pub mod models;
pub mod profile;
pub mod program;
pub mod reconcile;
pub mod settings;

pub use dcs::{DcsPolarity, DCS_CODES, DEFAULT_DCS_CODE};
pub use error::{BankError, ConfigError, SettingsError};
pub use memory::{
    parse_memory_list, ChannelMemory, ChannelMode, Duplex, MemoryEntry, MemoryRecord, PowerLevel,
    ToneMode,
};
pub use models::{LinkParams, ModelAdapter, ModelRegistry};
pub use profile::{transpose, ProfileEntry, TransposedProfile};
pub use program::{program, MemoryBank, MemoryRange};
pub use reconcile::{apply, AppliedSetting};
pub use settings::{Setting, SettingNode, SettingValue, SettingsGroup, SettingsTree};
