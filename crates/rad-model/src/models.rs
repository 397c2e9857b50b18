//! Radio model registry
//!
//! This module holds the per-model constants needed to drive a radio:
//! memory range, reset delay, power levels and serial link parameters.
//! Models are plain table rows; adding a model is a data change.

use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;
use crate::memory::{PowerLevel, PowerLevelStatic};
use crate::program::MemoryRange;

/// Serial link parameters a model's clone cable needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkParams {
    pub baud_rate: u32,
    /// RTS/CTS hardware flow control
    pub hardware_flow: bool,
    /// Level to drive RTS to after opening
    pub rts: bool,
    /// Level to drive DTR to after opening
    pub dtr: bool,
    /// Per-read timeout
    pub timeout: Duration,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            hardware_flow: false,
            rts: true,
            dtr: true,
            timeout: Duration::from_millis(250),
        }
    }
}

/// Information about a specific radio model (static version)
#[derive(Debug, Clone, Copy)]
pub struct ModelSpecStatic {
    /// Identifier used in profiles and on the command line
    pub id: &'static str,
    pub manufacturer: &'static str,
    pub model: &'static str,
    /// Seconds the radio needs to reboot after a clone read
    pub reset_delay_secs: u64,
    pub memory_bounds: (u32, u32),
    /// Valid power levels; the first one is the default
    pub power_levels: &'static [PowerLevelStatic],
    pub baud_rate: u32,
    pub hardware_flow: bool,
    pub wants_rts: bool,
    pub wants_dtr: bool,
}

/// Everything needed to drive one radio model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAdapter {
    id: String,
    manufacturer: String,
    model: String,
    reset_delay: Duration,
    memory_range: MemoryRange,
    power_levels: Vec<PowerLevel>,
    link: LinkParams,
}

impl ModelAdapter {
    /// Create an adapter, validating the memory range and power levels
    pub fn new(
        id: impl Into<String>,
        display_name: (&str, &str),
        memory_range: MemoryRange,
        power_levels: Vec<PowerLevel>,
        reset_delay: Duration,
        link: LinkParams,
    ) -> Result<Self, ConfigError> {
        let id = id.into();
        let invalid = |reason: &str| ConfigError::InvalidModelSpec {
            model: id.clone(),
            reason: reason.to_string(),
        };

        if memory_range.is_empty() {
            return Err(invalid("memory range is empty"));
        }
        if memory_range.lower > 1 {
            return Err(invalid("memory range must include slot 1"));
        }
        if power_levels.is_empty() {
            return Err(invalid("at least one power level is required"));
        }

        Ok(Self {
            manufacturer: display_name.0.to_string(),
            model: display_name.1.to_string(),
            id,
            reset_delay,
            memory_range,
            power_levels,
            link,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// "Manufacturer Model"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.manufacturer, self.model)
    }

    /// Time the radio is unresponsive after a clone read
    pub fn reset_delay(&self) -> Duration {
        self.reset_delay
    }

    /// Inclusive addressable memory range
    pub fn memory_range(&self) -> MemoryRange {
        self.memory_range
    }

    /// Number of memories that can be programmed
    pub fn capacity(&self) -> usize {
        self.memory_range.capacity()
    }

    pub fn power_levels(&self) -> &[PowerLevel] {
        &self.power_levels
    }

    /// Power level given to memories that do not choose one
    pub fn default_power_level(&self) -> &PowerLevel {
        // Non-empty by construction
        &self.power_levels[0]
    }

    /// Find a power level by label, ignoring case
    pub fn power_level(&self, label: &str) -> Option<&PowerLevel> {
        self.power_levels
            .iter()
            .find(|p| p.label.eq_ignore_ascii_case(label))
    }

    pub fn link(&self) -> &LinkParams {
        &self.link
    }

    /// Same model with a different reset delay
    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }
}

impl From<&ModelSpecStatic> for ModelAdapter {
    fn from(s: &ModelSpecStatic) -> Self {
        Self {
            id: s.id.to_string(),
            manufacturer: s.manufacturer.to_string(),
            model: s.model.to_string(),
            reset_delay: Duration::from_secs(s.reset_delay_secs),
            memory_range: MemoryRange::new(s.memory_bounds.0, s.memory_bounds.1),
            power_levels: s.power_levels.iter().map(PowerLevel::from).collect(),
            link: LinkParams {
                baud_rate: s.baud_rate,
                hardware_flow: s.hardware_flow,
                rts: s.wants_rts,
                dtr: s.wants_dtr,
                ..LinkParams::default()
            },
        }
    }
}

/// Lookup table from model id to adapter
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelAdapter>,
}

impl ModelRegistry {
    /// Registry of every built-in model
    pub fn builtin() -> Self {
        Self {
            models: BUILTIN_MODELS.iter().map(ModelAdapter::from).collect(),
        }
    }

    /// Registry from explicit adapters; ids must be unique
    pub fn from_adapters(models: Vec<ModelAdapter>) -> Result<Self, ConfigError> {
        for (i, model) in models.iter().enumerate() {
            if models[..i].iter().any(|m| m.id == model.id) {
                return Err(ConfigError::InvalidModelSpec {
                    model: model.id.clone(),
                    reason: "registered more than once".to_string(),
                });
            }
        }
        Ok(Self { models })
    }

    /// Replace a model's reset delay while the registry is being built
    pub fn with_reset_delay(mut self, id: &str, delay: Duration) -> Result<Self, ConfigError> {
        let known = self.ids().map(str::to_string).collect();
        let model = self
            .models
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| ConfigError::UnknownModel {
                model: id.to_string(),
                known,
            })?;
        debug!("Reset delay for {} set to {:?}", id, delay);
        model.reset_delay = delay;
        Ok(self)
    }

    /// Look up a model by id
    pub fn resolve(&self, id: &str) -> Result<&ModelAdapter, ConfigError> {
        self.models
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| ConfigError::UnknownModel {
                model: id.to_string(),
                known: self.ids().map(str::to_string).collect(),
            })
    }

    /// Registered ids, in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelAdapter> {
        self.models.iter()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

static POWER_UV5R: &[PowerLevelStatic] = &[
    PowerLevelStatic {
        label: "High",
        milliwatts: 4000,
    },
    PowerLevelStatic {
        label: "Low",
        milliwatts: 1000,
    },
];

static POWER_UV25: &[PowerLevelStatic] = &[
    PowerLevelStatic {
        label: "High",
        milliwatts: 5000,
    },
    PowerLevelStatic {
        label: "Low",
        milliwatts: 1000,
    },
];

static POWER_RT470X: &[PowerLevelStatic] = &[
    PowerLevelStatic {
        label: "High",
        milliwatts: 5000,
    },
    PowerLevelStatic {
        label: "Medium",
        milliwatts: 2000,
    },
    PowerLevelStatic {
        label: "Low",
        milliwatts: 500,
    },
];

static POWER_RT470: &[PowerLevelStatic] = &[
    PowerLevelStatic {
        label: "High",
        milliwatts: 5000,
    },
    PowerLevelStatic {
        label: "Low",
        milliwatts: 500,
    },
];

// UV-6R, UV-9R and UV-82 share the UV-5R clone format but have not been
// verified against hardware, so they stay out of the table.
static BUILTIN_MODELS: &[ModelSpecStatic] = &[
    ModelSpecStatic {
        id: "uv5r",
        manufacturer: "Baofeng",
        model: "UV-5R",
        reset_delay_secs: 6,
        memory_bounds: (0, 127),
        power_levels: POWER_UV5R,
        baud_rate: 9600,
        hardware_flow: false,
        wants_rts: true,
        wants_dtr: true,
    },
    ModelSpecStatic {
        id: "uv25",
        manufacturer: "Baofeng",
        model: "UV-25",
        reset_delay_secs: 4,
        memory_bounds: (1, 999),
        power_levels: POWER_UV25,
        baud_rate: 115_200,
        hardware_flow: false,
        wants_rts: true,
        wants_dtr: true,
    },
    ModelSpecStatic {
        id: "rt470x",
        manufacturer: "Radtel",
        model: "RT-470X",
        reset_delay_secs: 3,
        memory_bounds: (1, 256),
        power_levels: POWER_RT470X,
        baud_rate: 57_600,
        hardware_flow: false,
        wants_rts: true,
        wants_dtr: true,
    },
    ModelSpecStatic {
        id: "rt470",
        manufacturer: "Radtel",
        model: "RT-470",
        reset_delay_secs: 3,
        memory_bounds: (1, 256),
        power_levels: POWER_RT470,
        baud_rate: 57_600,
        hardware_flow: false,
        wants_rts: true,
        wants_dtr: true,
    },
];
