//! Channel memory representation
//!
//! [`MemoryRecord`] is the model-agnostic description of one channel.
//! [`ChannelMemory`] is the wire-level slot form a driver reads from and
//! writes to a memory bank. [`MemoryEntry`] is the shape memory list files
//! take on disk, with the documented defaults for optional keys.

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::dcs::{DcsPolarity, DEFAULT_DCS_CODE};
use crate::error::ConfigError;

/// A transmitter power setting offered by a model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PowerLevel {
    /// Label shown by the radio (e.g. "High")
    pub label: String,
    /// Output power in milliwatts
    pub milliwatts: u32,
}

impl PowerLevel {
    /// Create a new power level
    pub fn new(label: impl Into<String>, milliwatts: u32) -> Self {
        Self {
            label: label.into(),
            milliwatts,
        }
    }

    /// Output power in watts
    pub fn watts(&self) -> f64 {
        self.milliwatts as f64 / 1000.0
    }
}

impl std::fmt::Display for PowerLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.milliwatts % 1000 == 0 {
            write!(f, "{} ({}W)", self.label, self.milliwatts / 1000)
        } else {
            write!(f, "{} ({:.1}W)", self.label, self.watts())
        }
    }
}

/// Power level entry in the static model table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerLevelStatic {
    pub label: &'static str,
    pub milliwatts: u32,
}

impl From<&PowerLevelStatic> for PowerLevel {
    fn from(s: &PowerLevelStatic) -> Self {
        Self::new(s.label, s.milliwatts)
    }
}

/// Squelch tone mode of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToneMode {
    /// Carrier squelch only
    #[default]
    #[serde(rename = "")]
    None,
    /// Digital-coded squelch
    #[serde(rename = "DTCS", alias = "DCS")]
    Dcs,
}

impl ToneMode {
    /// Form used in memory files ("" or "DTCS")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Dcs => "DTCS",
        }
    }
}

/// Modulation of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelMode {
    /// Wide FM (25 kHz)
    Fm,
    /// Narrow FM (12.5 kHz)
    #[default]
    Nfm,
    /// Broadcast FM (receive only on most handhelds)
    Wfm,
    /// Amplitude modulation
    Am,
    /// Narrow AM
    Nam,
}

impl ChannelMode {
    /// Name used in memory files and CSV exports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fm => "FM",
            Self::Nfm => "NFM",
            Self::Wfm => "WFM",
            Self::Am => "AM",
            Self::Nam => "NAM",
        }
    }
}

impl std::fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repeater shift direction of a wire-level memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Duplex {
    /// Simplex
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
    /// Independent transmit frequency in `offset`
    #[serde(rename = "split")]
    Split,
    /// Transmit inhibited
    #[serde(rename = "off")]
    Off,
}

/// Model-agnostic description of one channel memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// 1-based slot, assigned when the record is programmed
    pub number: u32,
    /// Display name
    pub name: String,
    /// Frequency in Hz
    pub frequency: u64,
    /// One of the target model's power levels
    pub power_level: PowerLevel,
    pub tone_mode: ToneMode,
    pub rx_dcs_code: u16,
    pub tx_dcs_code: u16,
    pub dcs_polarity: DcsPolarity,
    pub operating_mode: ChannelMode,
    /// Tuning step in kHz
    pub tuning_step: f64,
}

impl MemoryRecord {
    /// Create a record with default squelch and mode settings
    pub fn new(name: impl Into<String>, frequency: u64, power_level: PowerLevel) -> Self {
        Self {
            number: 0,
            name: name.into(),
            frequency,
            power_level,
            tone_mode: ToneMode::None,
            rx_dcs_code: DEFAULT_DCS_CODE,
            tx_dcs_code: DEFAULT_DCS_CODE,
            dcs_polarity: DcsPolarity::NN,
            operating_mode: ChannelMode::Nfm,
            tuning_step: DEFAULT_TUNING_STEP_KHZ,
        }
    }

    /// Translate to the wire-level slot form
    ///
    /// Repeater fields are always reset: duplex empty, offset 0.
    pub fn to_channel_memory(&self) -> ChannelMemory {
        ChannelMemory {
            number: self.number,
            empty: false,
            name: self.name.clone(),
            frequency: self.frequency,
            power: Some(self.power_level.clone()),
            tone_mode: self.tone_mode,
            rx_dcs: self.rx_dcs_code,
            tx_dcs: self.tx_dcs_code,
            dcs_polarity: self.dcs_polarity,
            mode: self.operating_mode,
            tuning_step: self.tuning_step,
            duplex: Duplex::None,
            offset: 0,
        }
    }
}

impl std::fmt::Display for MemoryRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Mem#{} {} Freq:{} Power:{} RDCS:{} TDCS:{} DCS Polarity:{}",
            self.number,
            self.name,
            self.frequency,
            self.power_level,
            self.rx_dcs_code,
            self.tx_dcs_code,
            self.dcs_polarity
        )
    }
}

impl From<MemoryRecord> for ChannelMemory {
    fn from(record: MemoryRecord) -> Self {
        record.to_channel_memory()
    }
}

impl TryFrom<&ChannelMemory> for MemoryRecord {
    type Error = ConfigError;

    fn try_from(mem: &ChannelMemory) -> Result<Self, Self::Error> {
        if mem.empty {
            return Err(ConfigError::InvalidRecord(format!(
                "slot {} is empty",
                mem.number
            )));
        }
        let power_level = mem.power.clone().ok_or_else(|| {
            ConfigError::InvalidRecord(format!("slot {} has no power level", mem.number))
        })?;

        Ok(Self {
            number: mem.number,
            name: mem.name.clone(),
            frequency: mem.frequency,
            power_level,
            tone_mode: mem.tone_mode,
            rx_dcs_code: mem.rx_dcs,
            tx_dcs_code: mem.tx_dcs,
            dcs_polarity: mem.dcs_polarity,
            operating_mode: mem.mode,
            tuning_step: mem.tuning_step,
        })
    }
}

/// Wire-level memory slot as exchanged with a driver's memory bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMemory {
    pub number: u32,
    pub empty: bool,
    pub name: String,
    /// Frequency in Hz
    pub frequency: u64,
    pub power: Option<PowerLevel>,
    pub tone_mode: ToneMode,
    pub rx_dcs: u16,
    pub tx_dcs: u16,
    pub dcs_polarity: DcsPolarity,
    pub mode: ChannelMode,
    /// Tuning step in kHz
    pub tuning_step: f64,
    pub duplex: Duplex,
    /// Repeater offset (or split transmit frequency) in Hz
    pub offset: u64,
}

impl ChannelMemory {
    /// An unused slot
    pub fn empty(number: u32) -> Self {
        Self {
            number,
            empty: true,
            name: String::new(),
            frequency: 0,
            power: None,
            tone_mode: ToneMode::None,
            rx_dcs: DEFAULT_DCS_CODE,
            tx_dcs: DEFAULT_DCS_CODE,
            dcs_polarity: DcsPolarity::NN,
            mode: ChannelMode::Fm,
            tuning_step: DEFAULT_TUNING_STEP_KHZ,
            duplex: Duplex::None,
            offset: 0,
        }
    }
}

/// Tuning step used when a memory file does not name one
pub const DEFAULT_TUNING_STEP_KHZ: f64 = 5.0;

fn default_dcs_code() -> u16 {
    DEFAULT_DCS_CODE
}

fn default_tuning_step() -> f64 {
    DEFAULT_TUNING_STEP_KHZ
}

/// Accepts DCS codes written either as numbers (`23`) or as zero-padded
/// strings (`"023"`); both name the same code.
fn deserialize_dcs_code<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(u16),
        Text(String),
    }

    match Code::deserialize(deserializer)? {
        Code::Number(n) => Ok(n),
        Code::Text(s) => s
            .trim()
            .parse::<u16>()
            .map_err(|_| de::Error::custom(format!("invalid DCS code '{}'", s))),
    }
}

/// One entry of a memory list file
///
/// Only `name` and `frequency` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Ignored when programming; slots are assigned in list order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    pub name: String,
    /// Frequency in Hz
    pub frequency: u64,
    #[serde(default)]
    pub tone: ToneMode,
    #[serde(
        default = "default_dcs_code",
        deserialize_with = "deserialize_dcs_code"
    )]
    pub rdcs_code: u16,
    #[serde(
        default = "default_dcs_code",
        deserialize_with = "deserialize_dcs_code"
    )]
    pub tdcs_code: u16,
    #[serde(default)]
    pub dcs_polarity: DcsPolarity,
    #[serde(default)]
    pub mode: ChannelMode,
    /// Tuning step in kHz
    #[serde(default = "default_tuning_step")]
    pub tuning_step: f64,
}

impl MemoryEntry {
    /// Build a record for a model, using `power` as its power level
    pub fn into_record(self, power: &PowerLevel) -> MemoryRecord {
        MemoryRecord {
            number: self.number.unwrap_or(0),
            name: self.name,
            frequency: self.frequency,
            power_level: power.clone(),
            tone_mode: self.tone,
            rx_dcs_code: self.rdcs_code,
            tx_dcs_code: self.tdcs_code,
            dcs_polarity: self.dcs_polarity,
            operating_mode: self.mode,
            tuning_step: self.tuning_step,
        }
    }
}

/// Parse a memory list document (a JSON array of entries)
pub fn parse_memory_list(json: &str) -> Result<Vec<MemoryEntry>, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::InvalidRecord(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn high() -> PowerLevel {
        PowerLevel::new("High", 4000)
    }

    #[test]
    fn entry_defaults_fill_missing_fields() {
        let entries = parse_memory_list(r#"[{"name":"Ch1","frequency":446000000}]"#).unwrap();
        let record = entries[0].clone().into_record(&high());

        assert_eq!(record.name, "Ch1");
        assert_eq!(record.frequency, 446_000_000);
        assert_eq!(record.tone_mode, ToneMode::None);
        assert_eq!(record.rx_dcs_code, 23);
        assert_eq!(record.tx_dcs_code, 23);
        assert_eq!(record.dcs_polarity, DcsPolarity::NN);
        assert_eq!(record.operating_mode, ChannelMode::Nfm);
        assert_eq!(record.tuning_step, 5.0);
        assert_eq!(record.power_level, high());
    }

    #[test]
    fn entry_accepts_padded_dcs_strings() {
        let entries = parse_memory_list(
            r#"[{"name":"A","frequency":446006250,"tone":"DTCS","rdcs_code":"023","tdcs_code":754,"dcs_polarity":"RR","mode":"FM","tuning_step":6.25}]"#,
        )
        .unwrap();
        let entry = &entries[0];

        assert_eq!(entry.tone, ToneMode::Dcs);
        assert_eq!(entry.rdcs_code, 23);
        assert_eq!(entry.tdcs_code, 754);
        assert_eq!(entry.dcs_polarity, DcsPolarity::RR);
        assert_eq!(entry.mode, ChannelMode::Fm);
        assert_eq!(entry.tuning_step, 6.25);
    }

    #[test]
    fn entry_requires_name_and_frequency() {
        assert!(parse_memory_list(r#"[{"name":"A"}]"#).is_err());
        assert!(parse_memory_list(r#"[{"frequency":446000000}]"#).is_err());
    }

    #[test]
    fn bad_dcs_string_is_rejected() {
        let err = parse_memory_list(r#"[{"name":"A","frequency":1,"rdcs_code":"abc"}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("invalid DCS code"));
    }

    #[test]
    fn channel_memory_resets_repeater_fields() {
        let mut record = MemoryRecord::new("Rpt", 145_600_000, high());
        record.number = 4;
        let mem = record.to_channel_memory();

        assert!(!mem.empty);
        assert_eq!(mem.number, 4);
        assert_eq!(mem.duplex, Duplex::None);
        assert_eq!(mem.offset, 0);
    }

    #[test]
    fn record_from_device_memory_drops_repeater_fields() {
        let mut mem = MemoryRecord::new("Rpt", 145_600_000, high()).to_channel_memory();
        mem.duplex = Duplex::Minus;
        mem.offset = 600_000;
        mem.tone_mode = ToneMode::Dcs;
        mem.rx_dcs = 125;
        mem.tx_dcs = 131;
        mem.dcs_polarity = DcsPolarity::NR;

        let record = MemoryRecord::try_from(&mem).unwrap();
        let back = record.to_channel_memory();

        assert_eq!(back.frequency, mem.frequency);
        assert_eq!(back.power, mem.power);
        assert_eq!(back.rx_dcs, 125);
        assert_eq!(back.tx_dcs, 131);
        assert_eq!(back.dcs_polarity, DcsPolarity::NR);
        assert_eq!(back.mode, mem.mode);
        assert_eq!(back.tuning_step, mem.tuning_step);
        assert_eq!(back.duplex, Duplex::None);
        assert_eq!(back.offset, 0);
    }

    #[test]
    fn empty_slot_is_not_a_record() {
        assert!(MemoryRecord::try_from(&ChannelMemory::empty(3)).is_err());
    }

    #[test]
    fn display_matches_log_format() {
        let mut record = MemoryRecord::new("Ch1", 446_000_000, high());
        record.number = 1;
        assert_eq!(
            record.to_string(),
            "Mem#1 Ch1 Freq:446000000 Power:High (4W) RDCS:23 TDCS:23 DCS Polarity:NN"
        );
    }

    #[test]
    fn fractional_power_display() {
        assert_eq!(PowerLevel::new("Low", 500).to_string(), "Low (0.5W)");
    }
}
