//! CHIRP CSV export
//!
//! Converts a memory list into the column layout CHIRP imports. Keys that
//! a memory list does not use for programming (duplex, offset, CTCSS tones,
//! comments, D-STAR calls) are passed through when present.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rad_model::dcs::format_code;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

/// Column names, in CHIRP's order
pub const CHIRP_HEADER: [&str; 21] = [
    "Location",
    "Name",
    "Frequency",
    "Duplex",
    "Offset",
    "Tone",
    "rToneFreq",
    "cToneFreq",
    "DtcsCode",
    "DtcsPolarity",
    "RxDtcsCode",
    "CrossMode",
    "Mode",
    "TStep",
    "Skip",
    "Power",
    "Comment",
    "URCALL",
    "RPT1CALL",
    "RPT2CALL",
    "DVCODE",
];

/// One CHIRP CSV row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChirpRow {
    pub location: usize,
    pub name: String,
    /// MHz
    pub frequency: String,
    pub duplex: String,
    /// MHz
    pub offset: String,
    pub tone: String,
    pub r_tone_freq: String,
    pub c_tone_freq: String,
    pub dtcs_code: String,
    pub dtcs_polarity: String,
    pub rx_dtcs_code: String,
    pub cross_mode: String,
    pub mode: String,
    pub tstep: String,
    pub skip: String,
    pub power: String,
    pub comment: String,
    pub urcall: String,
    pub rpt1call: String,
    pub rpt2call: String,
    pub dvcode: String,
}

impl ChirpRow {
    /// Row for the memory at `location` (1-based)
    pub fn from_memory(location: usize, memory: &Map<String, Value>) -> Result<Self> {
        let text = |key: &str, default: &str| match memory.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => default.to_string(),
            Some(other) => other.to_string(),
        };
        let hz_as_mhz = |key: &str, default: f64| -> Result<String> {
            match memory.get(key) {
                None | Some(Value::Null) => Ok(decimal(default / 1e6)),
                Some(v) => match v.as_f64() {
                    Some(hz) => Ok(decimal(hz / 1e6)),
                    None => bail!("memory {}: '{}' must be a number of Hz", location, key),
                },
            }
        };
        let dcs = |key: &str| match memory.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|c| u16::try_from(c).ok())
                .map(format_code)
                .unwrap_or_else(|| n.to_string()),
            Some(Value::String(s)) => s.clone(),
            _ => "023".to_string(),
        };

        Ok(Self {
            location,
            name: text("name", ""),
            frequency: hz_as_mhz("frequency", 446_000_000.0)?,
            duplex: text("duplex", ""),
            offset: hz_as_mhz("offset", 5_000_000.0)?,
            tone: text("tone", ""),
            r_tone_freq: text("rToneFreq", "88.5"),
            c_tone_freq: text("cToneFreq", "88.5"),
            dtcs_code: dcs("tdcs_code"),
            dtcs_polarity: text("dcs_polarity", "NN"),
            rx_dtcs_code: dcs("rdcs_code"),
            cross_mode: text("cross_mode", "Tone->Tone"),
            mode: text("mode", "NFM"),
            tstep: text("tstep", "5.0"),
            skip: text("skip", ""),
            power: text("power", "50W"),
            comment: text("comment", ""),
            urcall: text("urcall", ""),
            rpt1call: text("rpt1call", ""),
            rpt2call: text("rpt2call", ""),
            dvcode: text("dvcode", ""),
        })
    }
}

/// Render like a float, keeping one decimal for whole numbers ("446.0")
fn decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Rows for every memory of a memory list document
pub fn to_chirp_rows(document: &Value) -> Result<Vec<ChirpRow>> {
    let Some(memories) = document.as_array() else {
        bail!("memory list must be a JSON array");
    };

    memories
        .iter()
        .enumerate()
        .map(|(i, memory)| match memory.as_object() {
            Some(fields) => ChirpRow::from_memory(i + 1, fields),
            None => bail!("memory {} is not a JSON object", i + 1),
        })
        .collect()
}

/// Write rows with the CHIRP header
pub fn write_csv<W: Write>(rows: &[ChirpRow], out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(CHIRP_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// `export-csv` command
pub fn export_csv(input: &Path, output: &Path) -> Result<()> {
    let data = fs::read_to_string(input)
        .with_context(|| format!("Failed to read memory file {}", input.display()))?;
    let document: Value = serde_json::from_str(&data)
        .with_context(|| format!("Invalid JSON in {}", input.display()))?;
    let rows = to_chirp_rows(&document)?;

    let file = fs::File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    write_csv(&rows, file)?;

    info!("Wrote {} memories to {}", rows.len(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_fill_missing_columns() {
        let rows = to_chirp_rows(&json!([{"name": "Ch1", "frequency": 446006250}])).unwrap();
        let row = &rows[0];

        assert_eq!(row.location, 1);
        assert_eq!(row.frequency, "446.00625");
        assert_eq!(row.offset, "5.0");
        assert_eq!(row.r_tone_freq, "88.5");
        assert_eq!(row.dtcs_code, "023");
        assert_eq!(row.rx_dtcs_code, "023");
        assert_eq!(row.dtcs_polarity, "NN");
        assert_eq!(row.cross_mode, "Tone->Tone");
        assert_eq!(row.mode, "NFM");
        assert_eq!(row.tstep, "5.0");
        assert_eq!(row.power, "50W");
    }

    #[test]
    fn dcs_fields_are_padded() {
        let rows = to_chirp_rows(&json!([
            {"name": "A", "frequency": 462562500, "tone": "DTCS",
             "tdcs_code": 47, "rdcs_code": "754", "dcs_polarity": "RR"}
        ]))
        .unwrap();

        assert_eq!(rows[0].tone, "DTCS");
        assert_eq!(rows[0].dtcs_code, "047");
        assert_eq!(rows[0].rx_dtcs_code, "754");
        assert_eq!(rows[0].dtcs_polarity, "RR");
    }

    #[test]
    fn csv_layout() {
        let rows = to_chirp_rows(&json!([
            {"name": "One", "frequency": 145500000},
            {"name": "Two", "frequency": 446000000}
        ]))
        .unwrap();
        let mut out = Vec::new();
        write_csv(&rows, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CHIRP_HEADER.join(","));
        assert!(lines[1].starts_with("1,One,145.5,,5.0,,88.5,88.5,023,NN,023,Tone->Tone,NFM,5.0,,50W"));
        assert!(lines[2].starts_with("2,Two,446.0,"));
    }

    #[test]
    fn rejects_non_list() {
        assert!(to_chirp_rows(&json!({"name": "x"})).is_err());
        assert!(to_chirp_rows(&json!([1, 2])).is_err());
        assert!(to_chirp_rows(&json!([{"frequency": "fast"}])).is_err());
    }

    #[test]
    fn empty_list_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.csv");
        fs::write(&input, "[]").unwrap();

        export_csv(&input, &output).unwrap();
        let text = fs::read_to_string(&output).unwrap();
        assert_eq!(text.trim_end(), CHIRP_HEADER.join(","));
    }
}
