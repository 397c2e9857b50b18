//! Random DCS assignment
//!
//! Gives every memory of a list one random standard DCS code, used for both
//! receive and transmit, and a random polarity of NN or RR. Other keys are
//! kept as they are.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rad_model::{DcsPolarity, ToneMode, DCS_CODES, DEFAULT_DCS_CODE};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

/// Polarities handed out; mixed polarities are left to manual edits
pub const ASSIGNED_POLARITIES: [DcsPolarity; 2] = [DcsPolarity::NN, DcsPolarity::RR];

/// Assign codes in place, returning how many memories were changed
pub fn assign<R: Rng + ?Sized>(document: &mut Value, rng: &mut R) -> Result<usize> {
    let Some(memories) = document.as_array_mut() else {
        bail!("memory list must be a JSON array");
    };

    for (i, memory) in memories.iter_mut().enumerate() {
        let Some(fields) = memory.as_object_mut() else {
            bail!("memory {} is not a JSON object", i + 1);
        };

        let code = DCS_CODES.choose(rng).copied().unwrap_or(DEFAULT_DCS_CODE);
        let polarity = ASSIGNED_POLARITIES
            .choose(rng)
            .copied()
            .unwrap_or_default();

        debug!("Memory {}: DCS {:03} {}", i + 1, code, polarity);
        fields.insert("tone".into(), json!(ToneMode::Dcs.as_str()));
        fields.insert("rdcs_code".into(), json!(code));
        fields.insert("tdcs_code".into(), json!(code));
        fields.insert("dcs_polarity".into(), json!(polarity.as_str()));
    }

    Ok(memories.len())
}

/// Pretty-print with four-space indentation
fn to_pretty_json(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

/// `assign-dcs` command
pub fn assign_dcs(input: &Path, output: &Path) -> Result<()> {
    let data = fs::read_to_string(input)
        .with_context(|| format!("Failed to read memory file {}", input.display()))?;
    let mut document: Value = serde_json::from_str(&data)
        .with_context(|| format!("Invalid JSON in {}", input.display()))?;

    let count = assign(&mut document, &mut rand::thread_rng())?;

    fs::write(output, to_pretty_json(&document)?)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Assigned DCS codes to {} memories in {}", count, output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rad_model::dcs::is_standard_code;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn keeps_other_keys_and_order() {
        let mut doc = json!([{"name": "Ch1", "frequency": 446006250, "mode": "FM"}]);
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(assign(&mut doc, &mut rng).unwrap(), 1);

        let fields = doc[0].as_object().unwrap();
        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["name", "frequency", "mode", "tone", "rdcs_code", "tdcs_code", "dcs_polarity"]
        );
        assert_eq!(fields["mode"], "FM");
        assert_eq!(fields["tone"], "DTCS");
        assert_eq!(fields["rdcs_code"], fields["tdcs_code"]);
    }

    #[test]
    fn output_reparses_as_memory_list() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");
        fs::write(&input, r#"[{"name":"A","frequency":462562500},{"name":"B","frequency":462587500}]"#)
            .unwrap();

        assign_dcs(&input, &output).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("[\n    {"));
        let entries = rad_model::parse_memory_list(&text).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.tone == ToneMode::Dcs));
    }

    #[test]
    fn rejects_non_objects() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(assign(&mut json!({"a": 1}), &mut rng).is_err());
        assert!(assign(&mut json!(["x"]), &mut rng).is_err());
    }

    proptest! {
        #[test]
        fn assignments_are_standard(seed in any::<u64>(), n in 0usize..20) {
            let mut doc = Value::Array(
                (0..n).map(|i| json!({"name": format!("M{}", i), "frequency": 446_000_000})).collect(),
            );
            let mut rng = StdRng::seed_from_u64(seed);

            assign(&mut doc, &mut rng).unwrap();

            for memory in doc.as_array().unwrap() {
                let code = memory["rdcs_code"].as_u64().unwrap() as u16;
                prop_assert!(is_standard_code(code));
                prop_assert_eq!(&memory["tdcs_code"], &memory["rdcs_code"]);
                let polarity = memory["dcs_polarity"].as_str().unwrap();
                prop_assert!(polarity == "NN" || polarity == "RR");
            }
        }
    }
}
