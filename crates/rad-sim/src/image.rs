//! Virtual radio memory image
//!
//! The image is what a clone read returns and a clone write replaces: the
//! model id the radio identifies as, its settings tree and its memory bank.
//! Images persist as JSON so a `sim:` port keeps its contents between runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rad_model::{BankError, ChannelMemory, MemoryBank, MemoryRange, ModelAdapter, SettingsGroup};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SimError;

/// Complete contents of a virtual radio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioImage {
    /// Model id the radio identifies as
    pub model: String,
    pub memory_range: MemoryRange,
    pub settings: SettingsGroup,
    /// Occupied slots; missing slots read back as empty
    #[serde(default)]
    pub memories: BTreeMap<u32, ChannelMemory>,
}

impl RadioImage {
    /// Image of a radio fresh from the factory
    pub fn factory(model: &ModelAdapter) -> Self {
        Self {
            model: model.id().to_string(),
            memory_range: model.memory_range(),
            settings: factory_settings(model),
            memories: BTreeMap::new(),
        }
    }

    /// Load an image previously written by [`RadioImage::save`]
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let data = fs::read_to_string(path)?;
        let image: Self = serde_json::from_str(&data)?;
        debug!(
            "Loaded {} image from {} ({} memories)",
            image.model,
            path.display(),
            image.memories.len()
        );
        Ok(image)
    }

    /// Load `path` if it exists, otherwise start from the factory image
    pub fn load_or_factory(path: &Path, model: &ModelAdapter) -> Result<Self, SimError> {
        if !path.exists() {
            debug!("{} does not exist, using factory image", path.display());
            return Ok(Self::factory(model));
        }

        let image = Self::load(path)?;
        if image.model != model.id() {
            return Err(SimError::ModelMismatch {
                expected: model.id().to_string(),
                found: image.model,
            });
        }
        Ok(image)
    }

    pub fn save(&self, path: &Path) -> Result<(), SimError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        debug!("Saved {} image to {}", self.model, path.display());
        Ok(())
    }

    /// Occupied slots in slot order
    pub fn occupied(&self) -> impl Iterator<Item = &ChannelMemory> {
        self.memories.values().filter(|m| !m.empty)
    }
}

impl MemoryBank for RadioImage {
    fn get(&self, slot: u32) -> Result<ChannelMemory, BankError> {
        self.memory_range.check(slot)?;
        Ok(self
            .memories
            .get(&slot)
            .cloned()
            .unwrap_or_else(|| ChannelMemory::empty(slot)))
    }

    fn set(&mut self, slot: u32, memory: ChannelMemory) -> Result<(), BankError> {
        self.memory_range.check(slot)?;
        if memory.empty {
            self.memories.remove(&slot);
        } else {
            self.memories.insert(slot, ChannelMemory { number: slot, ..memory });
        }
        Ok(())
    }
}

/// Default settings tree, shaped like a typical handheld's menu
fn factory_settings(model: &ModelAdapter) -> SettingsGroup {
    let basic = SettingsGroup::new("basic", "Basic Settings")
        .with_leaf("squelch", "Squelch Level", 3)
        .with_leaf("tot", "Timeout Timer", 60)
        .with_leaf("vox", "VOX Level", 0)
        .with_leaf("beep", "Beep", true)
        .with_leaf("voice", "Voice Prompt", "English")
        .with_leaf("backlight", "Backlight", 5);

    let advanced = SettingsGroup::new("advanced", "Advanced Settings")
        .with_leaf("ptt_id", "PTT ID", "Off")
        .with_leaf("roger", "Roger Beep", false)
        .with_leaf("dual_watch", "Dual Watch", true)
        .with_leaf("power_on_msg", "Power On Message", model.model());

    SettingsGroup::new("top", model.display_name())
        .with_group(basic)
        .with_group(advanced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rad_model::{ModelRegistry, PowerLevel, SettingValue, SettingsTree};

    fn uv5r() -> ModelAdapter {
        ModelRegistry::builtin().resolve("uv5r").unwrap().clone()
    }

    #[test]
    fn factory_image_is_blank() {
        let image = RadioImage::factory(&uv5r());

        assert_eq!(image.model, "uv5r");
        assert_eq!(image.occupied().count(), 0);
        assert!(image.get(0).unwrap().empty);
        assert!(image.get(127).unwrap().empty);
        assert!(image.get(128).is_err());
        assert!(image.settings.leaf_names().contains(&"squelch".to_string()));
    }

    #[test]
    fn empty_writes_free_the_slot() {
        let mut image = RadioImage::factory(&uv5r());
        let mem = rad_model::MemoryRecord::new("GMRS1", 462_562_500, PowerLevel::new("High", 4000))
            .to_channel_memory();

        image.set(3, mem).unwrap();
        assert_eq!(image.get(3).unwrap().number, 3);
        assert_eq!(image.occupied().count(), 1);

        let mut cleared = image.get(3).unwrap();
        cleared.empty = true;
        image.set(3, cleared).unwrap();
        assert!(image.memories.is_empty());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uv5r.json");
        let model = uv5r();

        let mut image = RadioImage::load_or_factory(&path, &model).unwrap();
        image.settings.write("squelch", SettingValue::Integer(9)).unwrap();
        image.save(&path).unwrap();

        let reloaded = RadioImage::load_or_factory(&path, &model).unwrap();
        assert_eq!(reloaded, image);
    }

    #[test]
    fn image_of_another_model_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radio.json");
        RadioImage::factory(&uv5r()).save(&path).unwrap();

        let rt470 = ModelRegistry::builtin().resolve("rt470").unwrap().clone();
        let err = RadioImage::load_or_factory(&path, &rt470).unwrap_err();
        assert!(matches!(err, SimError::ModelMismatch { .. }));
    }
}
