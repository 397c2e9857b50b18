//! Settings reconciliation
//!
//! Applies a [`TransposedProfile`] to a live settings tree. Leaves named in
//! the profile are overwritten; every other leaf keeps the value the device
//! reported.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::profile::TransposedProfile;
use crate::settings::{SettingValue, SettingsTree};

/// One leaf changed by [`apply`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedSetting {
    pub name: String,
    pub pretty_name: String,
    pub previous: Option<SettingValue>,
    pub value: SettingValue,
}

/// Overwrite every leaf of `tree` that `profile` names
///
/// Values are not validated against the leaf's type or range; a value the
/// radio cannot take surfaces when the image is written back. Applying the
/// same profile twice yields the same tree.
pub fn apply<T>(
    tree: &mut T,
    profile: &TransposedProfile,
    verbose: bool,
) -> Result<Vec<AppliedSetting>, ConfigError>
where
    T: SettingsTree + ?Sized,
{
    let mut applied = Vec::new();

    for name in tree.leaf_names() {
        let Some(entry) = profile.get(&name) else {
            continue;
        };

        if verbose {
            info!("Setting {} to {}", entry.pretty_name, entry.value);
        } else {
            debug!("Setting {} ({}) to {}", entry.pretty_name, name, entry.value);
        }

        let previous = tree.read(&name).cloned();
        tree.write(&name, entry.value.clone())?;

        applied.push(AppliedSetting {
            name,
            pretty_name: entry.pretty_name.clone(),
            previous,
            value: entry.value.clone(),
        });
    }

    if applied.len() < profile.len() {
        for (name, entry) in profile.iter() {
            if !applied.iter().any(|a| a.name == name) {
                debug!(
                    "{} has no setting {} ({}), skipped",
                    profile.model(),
                    name,
                    entry.pretty_name
                );
            }
        }
    }

    Ok(applied)
}
