//! Radio settings trees
//!
//! Drivers expose a model's settings as a tree of named groups whose
//! leaves carry the actual values. The reconciler only needs the
//! [`SettingsTree`] capability, never the concrete layout.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Value held by a settings leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl TryFrom<&serde_json::Value> for SettingValue {
    type Error = String;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .ok_or_else(|| format!("unrepresentable number {}", n)),
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Null => Err("null is not a setting value".to_string()),
            Value::Array(_) | Value::Object(_) => {
                Err(format!("expected a scalar setting value, got {}", value))
            }
        }
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for SettingValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for SettingValue {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A named leaf setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    /// Internal name, unique within a model
    pub name: String,
    /// Label shown to humans
    pub label: String,
    pub value: SettingValue,
}

/// A node of a settings tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingNode {
    Group(SettingsGroup),
    Leaf(Setting),
}

/// A named group of settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SettingsGroup {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub children: Vec<SettingNode>,
}

impl SettingsGroup {
    /// Create an empty group
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Append a leaf
    pub fn with_leaf(
        mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<SettingValue>,
    ) -> Self {
        self.children.push(SettingNode::Leaf(Setting {
            name: name.into(),
            label: label.into(),
            value: value.into(),
        }));
        self
    }

    /// Append a subgroup
    pub fn with_group(mut self, group: SettingsGroup) -> Self {
        self.children.push(SettingNode::Group(group));
        self
    }

    /// All leaves, depth-first in declaration order
    pub fn leaves(&self) -> Vec<&Setting> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Setting> {
        for child in &mut self.children {
            match child {
                SettingNode::Leaf(leaf) if leaf.name == name => return Some(leaf),
                SettingNode::Leaf(_) => {}
                SettingNode::Group(group) => {
                    if let Some(found) = group.find_mut(name) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }
}

fn collect_leaves<'a>(group: &'a SettingsGroup, out: &mut Vec<&'a Setting>) {
    for child in &group.children {
        match child {
            SettingNode::Leaf(leaf) => out.push(leaf),
            SettingNode::Group(sub) => collect_leaves(sub, out),
        }
    }
}

/// Capability set the reconciler needs from a settings tree
pub trait SettingsTree {
    /// Names of every leaf, each exactly once
    fn leaf_names(&self) -> Vec<String>;

    /// Current value of a leaf
    fn read(&self, name: &str) -> Option<&SettingValue>;

    /// Overwrite a leaf's value. No type or range checking happens here.
    fn write(&mut self, name: &str, value: SettingValue) -> Result<(), SettingsError>;
}

impl SettingsTree for SettingsGroup {
    fn leaf_names(&self) -> Vec<String> {
        self.leaves().into_iter().map(|s| s.name.clone()).collect()
    }

    fn read(&self, name: &str) -> Option<&SettingValue> {
        self.leaves()
            .into_iter()
            .find(|s| s.name == name)
            .map(|s| &s.value)
    }

    fn write(&mut self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        let leaf = self
            .find_mut(name)
            .ok_or_else(|| SettingsError::UnknownSetting(name.to_string()))?;
        leaf.value = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SettingsGroup {
        SettingsGroup::new("top", "Settings")
            .with_group(
                SettingsGroup::new("basic", "Basic Settings")
                    .with_leaf("squelch", "Squelch Level", 3)
                    .with_leaf("beep", "Beep", true),
            )
            .with_group(
                SettingsGroup::new("advanced", "Advanced Settings")
                    .with_leaf("tot", "Timeout Timer", 60)
                    .with_group(SettingsGroup::new("ptt", "PTT").with_leaf("ptt_id", "PTT ID", "off")),
            )
    }

    #[test]
    fn walk_visits_every_leaf_once() {
        let tree = sample();
        assert_eq!(tree.leaf_names(), vec!["squelch", "beep", "tot", "ptt_id"]);
    }

    #[test]
    fn write_reaches_nested_leaf() {
        let mut tree = sample();
        tree.write("ptt_id", SettingValue::from("bot")).unwrap();
        assert_eq!(tree.read("ptt_id"), Some(&SettingValue::Text("bot".into())));
        assert_eq!(tree.read("squelch"), Some(&SettingValue::Integer(3)));
    }

    #[test]
    fn write_unknown_leaf_fails() {
        let mut tree = sample();
        let err = tree.write("nope", SettingValue::Bool(true)).unwrap_err();
        assert_eq!(err, SettingsError::UnknownSetting("nope".into()));
    }

    #[test]
    fn json_scalars_convert() {
        let v = serde_json::json!(5);
        assert_eq!(SettingValue::try_from(&v).unwrap(), SettingValue::Integer(5));
        let v = serde_json::json!(2.5);
        assert_eq!(SettingValue::try_from(&v).unwrap(), SettingValue::Float(2.5));
        let v = serde_json::json!("Off");
        assert_eq!(SettingValue::try_from(&v).unwrap(), SettingValue::Text("Off".into()));
        assert!(SettingValue::try_from(&serde_json::json!([1])).is_err());
        assert!(SettingValue::try_from(&serde_json::Value::Null).is_err());
    }

    #[test]
    fn tree_round_trips_through_json() {
        let tree = sample();
        let json = serde_json::to_string(&tree).unwrap();
        let back: SettingsGroup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
