use serde::{Deserialize, Serialize};

use crate::common::Vars;

/// placed item id
pub type ItemId = String;

/// Item name prefix marking text-input items. Items whose names start
/// with this prefix participate in required-field and format validation.
pub const INPUT_ITEM_PREFIX: &str = "input";

/// Input field type carried by text-input items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InputType {
    #[default]
    Text,
    Email,
    Tel,
    Number,
}

/// Item configuration bag set by the editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemData {
    /// variable the item's value is stored under
    #[serde(default, rename = "variableName")]
    pub variable_name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "inputType")]
    pub input_type: InputType,
    /// remaining editor-only settings the interpreter does not read
    #[serde(flatten)]
    pub extra: Vars,
}

/// A placed item, read-only to the interpreter.
///
/// Runtime visual state (visibility, position, errors) lives in the separate
/// preview state, never on the item record itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemModel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub data: ItemData,
}

impl ItemModel {
    /// Whether this item is a text input participating in validation.
    pub fn is_text_input(&self) -> bool {
        self.name.starts_with(INPUT_ITEM_PREFIX)
    }

    /// The variable name the item's value is stored under, falling back
    /// to the item id when none is configured.
    pub fn variable_name(&self) -> &str {
        self.data.variable_name.as_deref().unwrap_or(&self.id)
    }
}
