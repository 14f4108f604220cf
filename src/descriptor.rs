// src/descriptor.rs
// Server supplied property metadata, as it arrives on the wire

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::util::string::StringUtils;

/// Property name -> descriptor, shared by the grid, the editors and the formatters.
pub type DescriptorMap = HashMap<String, PropertyDescriptor>;

/// Property name -> change history.
pub type HistoryMap = HashMap<String, PropertyHistory>;

/// Metadata describing one configurable property.
///
/// The table never edits a descriptor in place. Freshly resolved descriptors
/// replace the old entry wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default, rename = "supportsEl")]
    pub supports_el: bool,
    #[serde(default)]
    pub allowable_values: Option<Vec<AllowableValueEntity>>,
    #[serde(default)]
    pub identifies_controller_service: Option<String>,
}

impl PropertyDescriptor {
    /// Label to show for this property, falling back to the canonical name.
    pub fn label(&self) -> &str {
        if StringUtils::is_blank(Some(&self.display_name)) {
            &self.name
        } else {
            &self.display_name
        }
    }

    /// An empty list still counts: it selects the choice editor.
    pub fn has_allowable_values(&self) -> bool {
        self.allowable_values.is_some()
    }

    pub fn allowable_values(&self) -> &[AllowableValueEntity] {
        self.allowable_values.as_deref().unwrap_or(&[])
    }

    pub fn find_allowable_value(&self, value: &str) -> Option<&AllowableValue> {
        self.allowable_values()
            .iter()
            .map(|entity| &entity.allowable_value)
            .find(|allowable| allowable.value == value)
    }

    /// Whether the name cell should carry the info affordance.
    pub fn has_info(&self) -> bool {
        !StringUtils::is_blank(self.description.as_deref())
            || !StringUtils::is_blank(self.default_value.as_deref())
            || self.supports_el
    }

    /// Default value, only when it has visible content.
    pub fn non_blank_default(&self) -> Option<&str> {
        self.default_value
            .as_deref()
            .filter(|value| !StringUtils::is_blank(Some(value)))
    }
}

/// Wire wrapper around [`AllowableValue`] carrying the caller's read permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowableValueEntity {
    pub allowable_value: AllowableValue,
    #[serde(default)]
    pub can_read: Option<bool>,
}

impl AllowableValueEntity {
    pub fn new(value: &str, display_name: &str) -> Self {
        Self {
            allowable_value: AllowableValue {
                value: value.to_string(),
                display_name: display_name.to_string(),
                description: None,
            },
            can_read: None,
        }
    }

    /// Permission is only withheld when the server says so explicitly.
    pub fn is_readable(&self) -> bool {
        self.can_read != Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowableValue {
    pub value: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Response body of a single descriptor lookup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptorEntity {
    pub property_descriptor: PropertyDescriptor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyHistory {
    #[serde(default)]
    pub previous_values: Vec<PreviousValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousValue {
    #[serde(default)]
    pub previous_value: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub user_identity: String,
}
