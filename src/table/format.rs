// src/table/format.rs
// Pure cell formatters for the name, value and actions columns

use crate::descriptor::PropertyDescriptor;
use crate::util::string::StringUtils;

use super::row_model::{PropertyKind, PropertyRow};

pub const NO_VALUE_SET: &str = "No value set";
pub const SENSITIVE_VALUE_SET: &str = "Sensitive value set";
pub const EMPTY_STRING_SET: &str = "Empty string set";

/// Columns taken by the info affordance (` ?`) in the name cell.
pub const INFO_AFFORDANCE_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Name,
    Unset,
    Sensitive,
    Blank,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMarkup {
    pub text: String,
    pub style: CellStyle,
    pub required: bool,
    /// Name cells only: the descriptor has something worth a tooltip.
    pub info: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionsMarkup {
    pub go_to_service: bool,
    pub delete: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatContext {
    pub read_only: bool,
    pub supports_navigation: bool,
}

pub fn format_name(row: &PropertyRow, descriptor: Option<&PropertyDescriptor>, width: usize) -> CellMarkup {
    let info = descriptor.map_or(false, PropertyDescriptor::has_info);
    let available = if info {
        width.saturating_sub(INFO_AFFORDANCE_WIDTH)
    } else {
        width
    };

    CellMarkup {
        text: StringUtils::ellipsis(&row.display_name, available),
        style: CellStyle::Name,
        required: row.kind == PropertyKind::Required,
        info,
    }
}

/// Resolution order: unset, sensitive, allowable display name, empty string, raw.
pub fn format_value(row: &PropertyRow, descriptor: Option<&PropertyDescriptor>, width: usize) -> CellMarkup {
    let required = row.kind == PropertyKind::Required;
    let markup = |text: &str, style| CellMarkup {
        text: StringUtils::ellipsis(text, width),
        style,
        required,
        info: false,
    };

    let Some(value) = row.value.as_deref() else {
        return markup(NO_VALUE_SET, CellStyle::Unset);
    };

    if descriptor.map_or(false, |d| d.sensitive) {
        return markup(SENSITIVE_VALUE_SET, CellStyle::Sensitive);
    }

    let shown = descriptor
        .and_then(|d| d.find_allowable_value(value))
        .map_or(value, |allowable| allowable.display_name.as_str());

    if shown.is_empty() {
        markup(EMPTY_STRING_SET, CellStyle::Blank)
    } else {
        markup(shown, CellStyle::Value)
    }
}

pub fn format_actions(
    row: &PropertyRow,
    descriptor: Option<&PropertyDescriptor>,
    ctx: FormatContext,
) -> ActionsMarkup {
    let go_to_service = match (descriptor, row.value.as_deref()) {
        (Some(descriptor), Some(value)) => {
            ctx.supports_navigation
                && descriptor.identifies_controller_service.is_some()
                && descriptor.find_allowable_value(value).is_some()
        }
        _ => false,
    };

    ActionsMarkup {
        go_to_service,
        delete: !ctx.read_only && row.kind == PropertyKind::UserDefined,
    }
}
