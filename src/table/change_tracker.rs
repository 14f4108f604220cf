// src/table/change_tracker.rs
// Dirty detection and diff marshalling over the row model

use std::collections::BTreeMap;

use super::row_model::PropertyRow;

/// Property name -> new value. `None` means "set to null" (unset or delete).
pub type PropertyChanges = BTreeMap<String, Option<String>>;

/// Diff payload for a save: hidden rows become `None`, changed rows carry
/// their current value, untouched rows are left out.
pub fn marshal_changes<'a>(rows: impl IntoIterator<Item = &'a PropertyRow>) -> PropertyChanges {
    let mut changes = PropertyChanges::new();
    for row in rows {
        if row.hidden {
            changes.insert(row.property.clone(), None);
        } else if row.is_dirty() {
            changes.insert(row.property.clone(), row.value.clone());
        }
    }
    changes
}

/// True exactly when [`marshal_changes`] would be non-empty.
pub fn is_save_required<'a>(rows: impl IntoIterator<Item = &'a PropertyRow>) -> bool {
    rows.into_iter().any(|row| row.hidden || row.is_dirty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::row_model::{NewPropertyRow, PropertyKind, RowModel, RowPatch};

    fn model() -> RowModel {
        let mut model = RowModel::new();
        model
            .set_items(vec![
                NewPropertyRow::new("Batch Size", "Batch Size", Some("10".into()), PropertyKind::Required),
                NewPropertyRow::new("Comment", "Comment", Some("old".into()), PropertyKind::Optional),
                NewPropertyRow::new("extra", "extra", Some("x".into()), PropertyKind::UserDefined),
            ])
            .unwrap();
        model
    }

    #[test]
    fn test_unchanged_rows_are_omitted() {
        let model = model();
        assert!(marshal_changes(model.items()).is_empty());
        assert!(!is_save_required(model.items()));
    }

    #[test]
    fn test_changed_row_emits_current_value() {
        let mut model = model();
        let id = model.find_by_key("Comment").unwrap().id;
        model.update_item(id, RowPatch::default().value(None)).unwrap();

        let changes = marshal_changes(model.items());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("Comment"), Some(&None));
        assert!(is_save_required(model.items()));
    }

    #[test]
    fn test_hidden_row_emits_null_regardless_of_value() {
        let mut model = model();
        let id = model.find_by_key("extra").unwrap().id;
        model
            .update_item(id, RowPatch::default().value(Some("changed".into())).hidden(true))
            .unwrap();

        let changes = marshal_changes(model.items());
        assert_eq!(changes.get("extra"), Some(&None));
    }

    #[test]
    fn test_save_required_agrees_with_marshal() {
        let mut model = model();
        let id = model.find_by_key("extra").unwrap().id;

        // hidden but otherwise untouched is still a pending delete
        model.update_item(id, RowPatch::default().hidden(true)).unwrap();
        assert_eq!(is_save_required(model.items()), !marshal_changes(model.items()).is_empty());
        assert!(is_save_required(model.items()));

        model.update_item(id, RowPatch::default().hidden(false)).unwrap();
        assert_eq!(is_save_required(model.items()), !marshal_changes(model.items()).is_empty());
        assert!(!is_save_required(model.items()));
    }

    #[test]
    fn test_empty_string_differs_from_null() {
        let mut model = model();
        let id = model.find_by_key("Comment").unwrap().id;
        model
            .update_item(id, RowPatch::default().previous_value(None).value(Some(String::new())))
            .unwrap();

        let changes = marshal_changes(model.items());
        assert_eq!(changes.get("Comment"), Some(&Some(String::new())));
    }
}
