// src/table/mod.rs
// The property table widget: rows, grid, editors and deferred lookups

pub mod add_property;
pub mod change_tracker;
pub mod complete;
pub mod detail;
pub mod format;
pub mod grid;
pub mod handle_key;
pub mod render;
pub mod row_model;
pub mod tooltip;

use std::collections::HashMap;

use ratatui::layout::Rect;
use tracing::{debug, warn};

use crate::config::PropertyTableConfig;
use crate::descriptor::{DescriptorMap, HistoryMap};
use crate::editor::CellEditor;
use crate::error::Result;
use crate::request::{RequestToken, TableRequest, TokenSource};
use crate::service::flow::ServiceCreationFlow;

use add_property::AddPropertyDialog;
use change_tracker::PropertyChanges;
use detail::ValueDetail;
use format::{format_actions, FormatContext};
use grid::GridView;
use row_model::{NewPropertyRow, PropertyKind, PropertyRow, RowId, RowModel, RowPatch};
use tooltip::PropertyTooltip;

pub const GENERIC_ERROR: &str = "Unable to complete the request";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Modal message shown over the table until the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn info(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            severity: Severity::Info,
        }
    }

    pub fn error(detail: &str) -> Self {
        Self {
            title: "Error".to_string(),
            message: format!("{}. {}", GENERIC_ERROR, detail),
            severity: Severity::Error,
        }
    }
}

/// Outcomes the embedding application reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    Notice(Notice),
    NavigateToService {
        service_id: String,
        parent_group_id: Option<String>,
    },
}

/// Secondary surface layered over the grid. One at a time.
#[derive(Debug, Clone)]
pub enum Dialog {
    AddProperty(AddPropertyDialog),
    CreateService(ServiceCreationFlow),
    Detail(ValueDetail),
    Tooltip(PropertyTooltip),
}

/// What an outstanding request was issued for.
#[derive(Debug, Clone, PartialEq)]
enum Pending {
    AddProperty { name: String },
    ServiceTypes,
    CreateService,
    RefreshDescriptor { row_id: RowId, service_id: String },
    GoToService,
}

impl Pending {
    fn belongs_to_flow(&self) -> bool {
        matches!(
            self,
            Pending::ServiceTypes | Pending::CreateService | Pending::RefreshDescriptor { .. }
        )
    }
}

#[derive(Debug)]
pub struct PropertyTable {
    config: PropertyTableConfig,
    model: RowModel,
    descriptors: DescriptorMap,
    history: HistoryMap,
    grid: GridView,
    group_id: Option<String>,
    editor: Option<CellEditor>,
    dialog: Option<Dialog>,
    notice: Option<Notice>,
    tokens: TokenSource,
    pending: HashMap<RequestToken, Pending>,
    requests: Vec<TableRequest>,
    events: Vec<TableEvent>,
    destroyed: bool,
}

impl PropertyTable {
    pub fn new(config: PropertyTableConfig) -> Self {
        Self {
            config,
            model: RowModel::new(),
            descriptors: DescriptorMap::new(),
            history: HistoryMap::new(),
            grid: GridView::new(),
            group_id: None,
            editor: None,
            dialog: None,
            notice: None,
            tokens: TokenSource::default(),
            pending: HashMap::new(),
            requests: Vec::new(),
            events: Vec::new(),
            destroyed: false,
        }
    }

    pub fn config(&self) -> &PropertyTableConfig {
        &self.config
    }

    fn format_context(&self) -> FormatContext {
        FormatContext {
            read_only: self.config.read_only,
            supports_navigation: self.config.supports_navigation,
        }
    }

    /// Replace every row with `values`, in iteration order.
    pub fn load_properties<I>(&mut self, values: I, descriptors: DescriptorMap, history: HistoryMap) -> Result<()>
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        self.clear();

        let rows = values
            .into_iter()
            .map(|(name, value)| {
                let descriptor = descriptors.get(&name);
                let kind = match descriptor {
                    None => PropertyKind::UserDefined,
                    Some(d) if d.required => PropertyKind::Required,
                    Some(d) if d.dynamic => PropertyKind::UserDefined,
                    Some(_) => PropertyKind::Optional,
                };
                let display_name = descriptor.map_or(name.as_str(), |d| d.label()).to_string();
                let value = value.or_else(|| descriptor.and_then(|d| d.default_value.clone()));
                NewPropertyRow::new(&name, &display_name, value, kind)
            })
            .collect::<Vec<_>>();

        debug!(rows = rows.len(), "loading properties");
        self.model.set_items(rows)?;
        self.descriptors = descriptors;
        self.history = history;
        self.sync_grid();
        self.grid.select_first();
        Ok(())
    }

    /// Commit the open editor, writing its value when it changed.
    pub fn save_row(&mut self) {
        let Some(mut editor) = self.editor.take() else {
            return;
        };

        let commit = editor.commit();
        if commit.dirty {
            let patch = RowPatch::default().value(commit.value);
            if let Err(e) = self.model.update_item(editor.row_id(), patch) {
                warn!("could not write edited value: {}", e);
            }
        }
        editor.destroy();
        self.sync_grid();
    }

    /// Close the open editor without touching its row.
    pub fn cancel_edit(&mut self) {
        if let Some(mut editor) = self.editor.take() {
            editor.cancel();
            editor.destroy();
        }
    }

    pub fn is_save_required(&self) -> bool {
        change_tracker::is_save_required(self.model.items())
    }

    pub fn marshal_properties(&self) -> PropertyChanges {
        change_tracker::marshal_changes(self.model.items())
    }

    /// Recompute column widths for `area` and re-format every row.
    pub fn reset_table_size(&mut self, area: Rect) {
        let ctx = self.format_context();
        self.grid.resize(area, &self.model, &self.descriptors, ctx);
    }

    /// Empty the table and drop every outstanding request.
    pub fn clear(&mut self) {
        self.cancel_edit();
        self.dialog = None;
        self.notice = None;
        self.pending.clear();
        self.requests.clear();
        self.model.clear();
        self.model.take_events();
        self.descriptors.clear();
        self.history.clear();
        self.grid.reset();
    }

    /// Idempotent. A destroyed table ignores input and responses.
    pub fn destroy(&mut self) {
        self.clear();
        self.events.clear();
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn set_group_id(&mut self, group_id: Option<String>) {
        self.group_id = group_id;
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    /// Open the editor (or the read-only detail) for the selected row.
    pub fn activate_value_cell(&mut self) {
        let Some(id) = self.grid.selected_id() else {
            return;
        };

        if self.config.read_only {
            let detail = self
                .model
                .get_item_by_id(id)
                .and_then(|row| ValueDetail::build(row, self.descriptors.get(&row.property)));
            if let Some(detail) = detail {
                self.dialog = Some(Dialog::Detail(detail));
            }
            return;
        }

        self.open_editor(id);
    }

    fn open_editor(&mut self, id: RowId) {
        // one editor at a time
        self.save_row();

        let Some(row) = self.model.get_item_by_id(id) else {
            return;
        };
        if row.hidden {
            return;
        }
        let anchor = self.grid.cell_area(id).unwrap_or_default();
        debug!(property = %row.property, "opening editor");
        self.editor = Some(CellEditor::open(row, self.descriptors.get(&row.property), anchor));
    }

    /// Soft-delete the selected user-defined row.
    pub fn delete_selected(&mut self) -> bool {
        if self.config.read_only {
            return false;
        }
        let Some(id) = self.grid.selected_id() else {
            return false;
        };
        if self.model.get_item_by_id(id).map(|row| row.kind) != Some(PropertyKind::UserDefined) {
            return false;
        }

        if self.editor.as_ref().map(CellEditor::row_id) == Some(id) {
            self.cancel_edit();
        }
        if let Err(e) = self.model.update_item(id, RowPatch::default().hidden(true)) {
            warn!("could not delete row: {}", e);
            return false;
        }
        self.sync_grid();
        true
    }

    /// Navigate to the controller service the selected row references.
    pub fn go_to_service(&mut self) -> bool {
        let Some(id) = self.grid.selected_id() else {
            return false;
        };
        let Some(row) = self.model.get_item_by_id(id) else {
            return false;
        };
        let actions = format_actions(row, self.descriptors.get(&row.property), self.format_context());
        let Some(service_id) = row.value.clone().filter(|_| actions.go_to_service) else {
            return false;
        };

        self.save_row();
        let pending = if self.config.read_only {
            None
        } else {
            Some(self.marshal_properties())
        };

        let token = self.tokens.next();
        self.pending.insert(token, Pending::GoToService);
        self.requests.push(TableRequest::GoToService {
            token,
            service_id,
            pending,
        });
        true
    }

    /// Show the descriptor tooltip for the selected row.
    pub fn show_tooltip(&mut self) -> bool {
        let Some(row) = self.selected_row() else {
            return false;
        };
        let Some(descriptor) = self.descriptors.get(&row.property) else {
            return false;
        };
        let tooltip = PropertyTooltip::build(descriptor, self.history.get(&row.property));
        self.dialog = Some(Dialog::Tooltip(tooltip));
        true
    }

    /// Requests waiting for the host to execute them.
    pub fn take_requests(&mut self) -> Vec<TableRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn take_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// True while keys belong to an editor, a dialog or a notice.
    pub fn is_capturing_input(&self) -> bool {
        self.editor.is_some() || self.dialog.is_some() || self.notice.is_some()
    }

    pub fn rows(&self) -> &[PropertyRow] {
        self.model.items()
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &PropertyRow> {
        self.model.visible()
    }

    pub fn find_row(&self, property: &str) -> Option<&PropertyRow> {
        self.model.find_by_key(property)
    }

    pub fn descriptors(&self) -> &DescriptorMap {
        &self.descriptors
    }

    pub fn selected_row(&self) -> Option<&PropertyRow> {
        self.grid.selected_id().and_then(|id| self.model.get_item_by_id(id))
    }

    pub fn select_property(&mut self, property: &str) -> bool {
        match self.model.find_by_key(property).map(|row| row.id) {
            Some(id) => self.grid.select(id),
            None => false,
        }
    }

    pub fn editor(&self) -> Option<&CellEditor> {
        self.editor.as_ref()
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn grid(&self) -> &GridView {
        &self.grid
    }

    fn show_notice(&mut self, notice: Notice) {
        self.events.push(TableEvent::Notice(notice.clone()));
        self.notice = Some(notice);
    }

    fn sync_grid(&mut self) {
        let ctx = self.format_context();
        self.grid.sync(&mut self.model, &self.descriptors, ctx);
    }

    /// Close the creation dialog and forget its outstanding requests.
    fn close_service_flow(&mut self) {
        if matches!(self.dialog, Some(Dialog::CreateService(_))) {
            self.dialog = None;
        }
        self.pending.retain(|_, pending| !pending.belongs_to_flow());
    }

    fn start_service_flow(&mut self, row_id: RowId, property: &str, service_type: &str) {
        let token = self.tokens.next();
        self.pending.insert(token, Pending::ServiceTypes);
        self.requests.push(TableRequest::ListServiceTypes {
            token,
            service_type: service_type.to_string(),
        });
        self.dialog = Some(Dialog::CreateService(ServiceCreationFlow::new(row_id, property, service_type)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{AllowableValueEntity, PropertyDescriptor};
    use crate::editor::{EditorKind, SENSITIVE_PLACEHOLDER};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    pub(crate) fn descriptor(name: &str) -> PropertyDescriptor {
        PropertyDescriptor {
            name: name.to_string(),
            display_name: name.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn table(config: PropertyTableConfig) -> PropertyTable {
        let mut descriptors = DescriptorMap::new();
        descriptors.insert(
            "Batch Size".into(),
            PropertyDescriptor {
                required: true,
                default_value: Some(String::new()),
                ..descriptor("Batch Size")
            },
        );
        descriptors.insert("Comment".into(), descriptor("Comment"));
        descriptors.insert(
            "Password".into(),
            PropertyDescriptor { sensitive: true, ..descriptor("Password") },
        );
        descriptors.insert(
            "Mode".into(),
            PropertyDescriptor {
                allowable_values: Some(vec![
                    AllowableValueEntity::new("", "Blank"),
                    AllowableValueEntity::new("fast", "Fast"),
                ]),
                ..descriptor("Mode")
            },
        );
        descriptors.insert(
            "Retries".into(),
            PropertyDescriptor { default_value: Some("3".into()), ..descriptor("Retries") },
        );

        let values = vec![
            ("Batch Size".to_string(), Some("10".to_string())),
            ("Comment".to_string(), Some("old".to_string())),
            ("Password".to_string(), Some("s3cr3t".to_string())),
            ("Mode".to_string(), None),
            ("Retries".to_string(), None),
            ("extra".to_string(), Some("x".to_string())),
        ];

        let mut table = PropertyTable::new(config);
        table.reset_table_size(Rect::new(0, 0, 80, 20));
        table.load_properties(values, descriptors, HistoryMap::new()).unwrap();
        table
    }

    pub(crate) fn editable() -> PropertyTableConfig {
        PropertyTableConfig {
            read_only: false,
            dialog_container: Some("main".into()),
            supports_navigation: true,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    fn edit(table: &mut PropertyTable, property: &str) {
        assert!(table.select_property(property));
        table.activate_value_cell();
        assert_eq!(table.editor().map(|e| e.property()), Some(property));
    }

    #[test]
    fn test_load_assigns_kinds_and_defaults() {
        let table = table(editable());
        assert_eq!(table.find_row("Batch Size").unwrap().kind, PropertyKind::Required);
        assert_eq!(table.find_row("Comment").unwrap().kind, PropertyKind::Optional);
        assert_eq!(table.find_row("extra").unwrap().kind, PropertyKind::UserDefined);

        let retries = table.find_row("Retries").unwrap();
        assert_eq!(retries.value.as_deref(), Some("3"));
        assert_eq!(retries.previous_value.as_deref(), Some("3"));

        let order: Vec<_> = table.visible_rows().map(|r| r.property.as_str()).collect();
        assert_eq!(order, vec!["Batch Size", "Comment", "Password", "Mode", "Retries", "extra"]);
        assert!(!table.is_save_required());
    }

    #[test]
    fn test_load_with_repeated_name_leaves_table_empty() {
        let mut table = table(editable());
        let values = vec![
            ("a".to_string(), Some("1".to_string())),
            ("a".to_string(), Some("2".to_string())),
        ];
        assert!(table.load_properties(values, DescriptorMap::new(), HistoryMap::new()).is_err());

        assert_eq!(table.rows().len(), 0);
        assert!(table.grid().order().is_empty());
        assert!(table.selected_row().is_none());
        assert!(table.descriptors().is_empty());
        assert!(!table.is_save_required());

        table
            .load_properties(vec![("b".to_string(), None)], DescriptorMap::new(), HistoryMap::new())
            .unwrap();
        assert_eq!(table.grid().order().len(), 1);
        assert_eq!(table.selected_row().unwrap().property, "b");
    }

    #[test]
    fn test_marshal_omits_unchanged_rows() {
        let mut table = table(editable());
        edit(&mut table, "Comment");
        table.handle_key(key(KeyCode::Char('!')));
        table.handle_key(key(KeyCode::Enter));

        let changes = table.marshal_properties();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["Comment"].as_deref(), Some("old!"));
        assert!(table.is_save_required());
    }

    #[test]
    fn test_batch_size_blank_commit_restores_previous() {
        let mut table = table(editable());
        edit(&mut table, "Batch Size");
        table.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        table.handle_key(key(KeyCode::Enter));

        assert_eq!(table.find_row("Batch Size").unwrap().value.as_deref(), Some("10"));
        assert!(!table.is_save_required());
        assert!(table.marshal_properties().is_empty());
    }

    #[test]
    fn test_comment_cleared_commits_none() {
        let mut table = table(editable());
        edit(&mut table, "Comment");
        table.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        table.handle_key(key(KeyCode::Enter));

        assert_eq!(table.find_row("Comment").unwrap().value, None);
        assert_eq!(table.marshal_properties()["Comment"], None);
    }

    #[test]
    fn test_sensitive_editor_hides_secret() {
        let mut table = table(editable());
        edit(&mut table, "Password");
        match table.editor().unwrap().kind() {
            EditorKind::Plain(state) => {
                assert_eq!(state.text(), SENSITIVE_PLACEHOLDER);
                assert!(!state.text().contains("s3cr3t"));
            }
            other => panic!("unexpected editor {:?}", other),
        }
        table.handle_key(key(KeyCode::Enter));
        assert_eq!(table.find_row("Password").unwrap().value.as_deref(), Some("s3cr3t"));
        assert!(!table.is_save_required());
    }

    #[test]
    fn test_choice_blank_over_unset_is_not_a_change() {
        let mut table = table(editable());
        edit(&mut table, "Mode");
        // No value -> Blank
        table.handle_key(key(KeyCode::Down));
        table.handle_key(key(KeyCode::Enter));
        assert_eq!(table.find_row("Mode").unwrap().value, None);
        assert!(!table.is_save_required());
    }

    #[test]
    fn test_escape_cancels_without_commit() {
        let mut table = table(editable());
        edit(&mut table, "Comment");
        table.handle_key(key(KeyCode::Char('x')));
        table.handle_key(key(KeyCode::Esc));
        assert!(table.editor().is_none());
        assert_eq!(table.find_row("Comment").unwrap().value.as_deref(), Some("old"));
    }

    #[test]
    fn test_opening_a_second_editor_commits_the_first() {
        let mut table = table(editable());
        edit(&mut table, "Comment");
        table.handle_key(key(KeyCode::Char('!')));
        table.select_property("extra");
        table.activate_value_cell();

        assert_eq!(table.editor().map(|e| e.property()), Some("extra"));
        assert_eq!(table.find_row("Comment").unwrap().value.as_deref(), Some("old!"));
    }

    #[test]
    fn test_delete_hides_user_defined_only() {
        let mut table = table(editable());
        table.select_property("Comment");
        assert!(!table.delete_selected());

        table.select_property("extra");
        assert!(table.delete_selected());
        let row = table.find_row("extra").unwrap();
        assert!(row.hidden);
        assert_eq!(table.visible_rows().count(), 5);
        assert_eq!(table.marshal_properties()["extra"], None);
        assert!(table.is_save_required());
    }

    #[test]
    fn test_read_only_shows_detail_instead_of_editor() {
        let mut table = table(PropertyTableConfig { read_only: true, ..editable() });
        table.select_property("Comment");
        table.activate_value_cell();
        assert!(table.editor().is_none());
        assert!(matches!(table.dialog(), Some(Dialog::Detail(_))));

        table.handle_key(key(KeyCode::Esc));
        assert!(table.dialog().is_none());

        // nothing to show for sensitive or unset values
        table.select_property("Password");
        table.activate_value_cell();
        assert!(table.dialog().is_none());

        table.select_property("extra");
        assert!(!table.delete_selected());
    }

    #[test]
    fn test_clear_and_destroy() {
        let mut table = table(editable());
        edit(&mut table, "Comment");
        table.clear();
        assert!(table.editor().is_none());
        assert_eq!(table.rows().len(), 0);
        assert!(!table.is_save_required());

        table.destroy();
        table.destroy();
        assert!(table.is_destroyed());
        assert!(!table.handle_key(key(KeyCode::Enter)));
    }

    #[test]
    fn test_group_id() {
        let mut table = PropertyTable::new(editable());
        assert_eq!(table.group_id(), None);
        table.set_group_id(Some("pg-1".into()));
        assert_eq!(table.group_id(), Some("pg-1"));
    }

    #[test]
    fn test_tooltip_for_described_property() {
        let mut table = table(editable());
        table.select_property("Retries");
        assert!(table.show_tooltip());
        assert!(matches!(table.dialog(), Some(Dialog::Tooltip(_))));
        table.handle_key(key(KeyCode::Char('z')));
        assert!(table.dialog().is_none());
    }
}
