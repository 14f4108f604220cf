// src/service/flow.rs
// Secondary dialog that creates a controller service for a property

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    prelude::{Color, Modifier, Style, Widget},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::table::row_model::RowId;
use crate::util::string::StringUtils;

use super::DocumentedType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    LoadingTypes,
    Choosing,
    Creating,
    /// Service exists, waiting for the refreshed descriptor
    ResolvingDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    None,
    Changed,
    /// Create an instance of this type
    Create(String),
    Cancel,
}

#[derive(Debug, Clone)]
pub struct ServiceCreationFlow {
    row_id: RowId,
    property: String,
    service_type: String,
    stage: FlowStage,
    types: Vec<DocumentedType>,
    highlighted: usize,
    created_service: Option<String>,
}

impl ServiceCreationFlow {
    pub fn new(row_id: RowId, property: &str, service_type: &str) -> Self {
        Self {
            row_id,
            property: property.to_string(),
            service_type: service_type.to_string(),
            stage: FlowStage::LoadingTypes,
            types: Vec::new(),
            highlighted: 0,
            created_service: None,
        }
    }

    pub fn row_id(&self) -> RowId {
        self.row_id
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn stage(&self) -> FlowStage {
        self.stage
    }

    pub fn types(&self) -> &[DocumentedType] {
        &self.types
    }

    pub fn highlighted(&self) -> Option<&DocumentedType> {
        self.types.get(self.highlighted)
    }

    pub fn created_service(&self) -> Option<&str> {
        self.created_service.as_deref()
    }

    /// Types are listed by short name.
    pub fn types_loaded(&mut self, mut types: Vec<DocumentedType>) {
        types.sort_by(|a, b| a.short_name().cmp(b.short_name()));
        self.types = types;
        self.highlighted = 0;
        self.stage = FlowStage::Choosing;
    }

    pub fn creating(&mut self) {
        self.stage = FlowStage::Creating;
    }

    pub fn service_created(&mut self, service_id: &str) {
        self.created_service = Some(service_id.to_string());
        self.stage = FlowStage::ResolvingDescriptor;
    }

    /// Only the choosing stage takes input besides Esc.
    pub fn handle_key(&mut self, key: KeyEvent) -> FlowAction {
        if key.code == KeyCode::Esc {
            return FlowAction::Cancel;
        }
        if self.stage != FlowStage::Choosing || self.types.is_empty() {
            return FlowAction::None;
        }

        match key.code {
            KeyCode::Up => {
                if self.highlighted > 0 {
                    self.highlighted -= 1;
                }
                FlowAction::Changed
            }
            KeyCode::Down => {
                if self.highlighted + 1 < self.types.len() {
                    self.highlighted += 1;
                }
                FlowAction::Changed
            }
            KeyCode::Enter => match self.highlighted() {
                Some(selected) => FlowAction::Create(selected.type_name.clone()),
                None => FlowAction::None,
            },
            _ => FlowAction::None,
        }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Add Controller Service ");
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 3 {
            return;
        }

        let status = match self.stage {
            FlowStage::LoadingTypes => Some("Loading service types..."),
            FlowStage::Creating => Some("Creating service..."),
            FlowStage::ResolvingDescriptor => Some("Refreshing property..."),
            FlowStage::Choosing => None,
        };
        if let Some(status) = status {
            buf.set_string(inner.x + 1, inner.y, status, Style::default().fg(Color::DarkGray));
            return;
        }

        buf.set_string(
            inner.x,
            inner.y,
            StringUtils::ellipsis(&format!("Implementations of {}", self.service_type), inner.width as usize),
            Style::default().fg(Color::White),
        );

        // list on top, description of the highlighted type below
        let list_height = (inner.height.saturating_sub(6)).max(1);
        let first = self.highlighted.saturating_sub(list_height as usize - 1);

        for (offset, documented) in self.types.iter().enumerate().skip(first).take(list_height as usize) {
            let y = inner.y + 1 + (offset - first) as u16;
            let selected = offset == self.highlighted;
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if selected { "> " } else { "  " };
            let line = format!("{}{}", marker, documented.short_name());
            buf.set_string(inner.x, y, StringUtils::ellipsis(&line, inner.width as usize), style);
        }

        let detail_y = inner.y + 1 + list_height;
        if let Some(selected) = self.highlighted() {
            let mut detail = String::new();
            if !selected.tags.is_empty() {
                detail.push_str(&format!("Tags: {}\n", selected.tags.join(", ")));
            }
            detail.push_str(selected.description.as_deref().unwrap_or("No description"));

            let detail_area = Rect::new(
                inner.x,
                detail_y,
                inner.width,
                inner.bottom().saturating_sub(detail_y + 1),
            );
            Paragraph::new(detail)
                .style(Style::default().fg(Color::Gray))
                .wrap(Wrap { trim: true })
                .render(detail_area, buf);
        }

        buf.set_string(
            inner.x,
            inner.bottom().saturating_sub(1),
            "↑/↓: Select | Enter: Create | Esc: Cancel",
            Style::default().fg(Color::DarkGray),
        );
    }
}
