// src/table/detail.rs
// Read-only popup with the full value of a property

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    prelude::{Color, Modifier, Style, Widget},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::descriptor::PropertyDescriptor;
use crate::editor::expression;
use crate::util::string::StringUtils;

use super::row_model::PropertyRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailContent {
    /// Every allowable value, the current one marked
    Options(Vec<(String, bool)>),
    Text { text: String, expression: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDetail {
    pub title: String,
    pub content: DetailContent,
}

impl ValueDetail {
    /// Nothing to show for unset or sensitive values.
    pub fn build(row: &PropertyRow, descriptor: Option<&PropertyDescriptor>) -> Option<Self> {
        let value = row.value.as_deref()?;
        if descriptor.map_or(false, |d| d.sensitive) {
            return None;
        }

        let content = match descriptor {
            Some(d) if d.has_allowable_values() => DetailContent::Options(
                d.allowable_values()
                    .iter()
                    .map(|entity| {
                        let allowable = &entity.allowable_value;
                        (allowable.display_name.clone(), allowable.value == value)
                    })
                    .collect(),
            ),
            _ => DetailContent::Text {
                text: value.to_string(),
                expression: descriptor.map_or(true, |d| d.supports_el),
            },
        };

        Some(Self {
            title: row.display_name.clone(),
            content,
        })
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", self.title));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = match &self.content {
            DetailContent::Options(options) => options
                .iter()
                .map(|(text, current)| {
                    let style = if *current {
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    let marker = if *current { "> " } else { "  " };
                    Line::from(Span::styled(
                        StringUtils::ellipsis(&format!("{}{}", marker, text), inner.width as usize),
                        style,
                    ))
                })
                .collect(),
            DetailContent::Text { text, expression } => text
                .split('\n')
                .map(|line| {
                    if !*expression {
                        return Line::from(Span::styled(line.to_string(), Style::default().fg(Color::White)));
                    }
                    Line::from(
                        expression::segments(line)
                            .into_iter()
                            .map(|segment| {
                                let color = if segment.expression { Color::Cyan } else { Color::White };
                                Span::styled(segment.text.to_string(), Style::default().fg(color))
                            })
                            .collect::<Vec<_>>(),
                    )
                })
                .collect(),
        };

        let body = Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1));
        Paragraph::new(lines).wrap(Wrap { trim: false }).render(body, buf);

        buf.set_string(
            inner.x,
            inner.bottom().saturating_sub(1),
            "Enter/Esc: Close",
            Style::default().fg(Color::DarkGray),
        );
    }
}
