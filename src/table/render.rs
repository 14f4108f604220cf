// src/table/render.rs
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    prelude::{Color, Modifier, Style, Widget},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::editor::choice::ChoiceEditState;
use crate::editor::expression;
use crate::editor::text::TextEditState;
use crate::editor::{CellEditor, EditorKind};
use crate::util::string::StringUtils;

use super::format::{CellStyle, INFO_AFFORDANCE_WIDTH};
use super::grid::{inner_area, CachedRow, ColumnWidths};
use super::{Dialog, Notice, PropertyTable, Severity};

/// Fixed-size rectangle centered in `r`, shrunk to fit.
fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(r.height))])
        .flex(Flex::Center)
        .areas(r);
    let [area] = Layout::horizontal([Constraint::Length(width.min(r.width))])
        .flex(Flex::Center)
        .areas(row);
    area
}

fn value_style(style: CellStyle) -> Style {
    match style {
        CellStyle::Unset | CellStyle::Sensitive | CellStyle::Blank => {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)
        }
        _ => Style::default().fg(Color::White),
    }
}

impl Widget for &PropertyTable {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.config.read_only { " Properties (read only) " } else { " Properties " };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title);
        block.render(area, buf);

        let inner = inner_area(area);
        if inner.height < 3 || inner.width < 10 {
            return;
        }

        // widths follow the last reset_table_size; format on the fly if the area moved
        let sized = self.grid.area() == area;
        let widths = if sized { self.grid.widths() } else { ColumnWidths::for_width(inner.width) };
        let ctx = self.format_context();

        let header = Style::default().fg(Color::White).add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        buf.set_string(inner.x, inner.y, "Property", header);
        buf.set_string(inner.x + widths.value_x(), inner.y, "Value", header);

        let rows = inner.height.saturating_sub(2) as usize;
        let order = self.grid.order();
        let start = self.grid.offset().min(order.len());
        let end = (start + rows).min(order.len());
        let selected = self.grid.selected_id();

        if order.is_empty() {
            buf.set_string(inner.x, inner.y + 1, "No properties", Style::default().fg(Color::DarkGray));
        }

        for (line, &id) in order[start..end].iter().enumerate() {
            let Some(row) = self.model.get_item_by_id(id) else {
                continue;
            };
            let formatted;
            let cells = match self.grid.cached(id).filter(|_| sized) {
                Some(cached) => cached,
                None => {
                    formatted = CachedRow::format(row, &self.descriptors, widths, ctx);
                    &formatted
                }
            };

            let y = inner.y + 1 + line as u16;
            let is_selected = selected == Some(id);
            let highlight = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

            let name_style = if is_selected {
                highlight
            } else if cells.name.required {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let (name_end, _) = buf.set_stringn(inner.x, y, &cells.name.text, widths.name as usize, name_style);
            if cells.name.info {
                let x = name_end.min(inner.x + widths.name.saturating_sub(INFO_AFFORDANCE_WIDTH as u16));
                buf.set_string(x, y, " ?", Style::default().fg(Color::DarkGray));
            }

            let style = if is_selected { highlight } else { value_style(cells.value.style) };
            buf.set_stringn(inner.x + widths.value_x(), y, &cells.value.text, widths.value as usize, style);

            let actions_x = inner.x + widths.actions_x();
            if cells.actions.go_to_service {
                buf.set_string(actions_x, y, "→", Style::default().fg(Color::Cyan));
            }
            if cells.actions.delete && widths.actions > 2 {
                buf.set_string(actions_x + 2, y, "✕", Style::default().fg(Color::Red));
            }
        }

        let help = if self.config.read_only {
            "↑/↓: Select | Enter: View | g: Go to service | ?: Info"
        } else if self.config.dialog_container.is_some() {
            "↑/↓: Select | Enter: Edit | a: Add | d: Delete | g: Go to service | ?: Info"
        } else {
            "↑/↓: Select | Enter: Edit | d: Delete | g: Go to service | ?: Info"
        };
        buf.set_stringn(inner.x, inner.bottom() - 1, help, inner.width as usize, Style::default().fg(Color::DarkGray));

        if let Some(editor) = &self.editor {
            let surface = editor.surface().area(area, editor.body_height());
            render_editor(editor, surface, buf);
        }

        match &self.dialog {
            Some(Dialog::AddProperty(dialog)) => dialog.render(centered_rect(50, 5, area), buf),
            Some(Dialog::CreateService(flow)) => flow.render(centered_rect(64, 18, area), buf),
            Some(Dialog::Detail(detail)) => detail.render(centered_rect(64, 14, area), buf),
            Some(Dialog::Tooltip(tooltip)) => tooltip.render(centered_rect(64, tooltip.height() + 2, area), buf),
            None => {}
        }

        if let Some(notice) = &self.notice {
            render_notice(notice, area, buf);
        }
    }
}

fn render_notice(notice: &Notice, area: Rect, buf: &mut Buffer) {
    let color = match notice.severity {
        Severity::Error => Color::Red,
        Severity::Info => Color::Cyan,
    };
    let popup = centered_rect(54, 7, area);
    Clear.render(popup, buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", notice.title));
    let inner = block.inner(popup);
    block.render(popup, buf);

    let body = Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1));
    Paragraph::new(notice.message.as_str())
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: true })
        .render(body, buf);
    buf.set_string(
        inner.x,
        inner.bottom().saturating_sub(1),
        "Press any key",
        Style::default().fg(Color::DarkGray),
    );
}

fn render_editor(editor: &CellEditor, area: Rect, buf: &mut Buffer) {
    Clear.render(area, buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", editor.display_name()));
    let inner = block.inner(area);
    block.render(area, buf);
    if inner.height < 3 {
        return;
    }

    match editor.kind() {
        EditorKind::Plain(state) => render_text(state, false, inner, buf),
        EditorKind::Expression(state) => render_text(state, true, inner, buf),
        EditorKind::Choice(state) => render_choice(state, inner, buf),
    }
}

/// Buffer with a `│` cursor, expression runs highlighted when `highlight`.
fn text_lines(state: &TextEditState, highlight: bool) -> Vec<Line<'static>> {
    let text = state.text();
    let plain = Style::default().fg(Color::Green);
    let el = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut styled: Vec<(char, Style)> = Vec::with_capacity(text.len() + 1);
    if highlight {
        for segment in expression::segments(text) {
            let style = if segment.expression { el } else { plain };
            styled.extend(segment.text.chars().map(|c| (c, style)));
        }
    } else {
        styled.extend(text.chars().map(|c| (c, plain)));
    }
    let cursor = state.cursor().min(styled.len());
    styled.insert(cursor, ('│', Style::default().fg(Color::White)));

    let mut lines = vec![Line::default()];
    for (c, style) in styled {
        if c == '\n' {
            lines.push(Line::default());
            continue;
        }
        if let Some(line) = lines.last_mut() {
            line.push_span(Span::styled(c.to_string(), style));
        }
    }
    lines
}

fn render_text(state: &TextEditState, expression: bool, area: Rect, buf: &mut Buffer) {
    let text_height = area.height.saturating_sub(2);
    let lines = text_lines(state, expression);

    // keep the line holding the cursor in view
    let cursor_line = state.text().chars().take(state.cursor()).filter(|&c| c == '\n').count();
    let scroll = cursor_line.saturating_sub(text_height.saturating_sub(1) as usize) as u16;
    let style = if state.sensitive_placeholder_active {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)
    } else {
        Style::default()
    };
    Paragraph::new(lines)
        .style(style)
        .scroll((scroll, 0))
        .render(Rect::new(area.x, area.y, area.width, text_height), buf);

    let checkbox = if state.empty_string_requested { "[x]" } else { "[ ]" };
    buf.set_string(
        area.x,
        area.bottom() - 2,
        format!("{} Set empty string (Ctrl+E)", checkbox),
        Style::default().fg(Color::White),
    );

    let help = if expression {
        "Enter: Ok | Shift+Enter: New line | Esc: Cancel"
    } else {
        "Enter: Ok | Esc: Cancel | Alt+Arrows: Move"
    };
    buf.set_stringn(area.x, area.bottom() - 1, help, area.width as usize, Style::default().fg(Color::DarkGray));
}

fn render_choice(state: &ChoiceEditState, area: Rect, buf: &mut Buffer) {
    let list_height = area.height.saturating_sub(3) as usize;
    let first = state.highlighted().saturating_sub(list_height.saturating_sub(1));

    for (offset, option) in state.options().iter().enumerate().skip(first).take(list_height) {
        let y = area.y + (offset - first) as u16;
        let mut style = if option.disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };
        if option.unset {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if offset == state.highlighted() {
            style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        }
        let marker = if offset == state.selected() { "● " } else { "  " };
        let text = StringUtils::ellipsis(&format!("{}{}", marker, option.text), area.width as usize);
        buf.set_string(area.x, y, text, style);
    }

    let description = state
        .options()
        .get(state.highlighted())
        .and_then(|option| option.description.as_deref())
        .unwrap_or("");
    buf.set_stringn(
        area.x,
        area.bottom() - 2,
        StringUtils::ellipsis(description, area.width as usize),
        area.width as usize,
        Style::default().fg(Color::Gray),
    );
    buf.set_stringn(
        area.x,
        area.bottom() - 1,
        "↑/↓: Choose | Enter: Ok | Esc: Cancel",
        area.width as usize,
        Style::default().fg(Color::DarkGray),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::{editable, table};
    use crossterm::event::{KeyCode, KeyEvent};

    fn screen(table: &PropertyTable, area: Rect) -> Vec<String> {
        let mut buf = Buffer::empty(area);
        table.render(area, &mut buf);
        buf.content()
            .chunks(area.width as usize)
            .map(|line| line.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    #[test]
    fn test_renders_rows_and_placeholders() {
        let table = table(editable());
        let lines = screen(&table, Rect::new(0, 0, 80, 20));
        let all = lines.join("\n");

        assert!(lines[0].contains("Properties"));
        assert!(lines[1].contains("Property"));
        assert!(all.contains("Batch Size"));
        assert!(all.contains("Sensitive value set"));
        assert!(!all.contains("s3cr3t"));
        assert!(all.contains("No value set"));
        assert!(all.contains("✕"));
    }

    #[test]
    fn test_only_viewport_rows_are_drawn() {
        let mut table = table(editable());
        let area = Rect::new(0, 0, 80, 6);
        table.reset_table_size(area);
        // 6 high leaves 2 row lines
        let all = screen(&table, area).join("\n");
        assert!(all.contains("Batch Size"));
        assert!(all.contains("Comment"));
        assert!(!all.contains("Retries"));
    }

    #[test]
    fn test_editor_surface_drawn_over_grid() {
        let mut table = table(editable());
        table.select_property("Comment");
        table.activate_value_cell();
        table.handle_key(KeyEvent::from(KeyCode::Char('!')));

        let all = screen(&table, Rect::new(0, 0, 80, 20)).join("\n");
        assert!(all.contains("old!│"));
        assert!(all.contains("[ ] Set empty string"));
    }

    #[test]
    fn test_notice_drawn_on_top() {
        let mut table = table(editable());
        table.add_property("Comment");
        let all = screen(&table, Rect::new(0, 0, 80, 20)).join("\n");
        assert!(all.contains("Property Exists"));
        assert!(all.contains("Press any key"));
    }

    #[test]
    fn test_expression_cursor_lines() {
        let mut state = TextEditState::load(Some("a\n${b}"), false);
        state.move_home();
        let lines = text_lines(&state, true);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].to_string(), "│a");
        assert_eq!(lines[1].to_string(), "${b}");
        assert_eq!(lines[1].spans[0].style.fg, Some(Color::Cyan));
    }

    #[test]
    fn test_centered_rect_fits() {
        let r = centered_rect(50, 5, Rect::new(0, 0, 80, 20));
        assert_eq!((r.width, r.height), (50, 5));
        assert_eq!(r.x, 15);
        let small = centered_rect(50, 5, Rect::new(0, 0, 20, 3));
        assert_eq!((small.width, small.height), (20, 3));
    }
}
