// src/table/tooltip.rs
// Descriptor and history summary for the name cell's info affordance

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    prelude::{Color, Style, Widget},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::descriptor::{PropertyDescriptor, PropertyHistory};
use crate::util::string::StringUtils;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTooltip {
    pub title: String,
    pub lines: Vec<String>,
}

impl PropertyTooltip {
    pub fn build(descriptor: &PropertyDescriptor, history: Option<&PropertyHistory>) -> Self {
        let mut lines = Vec::new();

        if let Some(description) = descriptor.description.as_deref().filter(|d| !StringUtils::is_blank(Some(d))) {
            lines.push(description.to_string());
        }
        if let Some(default) = descriptor.non_blank_default() {
            let shown = descriptor
                .find_allowable_value(default)
                .map_or(default, |allowable| allowable.display_name.as_str());
            lines.push(format!("Default value: {}", shown));
        }
        if descriptor.supports_el {
            lines.push("Supports expression language: true".to_string());
        }
        if let Some(service_type) = descriptor.identifies_controller_service.as_deref() {
            lines.push(format!(
                "Requires Controller Service: {}",
                StringUtils::substring_after_last(service_type, '.')
            ));
        }

        let previous = history.map(|h| h.previous_values.as_slice()).unwrap_or(&[]);
        if !previous.is_empty() {
            lines.push(String::new());
            lines.push("History:".to_string());
            for entry in previous {
                let value = if descriptor.sensitive {
                    "Sensitive value set"
                } else {
                    entry.previous_value.as_deref().unwrap_or("No value set")
                };
                lines.push(format!("  {} - {} ({})", value, entry.user_identity, entry.timestamp));
            }
        }

        Self {
            title: descriptor.label().to_string(),
            lines,
        }
    }

    /// Lines the body needs, without borders.
    pub fn height(&self) -> u16 {
        self.lines.len().max(1) as u16
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" {} ", self.title));

        let body = if self.lines.is_empty() {
            "No additional information".to_string()
        } else {
            self.lines.join("\n")
        };

        Paragraph::new(body)
            .block(block)
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PreviousValue;

    #[test]
    fn test_tooltip_lines() {
        let descriptor = PropertyDescriptor {
            name: "cache".into(),
            display_name: "Cache Service".into(),
            description: Some("Where results are kept".into()),
            default_value: Some("  ".into()),
            supports_el: true,
            identifies_controller_service: Some("org.example.cache.CacheClient".into()),
            ..Default::default()
        };
        let history = PropertyHistory {
            previous_values: vec![PreviousValue {
                previous_value: Some("old".into()),
                timestamp: "10/18/2026 09:00:00 UTC".into(),
                user_identity: "admin".into(),
            }],
        };

        let tooltip = PropertyTooltip::build(&descriptor, Some(&history));
        assert_eq!(tooltip.title, "Cache Service");
        assert_eq!(
            tooltip.lines,
            vec![
                "Where results are kept".to_string(),
                "Supports expression language: true".to_string(),
                "Requires Controller Service: CacheClient".to_string(),
                String::new(),
                "History:".to_string(),
                "  old - admin (10/18/2026 09:00:00 UTC)".to_string(),
            ]
        );
    }

    #[test]
    fn test_sensitive_history_is_masked() {
        let descriptor = PropertyDescriptor {
            name: "secret".into(),
            sensitive: true,
            default_value: Some("dflt".into()),
            ..Default::default()
        };
        let history = PropertyHistory {
            previous_values: vec![PreviousValue {
                previous_value: Some("hunter2".into()),
                timestamp: "t".into(),
                user_identity: "u".into(),
            }],
        };
        let tooltip = PropertyTooltip::build(&descriptor, Some(&history));
        assert!(tooltip.lines.iter().all(|line| !line.contains("hunter2")));
        assert_eq!(tooltip.lines[0], "Default value: dflt");
    }
}
