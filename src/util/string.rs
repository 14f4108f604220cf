use unicode_width::UnicodeWidthChar;

pub struct StringUtils {}

impl StringUtils {
    /// `None`, empty and whitespace-only strings are blank.
    pub fn is_blank(value: Option<&str>) -> bool {
        value.map_or(true, |s| s.trim().is_empty())
    }

    /// Text after the last occurrence of `separator`, or the whole string.
    pub fn substring_after_last(value: &str, separator: char) -> &str {
        match value.rfind(separator) {
            Some(idx) => &value[idx + separator.len_utf8()..],
            None => value,
        }
    }

    /// Truncates to `width` terminal columns, ending in `…` when shortened.
    /// Line breaks are flattened so a cell never spans rows.
    pub fn ellipsis(value: &str, width: usize) -> String {
        let flat: String = value
            .chars()
            .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
            .collect();

        let total: usize = flat.chars().map(|c| c.width().unwrap_or(0)).sum();
        if total <= width {
            return flat;
        }
        if width == 0 {
            return String::new();
        }

        let mut out = String::new();
        let mut used = 0;
        for c in flat.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width - 1 {
                break;
            }
            out.push(c);
            used += w;
        }
        out.push('…');
        out
    }
}
