// src/editor/expression.rs
// Expression language awareness for the expression editor

/// One run of editor text, either literal or inside `${ ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub expression: bool,
}

/// Split `text` into literal and expression runs. Nested braces inside an
/// expression are tracked so `${a:replace('{', '}')}` stays one run; an
/// unterminated expression runs to the end of the text. `$${` is an escaped
/// literal.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'$' {
            i += 2;
            continue;
        }
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            if literal_start < i {
                out.push(Segment { text: &text[literal_start..i], expression: false });
            }

            let start = i;
            let mut depth = 0usize;
            let mut quote: Option<u8> = None;
            i += 1;
            while i < bytes.len() {
                let b = bytes[i];
                match quote {
                    Some(q) if b == q => quote = None,
                    Some(_) => {}
                    None => match b {
                        b'\'' | b'"' => quote = Some(b),
                        b'{' => depth += 1,
                        b'}' => {
                            depth -= 1;
                            if depth == 0 {
                                i += 1;
                                break;
                            }
                        }
                        _ => {}
                    },
                }
                i += 1;
            }

            out.push(Segment { text: &text[start..i], expression: true });
            literal_start = i;
            continue;
        }
        i += 1;
    }

    if literal_start < text.len() {
        out.push(Segment { text: &text[literal_start..], expression: false });
    }
    out
}

/// Whether the text references any expression at all.
pub fn has_expression(text: &str) -> bool {
    segments(text).iter().any(|segment| segment.expression)
}
