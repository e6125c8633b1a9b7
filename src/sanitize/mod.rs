use serde::{Serialize, Serializer};

/// Escapes text for insertion into markup. Only `&`, `<`, `>` and `"` are rewritten.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_opt(value: Option<&str>) -> String {
    value.map(escape).unwrap_or_default()
}

/// A table cell ready for markup. The source text is kept next to its
/// escaped form; `Display` and `as_str` only ever yield the escaped one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Markup {
    text: String,
    html: String,
}

impl Markup {
    pub fn escape(value: &str) -> Self {
        Self {
            text: value.to_string(),
            html: escape(value),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    // unescaped, for plain-text surfaces
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Serialize for Markup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl std::fmt::Display for Markup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.html)
    }
}
