//! Plain-text preparation for report rendering: markup stripping for stored
//! clinical notes and word-wrap for flowed paragraphs.

use std::sync::LazyLock;

use regex::Regex;

static BLOCK_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(?:p|div|h[1-6]|li|ul|ol|tr|table|blockquote)\s*>|<br\s*/?>").unwrap()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Strip stored note markup down to plain text: closing block tags and line
/// breaks become newlines, every other tag is removed, entities are
/// unescaped, blank lines are dropped.
pub(crate) fn strip_markup(markup: &str) -> String {
    let broken = BLOCK_BREAK_RE.replace_all(markup, "\n");
    let stripped = TAG_RE.replace_all(&broken, "");
    unescape_entities(&stripped)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The handful of entities the note editor actually produces. `&amp;` is
/// replaced last so "&amp;lt;" stays a literal "&lt;".
fn unescape_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Simple word-wrap for flowed report text.
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
