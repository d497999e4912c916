//! Small text helpers shared by the structurer and the rule engine.

use std::sync::LazyLock;

use regex::Regex;

/// Lower-case `label` and collapse every run of non-alphanumeric characters
/// into one `_`, trimming underscores at both ends.
///
/// Letters outside ASCII (umlauts, ß) are kept.
pub fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_sep = false;

    for c in label.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Remove `( ... )` asides and trim.
pub fn strip_parentheticals(text: &str) -> String {
    static PAREN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\(.*?\)").expect("valid regex"));

    PAREN_RE.replace_all(text, "").trim().to_string()
}
