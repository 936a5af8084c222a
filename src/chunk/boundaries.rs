//! Separator handling for the recursive splitter

/// Separators tried in order: paragraphs, lines, words, characters
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Length in characters, which is how chunk sizes are measured
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` on `separator`, keeping each separator at the start of the
/// piece that follows it. An empty separator splits into characters.
/// Empty pieces are dropped.
pub fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

/// Pick the first separator that occurs in `text`; the empty separator
/// always matches. Returns its index into `separators`.
pub fn select_separator(text: &str, separators: &[String]) -> usize {
    separators
        .iter()
        .position(|s| s.is_empty() || text.contains(s.as_str()))
        .unwrap_or(separators.len().saturating_sub(1))
}
