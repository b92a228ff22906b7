//! Line splitting and short-line filtering for extracted page text.
//!
//! Line and word boundaries match Python's `str.splitlines()` and
//! `str.split()` so page text is cut the same way the agent tooling
//! downstream expects.

/// Whitespace as understood by `str.split()` / `str.strip()`: Unicode
/// White_Space plus the ASCII information separators U+001C..U+001F.
pub(crate) fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'
            | '\u{1d}'
            | '\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// Split text into lines. `\r\n` counts as one boundary and a trailing
/// boundary does not produce an empty last line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_boundary(c) {
            continue;
        }
        lines.push(&text[start..i]);
        let mut end = i + c.len_utf8();
        if c == '\r' {
            if let Some((_, '\n')) = chars.peek() {
                chars.next();
                end += 1;
            }
        }
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Number of whitespace-separated words in a line.
pub fn word_count(line: &str) -> usize {
    line.split(is_space).filter(|w| !w.is_empty()).count()
}

/// Keep only lines with more than `max_words` words, in their input
/// order, joined with `\n`.
pub fn filter_short_lines(text: &str, max_words: usize) -> String {
    split_lines(text)
        .into_iter()
        .filter(|line| word_count(line) > max_words)
        .collect::<Vec<_>>()
        .join("\n")
}
