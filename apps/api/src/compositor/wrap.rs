//! Word wrapping for page text.
//!
//! The compositor renders a fixed-width glyph grid, so wrapping is by column
//! count, not pixel measurement. All runs of whitespace (including newlines
//! inside a paragraph) collapse to single spaces before wrapping.

/// Wraps `text` into lines of at most `max_cols` characters.
///
/// Breaks at word boundaries; a single word longer than `max_cols` is
/// hard-split. Returns no empty lines.
pub fn wrap_text(text: &str, max_cols: usize) -> Vec<String> {
    assert!(max_cols > 0, "max_cols must be positive");

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;

        // Hard-split words that can never fit on one line.
        while word.chars().count() > max_cols {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split_at = word
                .char_indices()
                .nth(max_cols)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            lines.push(word[..split_at].to_string());
            word = &word[split_at..];
        }

        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > max_cols && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}
