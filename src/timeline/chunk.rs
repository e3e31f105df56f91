//! Word-preserving text chunking.

/// Greedy word wrap by character count.
///
/// Words are never split; a word longer than `max_chars` becomes its own line. Whitespace runs
/// collapse to one space. Empty input yields an empty list.
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let wlen = word.chars().count();
        if current_len == 0 {
            current.push_str(word);
            current_len = wlen;
        } else if current_len + 1 + wlen <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + wlen;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = wlen;
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Split narration body text into subtitle chunks of at most `max_chars` characters.
///
/// Never returns an empty list: text without words yields a single `" "` chunk, so proportional
/// allocation always has a non-zero denominator.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let chunks = wrap_words(text, max_chars);
    if chunks.is_empty() {
        vec![" ".to_owned()]
    } else {
        chunks
    }
}

/// Return `true` for tokens a speech recognizer reports as words (any alphanumeric character).
pub fn is_spoken(token: &str) -> bool {
    token.chars().any(char::is_alphanumeric)
}

/// Number of spoken words; punctuation-only tokens such as `-` or `...` are not counted.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().filter(|t| is_spoken(t)).count()
}

/// Spoken words in order, each carrying the punctuation-only tokens around it.
///
/// Punctuation attaches to the preceding word, or to the first word when nothing precedes it.
/// The result has exactly [`word_count`] entries.
pub fn spoken_words(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut leading: Vec<&str> = Vec::new();
    for token in text.split_whitespace() {
        if is_spoken(token) {
            let mut word = leading.join(" ");
            if !word.is_empty() {
                word.push(' ');
            }
            word.push_str(token);
            leading.clear();
            out.push(word);
        } else if let Some(prev) = out.last_mut() {
            prev.push(' ');
            prev.push_str(token);
        } else {
            leading.push(token);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/chunk.rs"]
mod tests;
