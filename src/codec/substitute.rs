//! Word-boundary-safe substitution.
//!
//! A key only matches where the characters on both sides of the occurrence
//! are non-word characters or string edges. A word character is a Unicode
//! alphanumeric or `_`. This keeps `class` from matching inside `subclass`
//! while still letting keys that start or end with punctuation (`C++`,
//! `WF:`) match when followed by a space.

/// Whether `c` counts as part of a word.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Check the characters around `text[start..end]`.
fn is_bounded(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
    let after_ok = text[end..].chars().next().map_or(true, |c| !is_word_char(c));
    before_ok && after_ok
}

/// Replace every bounded occurrence of `key` in `text` with `replacement`.
///
/// Occurrences are consumed left to right without overlap. An occurrence
/// rejected by the boundary check does not consume input, so a later
/// overlapping occurrence can still match.
pub fn replace_bounded(text: &str, key: &str, replacement: &str) -> String {
    if key.is_empty() || text.len() < key.len() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(key) {
        let start = cursor + offset;
        let end = start + key.len();

        if is_bounded(text, start, end) {
            out.push_str(&text[copied..start]);
            out.push_str(replacement);
            copied = end;
            cursor = end;
        } else {
            // Step past the first char of the rejected occurrence.
            let step = text[start..].chars().next().map_or(1, char::len_utf8);
            cursor = start + step;
        }

        if cursor >= text.len() {
            break;
        }
    }

    out.push_str(&text[copied..]);
    out
}

/// Apply an ordered mapping to `text`, one pass per entry.
///
/// Entries are expected longest-key first; each pass sees the output of
/// the previous one.
pub fn apply<K, V>(text: &str, entries: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    entries.iter().fold(text.to_string(), |working, (key, value)| {
        replace_bounded(&working, key.as_ref(), value.as_ref())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_word_replaced() {
        assert_eq!(replace_bounded("a class here", "class", "cls"), "a cls here");
        assert_eq!(replace_bounded("class", "class", "cls"), "cls");
    }

    #[test]
    fn test_partial_words_untouched() {
        assert_eq!(replace_bounded("subclass", "class", "cls"), "subclass");
        assert_eq!(
            replace_bounded("classification", "class", "cls"),
            "classification"
        );
        assert_eq!(replace_bounded("my_class", "class", "cls"), "my_class");
    }

    #[test]
    fn test_punctuation_neighbours_are_boundaries() {
        assert_eq!(replace_bounded("(class).", "class", "cls"), "(cls).");
        assert_eq!(replace_bounded("class,class", "class", "cls"), "cls,cls");
    }

    #[test]
    fn test_keys_with_symbol_edges() {
        assert_eq!(replace_bounded("C++ code", "C++", "CPP"), "CPP code");
        assert_eq!(replace_bounded("WF: to sort", "WF:", "Write a function"), "Write a function to sort");
        assert_eq!(replace_bounded("xWF:", "WF:", "Write a function"), "xWF:");
    }

    #[test]
    fn test_rejected_occurrence_does_not_hide_next() {
        // First "Go" sits inside "GoGo"; the standalone one still matches.
        assert_eq!(replace_bounded("GoGo Go", "Go", "GO"), "GoGo GO");
    }

    #[test]
    fn test_unicode_neighbours() {
        assert_eq!(replace_bounded("éclass", "class", "cls"), "éclass");
        assert_eq!(replace_bounded("→class←", "class", "cls"), "→cls←");
    }

    #[test]
    fn test_empty_key_is_noop() {
        assert_eq!(replace_bounded("text", "", "x"), "text");
    }

    #[test]
    fn test_apply_runs_entries_in_order() {
        let entries = [("Write a function", "WF:"), ("function", "fn")];
        assert_eq!(
            apply("Write a function that calls a function", &entries),
            "WF: that calls a fn"
        );
    }
}
