//! Whitespace normalization and counting helpers shared by the pipeline.

/// Collapse whitespace runs while keeping paragraph structure: inner runs of
/// spaces/tabs become a single space, consecutive blank lines become one, and
/// the ends are trimmed. Idempotent.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;
    for raw_line in text.lines() {
        let line = collapse_inline(raw_line);
        if line.is_empty() {
            pending_blank = true;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        pending_blank = false;
        out.push_str(&line);
    }
    out
}

fn collapse_inline(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut pending_space = false;
    for ch in line.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Word count by whitespace split, matching the returned `wordCount` field.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Length in Unicode scalar values. All extraction thresholds are measured in
/// chars, not bytes, so CJK text is not over-counted threefold.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::{char_len, normalize_whitespace, word_count};

    #[test]
    fn collapses_runs_and_trims() {
        let input = "  first   line\t\n\n\n\n second\u{3000}line  \n";
        assert_eq!(normalize_whitespace(input), "first line\n\nsecond line");
    }

    #[test]
    fn normalization_is_idempotent() {
        let input = "a  b\n\n\nc\td ";
        let once = normalize_whitespace(input);
        assert_eq!(normalize_whitespace(&once), once);
    }

    #[test]
    fn counts_words_by_whitespace() {
        assert_eq!(word_count("one two\nthree"), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn char_len_counts_scalars_not_bytes() {
        assert_eq!(char_len("第一章"), 3);
        assert_eq!("第一章".len(), 9);
    }
}
