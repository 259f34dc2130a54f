//! Turn plain document text into a prompt.

pub const DEFAULT_MAX_CHARS: usize = 3000;

const TRIM_MARKER: &str = "\n\n[...trimmed...]\n\n";

/// Build a prompt from document text, with an optional leading instruction.
///
/// Whitespace runs collapse to single spaces. Text longer than `max_chars`
/// keeps `max_chars / 2` characters from each end around a trim marker, so a
/// `max_chars` below 2 keeps no document text at all, only the marker.
pub fn prepare_prompt(text: &str, instruction: Option<&str>, max_chars: usize) -> String {
    let cleaned = collapse_whitespace(text);
    let len = cleaned.chars().count();

    let doc_part = if len <= max_chars {
        cleaned
    } else {
        let keep = max_chars / 2;
        let head: String = cleaned.chars().take(keep).collect();
        let tail: String = cleaned.chars().skip(len - keep).collect();
        format!("{head}{TRIM_MARKER}{tail}")
    };

    match instruction.map(str::trim).filter(|i| !i.is_empty()) {
        Some(instruction) => format!("{instruction}\n\nDocument:\n{doc_part}"),
        None => format!("Document:\n{doc_part}"),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_document_without_instruction() {
        assert_eq!(
            prepare_prompt("  hello \n\n  world\t", None, DEFAULT_MAX_CHARS),
            "Document:\nhello world"
        );
    }

    #[test]
    fn instruction_precedes_document() {
        assert_eq!(
            prepare_prompt("body", Some("Summarize this."), DEFAULT_MAX_CHARS),
            "Summarize this.\n\nDocument:\nbody"
        );
    }

    #[test]
    fn long_document_keeps_both_ends() {
        let text = "abcdefghij";
        assert_eq!(
            prepare_prompt(text, None, 4),
            "Document:\nab\n\n[...trimmed...]\n\nij"
        );
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "ééééééé";
        let prompt = prepare_prompt(text, None, 4);
        assert_eq!(prompt, "Document:\néé\n\n[...trimmed...]\n\néé");
    }

    #[test]
    fn tiny_limit_keeps_only_marker() {
        assert_eq!(
            prepare_prompt("abcdef", None, 1),
            "Document:\n\n\n[...trimmed...]\n\n"
        );
        assert_eq!(
            prepare_prompt("abcdef", None, 0),
            "Document:\n\n\n[...trimmed...]\n\n"
        );
    }

    #[test]
    fn exact_length_is_not_trimmed() {
        assert_eq!(prepare_prompt("abcd", None, 4), "Document:\nabcd");
    }
}
