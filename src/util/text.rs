use std::sync::LazyLock;

use regex::Regex;

/// Anything shaped like a markup tag: `<b>`, `</div>`, `<img src=x>`
static MARKUP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]*>").expect("markup pattern is valid"));

/// Collapse runs of whitespace to a single space and trim both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize single-line text (task and subtask descriptions).
///
/// Markup tags are stripped, control characters dropped, whitespace collapsed.
/// The result may be empty; callers decide whether that is acceptable.
pub fn sanitize_line(s: &str) -> String {
    let stripped = MARKUP_PATTERN.replace_all(s, "");
    let cleaned: String = stripped
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect();
    collapse_whitespace(&cleaned)
}

/// Sanitize multi-line free text (notes). Newlines and tabs survive.
pub fn sanitize_notes(s: &str) -> String {
    let stripped = MARKUP_PATTERN.replace_all(s, "");
    let cleaned: String = stripped
        .replace("\r\n", "\n")
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect();
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_whitespace_trims_and_joins() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn sanitize_line_strips_markup() {
        assert_eq!(sanitize_line("<b>Buy</b> milk"), "Buy milk");
        assert_eq!(sanitize_line("<script>alert(1)</script>"), "alert(1)");
    }

    #[test]
    fn sanitize_line_keeps_comparisons() {
        // A lone angle bracket is not a tag
        assert_eq!(sanitize_line("a < b"), "a < b");
        assert_eq!(sanitize_line("x > 3"), "x > 3");
    }

    #[test]
    fn sanitize_line_drops_control_chars() {
        assert_eq!(sanitize_line("bell\u{7}ring\nnext"), "bellring next");
    }

    #[test]
    fn sanitize_line_can_be_empty() {
        assert_eq!(sanitize_line("<br>"), "");
    }

    #[test]
    fn sanitize_notes_keeps_lines() {
        assert_eq!(
            sanitize_notes("  first line\r\n\tsecond <i>line</i>\u{0}\n"),
            "first line\n\tsecond line"
        );
    }
}
