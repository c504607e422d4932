//! Markdown cleanup passes used by the stock `transform` builders.
//!
//! Each pass is a function `&str -> String`. Fenced code blocks are left
//! untouched by every pass except the trailing newline fix.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(```|~~~)").expect("valid regex"));

/// Apply `f` to every line outside fenced code blocks.
fn map_prose_lines(md: &str, mut f: impl FnMut(&str) -> Option<String>) -> String {
    let mut in_code_block = false;
    let mut lines: Vec<String> = Vec::new();

    for line in md.lines() {
        if FENCE_RE.is_match(line) {
            in_code_block = !in_code_block;
            lines.push(line.to_string());
            continue;
        }
        if in_code_block {
            lines.push(line.to_string());
            continue;
        }
        lines.push(f(line).unwrap_or_else(|| line.to_string()));
    }

    let mut result = lines.join("\n");
    if md.ends_with('\n') {
        result.push('\n');
    }
    result
}

// ---------------------------------------------------------------------------
// Headings
// ---------------------------------------------------------------------------

/// Keep the first H1; demote any later H1 to H2.
pub fn normalize_headings(md: &str) -> String {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^#\s+(.+)$").expect("valid regex"));

    let mut seen_h1 = false;
    map_prose_lines(md, |line| {
        let caps = H1_RE.captures(line)?;
        if !seen_h1 {
            seen_h1 = true;
            return None;
        }
        Some(format!("## {}", &caps[1]))
    })
}

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

/// Collapse runs of blank prose lines into a single empty line.
pub fn clean_blank_lines(md: &str) -> String {
    let mut in_code_block = false;
    let mut blank_run = 0usize;
    let mut lines: Vec<&str> = Vec::new();

    for line in md.lines() {
        if FENCE_RE.is_match(line) {
            in_code_block = !in_code_block;
        } else if !in_code_block && line.trim().is_empty() {
            blank_run += 1;
            match blank_run {
                1 => lines.push(line),
                2 => {
                    if let Some(last) = lines.last_mut() {
                        *last = "";
                    }
                }
                _ => {}
            }
            continue;
        }
        blank_run = 0;
        lines.push(line);
    }

    let mut result = lines.join("\n");
    if md.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// Trim trailing spaces and tabs from prose lines.
pub fn strip_trailing_whitespace(md: &str) -> String {
    map_prose_lines(md, |line| {
        let trimmed = line.trim_end();
        (trimmed.len() != line.len()).then(|| trimmed.to_string())
    })
}

/// Ensure the body ends with exactly one newline.
pub fn ensure_trailing_newline(md: &str) -> String {
    let trimmed = md.trim_end_matches(['\n', '\r']);
    format!("{trimmed}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_headings_demotes_duplicate_h1() {
        let input = "# Title\n\nSome text\n\n# Another Title\n\nMore text";
        assert_eq!(
            normalize_headings(input),
            "# Title\n\nSome text\n\n## Another Title\n\nMore text"
        );
    }

    #[test]
    fn normalize_headings_ignores_code_blocks() {
        let input = "# Title\n\n```sh\n# not a heading\n```\n";
        assert_eq!(normalize_headings(input), input);
    }

    #[test]
    fn clean_blank_lines_collapses_excess() {
        assert_eq!(clean_blank_lines("Line 1\n\n\n\n\nLine 2"), "Line 1\n\nLine 2");
        assert_eq!(clean_blank_lines("Line 1\n  \n\t\nLine 2"), "Line 1\n\nLine 2");
    }

    #[test]
    fn clean_blank_lines_leaves_code_blocks_alone() {
        let input = "# T\n\n\n```py\na = 1\n\n\nb = 2\n```\n\n\nEnd\n";
        assert_eq!(
            clean_blank_lines(input),
            "# T\n\n```py\na = 1\n\n\nb = 2\n```\n\nEnd\n"
        );
    }

    #[test]
    fn clean_blank_lines_keeps_single_blank() {
        let input = "Line 1\n\nLine 2";
        assert_eq!(clean_blank_lines(input), input);
    }

    #[test]
    fn strip_trailing_whitespace_skips_code() {
        let input = "Line 1   \n```\ncode  \n```\nLine 2\t\n";
        assert_eq!(
            strip_trailing_whitespace(input),
            "Line 1\n```\ncode  \n```\nLine 2\n"
        );
    }

    #[test]
    fn ensure_trailing_newline_normalizes() {
        assert_eq!(ensure_trailing_newline("Content"), "Content\n");
        assert_eq!(ensure_trailing_newline("Content\n\n\n"), "Content\n");
    }
}
