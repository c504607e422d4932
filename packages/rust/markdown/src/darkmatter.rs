//! Metadata gathered from the markdown body: reading metrics and the TOC.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::pipeline::{Darkmatter, TocEntry};

static CODE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^\s*(```|~~~).*?^\s*(```|~~~)").expect("valid regex"));

/// Word count, reading time, content and structure hashes for `md`.
pub fn analyze(md: &str, words_per_minute: u32) -> Darkmatter {
    let word_count = count_words(md);
    let outline = build_toc(md, 6);
    Darkmatter {
        word_count,
        time_to_read: time_to_read(word_count, words_per_minute),
        content_hash: content_hash(md),
        structure_hash: structure_hash(&outline),
        max_nesting: outline.iter().map(|e| e.level).max().unwrap_or(0),
    }
}

/// Count words outside fenced code, ignoring bare heading markers.
pub fn count_words(md: &str) -> usize {
    let without_code = CODE_BLOCK_RE.replace_all(md, "");
    without_code
        .split_whitespace()
        .filter(|w| !w.chars().all(|c| c == '#'))
        .count()
}

/// Minutes to read, rounded up; zero only for empty content.
pub fn time_to_read(word_count: usize, words_per_minute: u32) -> u32 {
    let wpm = words_per_minute.max(1) as usize;
    word_count.div_ceil(wpm) as u32
}

pub fn content_hash(md: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(md.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash of heading levels and titles, in document order.
pub fn structure_hash(toc: &[TocEntry]) -> String {
    let mut hasher = Sha256::new();
    for entry in toc {
        hasher.update([entry.level]);
        hasher.update(entry.title.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Table of contents
// ---------------------------------------------------------------------------

/// ATX headings up to `max_depth`, in document order.
pub fn build_toc(md: &str, max_depth: u8) -> Vec<TocEntry> {
    static HEADING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").expect("valid regex"));

    let without_code = CODE_BLOCK_RE.replace_all(md, "");
    let mut used: HashMap<String, usize> = HashMap::new();

    without_code
        .lines()
        .filter_map(|line| HEADING_RE.captures(line))
        .filter_map(|caps| {
            let level = caps[1].len() as u8;
            if level > max_depth {
                return None;
            }
            let title = caps[2].to_string();
            let slug = unique_slug(&slugify(&title), &mut used);
            Some(TocEntry { level, title, slug })
        })
        .collect()
}

/// Lowercase, dash-separated anchor for a heading title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

fn unique_slug(base: &str, used: &mut HashMap<String, usize>) -> String {
    let count = used.entry(base.to_string()).or_insert(0);
    *count += 1;
    match *count {
        1 => base.to_string(),
        n => format!("{base}-{}", n - 1),
    }
}
