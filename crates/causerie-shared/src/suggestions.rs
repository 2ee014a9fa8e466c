//! Follow-up question extraction from bot replies.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{MAX_SUGGESTED_QUESTIONS, MIN_SUGGESTION_CHARS};

static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-•*]|\d+[.)])\s+(.+)$").expect("valid bullet regex"));

static DECORATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*|[\[\]]").expect("valid decoration regex"));

/// Headings that introduce a list of follow-up questions.
const SECTION_KEYWORDS: &[&str] = &[
    "question",
    "suggestion",
    "pour aller plus loin",
    "vous pourriez aussi",
    "vous pourriez demander",
    "à explorer",
];

/// Up to three follow-up questions found in a bot reply, in source order.
///
/// The question block is whatever follows the last `---` line. Without a
/// separator, it is the run of lines after the first heading naming one of
/// [`SECTION_KEYWORDS`]. A heading is a `#` line, a line wrapped in `**`, or
/// a line ending with the keyword (optionally followed by `:`). Only bullet
/// or numbered lines longer than ten characters are kept.
pub fn extract_suggested_questions(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();

    let section: &[&str] = match lines.iter().rposition(|l| l.trim() == "---") {
        Some(idx) => &lines[idx + 1..],
        None => match keyword_section(&lines) {
            Some(section) => section,
            None => return Vec::new(),
        },
    };

    section
        .iter()
        .filter_map(|line| BULLET_RE.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| DECORATION_RE.replace_all(m.as_str(), "").trim().to_string())
        .filter(|q| q.chars().count() > MIN_SUGGESTION_CHARS)
        .take(MAX_SUGGESTED_QUESTIONS)
        .collect()
}

fn keyword_section<'a>(lines: &'a [&'a str]) -> Option<&'a [&'a str]> {
    let heading = lines.iter().position(|line| is_section_heading(line))?;

    let rest = &lines[heading + 1..];
    let start = rest
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(rest.len());
    let end = rest[start..]
        .iter()
        .position(|l| l.trim().is_empty())
        .map(|n| start + n)
        .unwrap_or(rest.len());
    Some(&rest[start..end])
}

fn is_section_heading(line: &str) -> bool {
    if BULLET_RE.is_match(line) {
        return false;
    }
    let lower = line.trim().to_lowercase();
    let bare = lower.trim_end_matches(|c: char| c == ':' || c.is_whitespace());
    let decorated = lower.starts_with('#') || (bare.starts_with("**") && bare.ends_with("**"));
    if decorated {
        return SECTION_KEYWORDS.iter().any(|k| lower.contains(k));
    }

    let tail = lower.trim_end_matches(|c: char| c == ':' || c == '*' || c.is_whitespace());
    let tail = tail.strip_suffix('s').unwrap_or(tail);
    SECTION_KEYWORDS.iter().any(|k| tail.ends_with(k))
}
