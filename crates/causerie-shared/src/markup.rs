//! Lightweight markup used in bot replies.
//!
//! Supported: `**bold**`, `*italic*`, `` `code` ``, `#`..`###` headers,
//! `- ` list items, blank-line paragraphs and single line breaks.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\s][^*]*?)\*").expect("valid regex"));
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));
static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,3})\s+(.*)$").expect("valid regex"));

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_inline(line: &str) -> String {
    let line = CODE_RE.replace_all(line, "<code>$1</code>");
    let line = BOLD_RE.replace_all(&line, "<strong>$1</strong>");
    ITALIC_RE.replace_all(&line, "<em>$1</em>").into_owned()
}

/// Render markup to HTML. The input is escaped first, so raw tags in a reply
/// never reach the output.
pub fn render_markup(text: &str) -> String {
    let escaped = escape_html(text);
    let mut html = String::new();

    for block in escaped.split("\n\n") {
        let block = block.trim_matches('\n');
        if block.trim().is_empty() {
            continue;
        }

        let mut paragraph: Vec<String> = Vec::new();
        let mut items: Vec<String> = Vec::new();

        let flush_paragraph = |paragraph: &mut Vec<String>, html: &mut String| {
            if !paragraph.is_empty() {
                html.push_str("<p>");
                html.push_str(&paragraph.join("<br>"));
                html.push_str("</p>");
                paragraph.clear();
            }
        };
        let flush_items = |items: &mut Vec<String>, html: &mut String| {
            if !items.is_empty() {
                html.push_str("<ul>");
                for item in items.drain(..) {
                    html.push_str("<li>");
                    html.push_str(&item);
                    html.push_str("</li>");
                }
                html.push_str("</ul>");
            }
        };

        for line in block.lines() {
            if let Some(caps) = HEADER_RE.captures(line) {
                flush_paragraph(&mut paragraph, &mut html);
                flush_items(&mut items, &mut html);
                let level = caps[1].len();
                html.push_str(&format!("<h{level}>{}</h{level}>", render_inline(&caps[2])));
            } else if let Some(item) = line.strip_prefix("- ") {
                flush_paragraph(&mut paragraph, &mut html);
                items.push(render_inline(item));
            } else {
                flush_items(&mut items, &mut html);
                paragraph.push(render_inline(line));
            }
        }
        flush_paragraph(&mut paragraph, &mut html);
        flush_items(&mut items, &mut html);
    }

    html
}

/// Plain-text rendering for terminals: markers removed, list items kept as
/// bullets.
pub fn strip_markup(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = match HEADER_RE.captures(line) {
                Some(caps) => caps[2].to_string(),
                None => match line.strip_prefix("- ") {
                    Some(item) => format!("• {item}"),
                    None => line.to_string(),
                },
            };
            let line = CODE_RE.replace_all(&line, "$1");
            let line = BOLD_RE.replace_all(&line, "$1");
            ITALIC_RE.replace_all(&line, "$1").into_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
