//! LRC parser.
//!
//! ```text
//! [00:12.34]Hello world
//! [00:15.00][01:20.5]A line sung twice
//! ```
//!
//! Every time tag on a line yields one entry sharing the text after the last tag. Lines
//! without tags, comment lines (`//`) and lines whose text is empty are dropped.

use once_cell::sync::Lazy;
use regex::Regex;

/// Shown when a document has no usable lines.
pub const PLACEHOLDER: &str = "no lyrics";

static TIME_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{1,2}):(\d{2})(?:[.:](\d{1,3}))?\]").expect("time tag regex"));

// Real newlines plus their escaped spellings, which some payloads carry as text.
static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r\n|\n|\r|\\r\\n|\\n|\\r").expect("line break regex"));

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").expect("bracket regex"));

/// A single line of lyrics with timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    /// Timestamp in milliseconds from start
    pub time_ms: u64,
    pub text: String,
}

impl LyricLine {
    pub fn new(time_ms: u64, text: impl Into<String>) -> Self {
        Self {
            time_ms,
            text: text.into(),
        }
    }

    pub fn seconds(&self) -> f64 {
        self.time_ms as f64 / 1000.0
    }
}

/// Parse a document into lines sorted by time. Ties keep document order.
pub fn parse_lrc(content: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();

    for raw in LINE_BREAK.split(content) {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let tags: Vec<_> = TIME_TAG.captures_iter(line).collect();
        let Some(last) = tags.last() else {
            continue;
        };
        let Some(whole) = last.get(0) else {
            continue;
        };
        let text = BRACKETED.replace_all(line[whole.end()..].trim(), "");
        let text = text.trim();
        if text.is_empty() || text.starts_with("//") {
            continue;
        }

        for caps in &tags {
            let min: u64 = caps[1].parse().unwrap_or(0);
            let sec: u64 = caps[2].parse().unwrap_or(0);
            let frac = caps.get(3).map_or(0, |m| fraction_ms(m.as_str()));
            lines.push(LyricLine::new((min * 60 + sec) * 1000 + frac, text));
        }
    }

    lines.sort_by_key(|l| l.time_ms);
    lines
}

/// Like [`parse_lrc`], but never empty.
pub fn parse_or_placeholder(content: &str) -> Vec<LyricLine> {
    let lines = parse_lrc(content);
    if lines.is_empty() {
        vec![LyricLine::new(0, PLACEHOLDER)]
    } else {
        lines
    }
}

/// `.5` is 500 ms, `.50` is 500 ms, `.500` is 500 ms.
fn fraction_ms(digits: &str) -> u64 {
    let n: u64 = digits.parse().unwrap_or(0);
    match digits.len() {
        1 => n * 100,
        2 => n * 10,
        _ => n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_tag_line_yields_one_entry_per_tag() {
        let lines = parse_lrc("[00:01.50][00:03.00]Hello");
        assert_eq!(
            lines,
            vec![LyricLine::new(1500, "Hello"), LyricLine::new(3000, "Hello")]
        );
        assert_eq!(lines[0].seconds(), 1.5);
    }

    #[test]
    fn fraction_scales_by_digit_count() {
        let lines = parse_lrc("[00:01.5]a\n[00:02.05]b\n[00:03.005]c\n[00:04:25]d\n[01:00]e");
        let times: Vec<u64> = lines.iter().map(|l| l.time_ms).collect();
        assert_eq!(times, vec![1500, 2050, 3005, 4250, 60_000]);
    }

    #[test]
    fn sorts_stably() {
        let lines = parse_lrc("[00:05.00]late\n[00:01.00]first\n[00:01.00]second");
        let text: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(text, vec!["first", "second", "late"]);
    }

    #[test]
    fn drops_untimed_comment_and_empty_lines() {
        let doc = "[ti:Title]\n// comment [00:01.00]x\nplain text\n[00:02.00]   \n[00:03.00]kept";
        assert_eq!(parse_lrc(doc), vec![LyricLine::new(3000, "kept")]);
    }

    #[test]
    fn strips_bracketed_residue() {
        let lines = parse_lrc("[00:01.00]Hello [inline] world");
        assert_eq!(lines[0].text, "Hello  world");
        assert!(parse_lrc("[00:01.00][by:someone]").is_empty());
    }

    #[test]
    fn splits_on_every_newline_spelling() {
        let doc = "[00:01.00]a\r\n[00:02.00]b\r[00:03.00]c\\n[00:04.00]d\\r\\n[00:05.00]e";
        let lines = parse_lrc(doc);
        let text: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(text, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn empty_document_gets_placeholder() {
        assert_eq!(parse_or_placeholder(""), vec![LyricLine::new(0, PLACEHOLDER)]);
        assert_eq!(parse_or_placeholder("// only\n// comments"), vec![LyricLine::new(0, PLACEHOLDER)]);
        assert_eq!(parse_or_placeholder("[00:01]x").len(), 1);
    }

    #[test]
    fn parsing_is_deterministic() {
        let doc = "[00:02.00]b\n[00:01.00][00:03.00]a";
        assert_eq!(parse_lrc(doc), parse_lrc(doc));
    }
}
