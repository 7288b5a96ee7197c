use crate::review::{Fire, Fragment};
use regex::Regex;
use std::sync::OnceLock;

// ── Markup conventions ──
//
// Report and source fragments are opaque server markup except for a small
// set of data attributes and marker classes:
//   file-container / data-file-id  — per-file excerpt container
//   data-start / data-end          — displayed [start, end) line range
//   data-prev-match / data-next-match — neighbouring match bounds
//   hash-<hex>                     — match-group identity of a line
//   data-snippet                   — snippet identity of a code cell
//   data-name                      — file name of a container
//   data-packname                  — package name the report belongs to
//   risk-9                         — unresolved-risk highlight
//   fa-fire                        — flagged (fire) marker
//   d-none                         — collapsed container

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

macro_rules! static_re {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static CELL: OnceLock<Regex> = OnceLock::new();
            re(&CELL, $pattern)
        }
    };
}

static_re!(re_file_id, r#"data-file-id=["']?(\d+)"#);
static_re!(re_start, r#"data-start=["']?(\d+)"#);
static_re!(re_end, r#"data-end=["']?(\d+)"#);
static_re!(re_prev_match, r#"data-prev-match=["']?(\d+)"#);
static_re!(re_next_match, r#"data-next-match=["']?(\d+)"#);
static_re!(re_hash, r#"hash-([0-9a-fA-F]+)"#);
static_re!(re_snippet, r#"data-snippet=["']?(\d+)"#);
static_re!(re_name, r#"data-name=["']([^"']+)"#);
static_re!(re_packname, r#"data-packname=["']([^"']+)"#);
static_re!(re_linenumber, r#"class=["']?linenumber["']?[^>]*>\s*(\d+)"#);
static_re!(re_linenumber_cell, r#"<td[^>]*linenumber[^>]*>\s*\d+\s*</td>"#);
static_re!(re_tag, r"<[^>]*>");

fn capture_number(regex: &Regex, line: &str) -> Option<usize> {
    regex
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn capture_str(regex: &Regex, line: &str) -> Option<String> {
    regex
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Replace markup tags with nothing and decode the handful of entities the
/// server emits, leaving display text.
pub fn strip_tags(markup: &str) -> String {
    let text = re_tag().replace_all(markup, "");
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

// ── Parsed model ──

/// One rendered source line with its marker metadata.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
    pub hash: Option<String>,
    pub snippet: Option<i64>,
    pub risk: bool,
    pub fire: bool,
}

/// A per-file excerpt container inside a report fragment.
#[derive(Debug, Clone)]
pub struct FileContainer {
    pub file_id: i64,
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub prev_match: Option<usize>,
    pub next_match: Option<usize>,
    pub collapsed: bool,
    pub lines: Vec<SourceLine>,
}

/// A parsed report fragment: the ordered file containers it carries.
#[derive(Debug, Clone, Default)]
pub struct ReportDoc {
    pub files: Vec<FileContainer>,
    pub package_name: Option<String>,
}

impl ReportDoc {
    /// Scan a report fragment. Unknown markup is ignored, missing
    /// attributes get defaults.
    pub fn parse(fragment: &str) -> ReportDoc {
        let mut doc = ReportDoc::default();
        for raw in fragment.lines() {
            if doc.package_name.is_none() {
                doc.package_name = capture_str(re_packname(), raw);
            }
            if raw.contains("file-container") {
                doc.files.push(FileContainer {
                    file_id: capture_number(re_file_id(), raw).unwrap_or(0) as i64,
                    name: capture_str(re_name(), raw).unwrap_or_default(),
                    start: capture_number(re_start(), raw).unwrap_or(1),
                    end: capture_number(re_end(), raw).unwrap_or(1),
                    prev_match: None,
                    next_match: None,
                    collapsed: raw.contains("d-none"),
                    lines: Vec::new(),
                });
                continue;
            }
            let Some(current) = doc.files.last_mut() else {
                continue;
            };
            if current.name.is_empty() {
                if let Some(name) = capture_str(re_name(), raw) {
                    current.name = name;
                }
            }
            // Action bars carry the extension bounds and match context
            if raw.contains("data-start") || raw.contains("data-prev-match") || raw.contains("data-next-match") {
                if let Some(start) = capture_number(re_start(), raw) {
                    current.start = start;
                }
                if let Some(end) = capture_number(re_end(), raw) {
                    current.end = end;
                }
                if let Some(prev) = capture_number(re_prev_match(), raw) {
                    current.prev_match = Some(prev);
                }
                if let Some(next) = capture_number(re_next_match(), raw) {
                    current.next_match = Some(next);
                }
                continue;
            }
            if let Some(line) = parse_source_line(raw, current.start + current.lines.len()) {
                current.lines.push(line);
            }
        }
        doc
    }

    /// Flagged markers in document order, for the navigator.
    pub fn fires(&self) -> Vec<Fire> {
        let mut fires = Vec::new();
        for file in &self.files {
            for line in &file.lines {
                if line.fire {
                    fires.push(Fire {
                        file_id: file.file_id,
                        line: line.number,
                        hash: line.hash.clone().unwrap_or_default(),
                        snippet_id: line.snippet,
                        active: true,
                    });
                }
            }
        }
        fires
    }

    pub fn file(&self, file_id: i64) -> Option<&FileContainer> {
        self.files.iter().find(|f| f.file_id == file_id)
    }

    pub fn file_mut(&mut self, file_id: i64) -> Option<&mut FileContainer> {
        self.files.iter_mut().find(|f| f.file_id == file_id)
    }

    /// Text fragments of one container, for pattern drafting.
    pub fn fragments(&self, file_id: i64) -> Vec<Fragment> {
        self.file(file_id)
            .map(|f| {
                f.lines
                    .iter()
                    .map(|line| Fragment {
                        snippet_id: line.snippet,
                        text: line.text.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop the risk highlight on every line sharing a hash (the server did
    /// the same on its side via add_ignore / snippet decision).
    pub fn clear_risk(&mut self, hash: &str) {
        for file in &mut self.files {
            for line in &mut file.lines {
                if line.hash.as_deref() == Some(hash) {
                    line.risk = false;
                    line.fire = false;
                }
            }
        }
    }
}

/// Parse one marked-up source line. Lines without a line number and without
/// any marker metadata are layout noise and yield None.
fn parse_source_line(raw: &str, fallback_number: usize) -> Option<SourceLine> {
    let number = capture_number(re_linenumber(), raw);
    let hash = re_hash()
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let snippet = capture_number(re_snippet(), raw).map(|n| n as i64);
    let fire = raw.contains("fa-fire");
    let risk = raw.contains("risk-9");
    if number.is_none() && hash.is_none() && snippet.is_none() && !fire {
        return None;
    }
    // The line-number gutter cell is chrome, not source text
    let without_gutter = re_linenumber_cell().replace(raw, "");
    Some(SourceLine {
        number: number.unwrap_or(fallback_number),
        text: strip_tags(&without_gutter).trim_end().to_string(),
        hash,
        snippet,
        risk,
        fire,
    })
}

/// Parse a standalone source fragment (fetch_source response) into lines,
/// numbering from `start` when the markup carries no explicit numbers.
pub fn parse_source_lines(fragment: &str, start: usize) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    for raw in fragment.lines() {
        if let Some(line) = parse_source_line(raw, start + lines.len()) {
            lines.push(line);
        } else if !strip_tags(raw).trim().is_empty() {
            // Plain rendered line without marker metadata
            lines.push(SourceLine {
                number: start + lines.len(),
                text: strip_tags(raw).trim_end().to_string(),
                hash: None,
                snippet: None,
                risk: false,
                fire: false,
            });
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = r#"
<a class="ignore-link" data-packname="libfoo" data-hash="abc123">ignore</a>
<div class="file-container" data-file-id="42" data-name="COPYING">
<div class="actions" data-start="10" data-end="14" data-prev-match="3" data-next-match="55"></div>
<tr class="hash-abc123 risk-9"><td class="linenumber">10</td><td class="code" data-snippet="7"><i class="fa-fire"></i>Permission is hereby granted</td></tr>
<tr class="hash-abc123 risk-9"><td class="linenumber">11</td><td class="code" data-snippet="7">free of charge</td></tr>
<tr><td class="linenumber">12</td><td class="code">int main() {</td></tr>
<div class="file-container d-none" data-file-id="43">
<div class="actions" data-start="1" data-end="1"></div>
"#;

    #[test]
    fn parses_containers_with_bounds() {
        let doc = ReportDoc::parse(FRAGMENT);
        assert_eq!(doc.files.len(), 2);
        let first = &doc.files[0];
        assert_eq!(first.file_id, 42);
        assert_eq!(first.name, "COPYING");
        assert_eq!((first.start, first.end), (10, 14));
        assert_eq!(first.prev_match, Some(3));
        assert_eq!(first.next_match, Some(55));
        assert!(!first.collapsed);
        assert!(doc.files[1].collapsed);
    }

    #[test]
    fn parses_line_markers() {
        let doc = ReportDoc::parse(FRAGMENT);
        let lines = &doc.files[0].lines;
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].number, 10);
        assert_eq!(lines[0].hash.as_deref(), Some("abc123"));
        assert_eq!(lines[0].snippet, Some(7));
        assert!(lines[0].fire);
        assert!(lines[0].risk);
        assert!(!lines[1].fire);
        assert_eq!(lines[2].hash, None);
        assert_eq!(lines[0].text, "Permission is hereby granted");
    }

    #[test]
    fn package_name_comes_from_packname_attribute() {
        let doc = ReportDoc::parse(FRAGMENT);
        assert_eq!(doc.package_name.as_deref(), Some("libfoo"));
        assert_eq!(ReportDoc::parse("<div></div>").package_name, None);
    }

    #[test]
    fn container_name_may_follow_the_opening_tag() {
        let markup = "<div class=\"file-container\" data-file-id=\"7\">\n\
                      <a class=\"file-link\" data-name=\"src/lib.c\">src/lib.c</a>";
        let doc = ReportDoc::parse(markup);
        assert_eq!(doc.files[0].name, "src/lib.c");
    }

    #[test]
    fn fires_are_extracted_in_order() {
        let doc = ReportDoc::parse(FRAGMENT);
        let fires = doc.fires();
        assert_eq!(fires.len(), 1);
        assert_eq!(fires[0].file_id, 42);
        assert_eq!(fires[0].line, 10);
        assert_eq!(fires[0].hash, "abc123");
    }

    #[test]
    fn clear_risk_drops_group_markers() {
        let mut doc = ReportDoc::parse(FRAGMENT);
        doc.clear_risk("abc123");
        assert!(doc.files[0].lines.iter().all(|l| !l.risk && !l.fire));
    }

    #[test]
    fn strip_tags_removes_markup_and_entities() {
        assert_eq!(strip_tags("<b>if (a &lt; b)</b>"), "if (a < b)");
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn source_lines_number_from_start() {
        let lines = parse_source_lines("<pre>line one</pre>\n<pre>line two</pre>", 9);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 9);
        assert_eq!(lines[1].number, 10);
        assert_eq!(lines[0].text, "line one");
    }
}
