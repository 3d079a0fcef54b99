//! Blocks introduced by an "Available tools:" style header.
//!
//! The block starts right after the header (on the same line if anything
//! follows it) and runs until a blank line or a line indented less than the
//! first block line.

use std::sync::LazyLock;

use regex::Regex;
use toolrelay_core::CapabilityDescriptor;

use super::{clean_description, clean_name};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:available|supported)\s+(?:tools|commands|functions)\s*(?::|\bare\b:?)[ \t]*")
        .expect("block header pattern")
});

/// Optional bullet or number, a name, then an optional separated description.
static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[-*•]\s+|\d+[.)]\s+)?([`'\x22]?[A-Za-z_][\w.\-/]*[`'\x22]?)\s*(?:(?:[-:–—]|=>)\s*(.*))?$",
    )
    .expect("block entry pattern")
});

static BARE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w.\-/]*$").expect("bare name pattern"));

pub(super) fn extract(output: &str) -> Vec<CapabilityDescriptor> {
    HEADER
        .find_iter(output)
        .flat_map(|header| block_lines(&output[header.end()..]))
        .flat_map(parse_line)
        .collect()
}

fn block_lines(rest: &str) -> Vec<&str> {
    let mut lines = rest.split('\n').map(|l| l.trim_end_matches('\r'));
    let mut block = Vec::new();

    if let Some(first) = lines.next() {
        if !first.trim().is_empty() {
            block.push(first);
        }
    }

    let mut indent = None;
    for line in lines {
        if line.trim().is_empty() {
            break;
        }
        let width = line.len() - line.trim_start().len();
        match indent {
            None => indent = Some(width),
            Some(base) if width < base => break,
            Some(_) => {}
        }
        block.push(line);
    }
    block
}

fn parse_line(line: &str) -> Vec<CapabilityDescriptor> {
    if let Some(caps) = ENTRY.captures(line) {
        let name = clean_name(&caps[1]);
        if name.is_empty() {
            return Vec::new();
        }
        let description = clean_description(caps.get(2).map_or("", |m| m.as_str()));
        return vec![CapabilityDescriptor::observed(name, description)];
    }

    // "Available tools: search, fetch, summarize"
    if line.contains(',') {
        let names: Vec<&str> = line.split(',').map(clean_name).collect();
        if names.iter().all(|n| BARE_NAME.is_match(n)) {
            return names
                .into_iter()
                .map(|n| CapabilityDescriptor::observed(n, clean_description("")))
                .collect();
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tools: &[CapabilityDescriptor]) -> Vec<&str> {
        tools.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_header_on_same_line() {
        let tools = extract("Available tools: foo - does foo\nbar - does bar");
        assert_eq!(names(&tools), vec!["foo", "bar"]);
        assert_eq!(tools[1].description, "does bar");
    }

    #[test]
    fn test_indented_block_ends_on_dedent() {
        let out = "Supported commands:\n  search: find things\n  fetch => get a URL\nServer ready\n";
        let tools = extract(out);
        assert_eq!(names(&tools), vec!["search", "fetch"]);
        assert_eq!(tools[1].description, "get a URL");
    }

    #[test]
    fn test_block_ends_on_blank_line() {
        let out = "Available functions are:\n- one\n\n- two\n";
        assert_eq!(names(&extract(out)), vec!["one"]);
    }

    #[test]
    fn test_prose_lines_are_ignored() {
        let out = "Available tools:\n  this line is prose\n  ok - fine\n";
        assert_eq!(names(&extract(out)), vec!["ok"]);
    }

    #[test]
    fn test_comma_separated_names() {
        let tools = extract("Available tools: search, fetch, summarize\n");
        assert_eq!(names(&tools), vec!["search", "fetch", "summarize"]);
    }

    #[test]
    fn test_no_header_no_block() {
        assert!(extract("tools:\n  foo - bar\n").is_empty());
    }
}
