//! List lines anywhere in the output.
//!
//! Recognised shapes:
//!
//! - `1. name - description` (or `1)`)
//! - `* name: description` (or `•`)
//! - `- name description`

use std::sync::LazyLock;

use regex::Regex;
use toolrelay_core::CapabilityDescriptor;

use super::{clean_description, clean_name};

static PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        r"(?m)^[ \t]*\d+[.)][ \t]+([A-Za-z_][\w.\-/]*)[ \t]+-[ \t]+(.+)$",
        r"(?m)^[ \t]*[*•][ \t]+([A-Za-z_][\w.\-/]*):[ \t]*(.+)$",
        r"(?m)^[ \t]*-[ \t]+([A-Za-z_][\w.\-/]*)[ \t]+(.+)$",
    ]
    .map(|pattern| Regex::new(pattern).expect("list pattern"))
});

pub(super) fn extract(output: &str) -> Vec<CapabilityDescriptor> {
    let mut found: Vec<(usize, CapabilityDescriptor)> = PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(output))
        .filter_map(|caps| {
            let start = caps.get(0)?.start();
            let name = clean_name(&caps[1]);
            (!name.is_empty()).then(|| {
                (
                    start,
                    CapabilityDescriptor::observed(name, clean_description(&caps[2])),
                )
            })
        })
        .collect();

    // Keep text order across the three shapes
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, tool)| tool).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_shapes_in_text_order() {
        let out = "intro\n* beta: second\n1. alpha - first\n- gamma third one\n";
        let tools = extract(out);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["beta", "alpha", "gamma"]);
        assert_eq!(tools[1].description, "first");
        assert_eq!(tools[2].description, "third one");
    }

    #[test]
    fn test_dash_separator_is_stripped() {
        let tools = extract("- fetch - download a page\r\n");
        assert_eq!(tools[0].name, "fetch");
        assert_eq!(tools[0].description, "download a page");
    }

    #[test]
    fn test_plain_text_has_no_entries() {
        assert!(extract("listening on 127.0.0.1:3000\n").is_empty());
    }
}
