//! `"name": description` fragments, typically from JSON-ish help output.

use std::sync::LazyLock;

use regex::Regex;
use toolrelay_core::CapabilityDescriptor;

use super::{clean_description, clean_name};

static QUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""([A-Za-z_][\w.\-/]*)"[ \t]*[:\-][ \t]*(?:"((?:[^"\\\n]|\\.)*)"|([^\s,{}\[\]"][^,{}\[\]\n]*))"#,
    )
    .expect("quoted key pattern")
});

/// Protocol and schema keys that are never tool names.
const STRUCTURAL_KEYS: &[&str] = &[
    "arguments",
    "capabilities",
    "code",
    "command",
    "commands",
    "content",
    "data",
    "description",
    "error",
    "functions",
    "id",
    "jsonrpc",
    "message",
    "method",
    "name",
    "params",
    "protocolVersion",
    "required",
    "result",
    "status",
    "text",
    "title",
    "tools",
    "type",
    "version",
];

pub(super) fn extract(output: &str) -> Vec<CapabilityDescriptor> {
    QUOTED_KEY
        .captures_iter(output)
        .filter_map(|caps| {
            let name = clean_name(&caps[1]);
            if name.is_empty() || STRUCTURAL_KEYS.contains(&name) {
                return None;
            }
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str().trim());
            if is_scalar_literal(value) {
                return None;
            }
            Some(CapabilityDescriptor::observed(name, clean_description(value)))
        })
        .collect()
}

/// Numbers and JSON keywords say nothing about a tool.
fn is_scalar_literal(value: &str) -> bool {
    value.is_empty()
        || matches!(value, "true" | "false" | "null")
        || value.parse::<f64>().is_ok()
}
