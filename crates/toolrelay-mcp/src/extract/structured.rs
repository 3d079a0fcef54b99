//! JSON lines that carry a tool array.
//!
//! Some servers answer the discovery probes with a real listing, either at
//! the top level (`{"tools": [...]}`) or wrapped in a JSON-RPC `result`.

use serde_json::Value;
use toolrelay_core::CapabilityDescriptor;

use super::{NO_DESCRIPTION, clean_name};

const LISTING_KEYS: &[&str] = &["tools", "commands", "functions", "capabilities"];

pub(super) fn extract(output: &str) -> Vec<CapabilityDescriptor> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .flat_map(|value| listing(&value))
        .collect()
}

fn listing(value: &Value) -> Vec<CapabilityDescriptor> {
    let root = value
        .get("result")
        .filter(|result| result.is_object())
        .unwrap_or(value);

    LISTING_KEYS
        .iter()
        .find_map(|key| root.get(*key).and_then(Value::as_array))
        .map(|items| items.iter().filter_map(descriptor).collect())
        .unwrap_or_default()
}

fn descriptor(item: &Value) -> Option<CapabilityDescriptor> {
    match item {
        Value::String(name) => {
            let name = clean_name(name);
            (!name.is_empty()).then(|| CapabilityDescriptor::observed(name, NO_DESCRIPTION))
        }
        Value::Object(map) => {
            let name = clean_name(map.get("name")?.as_str()?);
            if name.is_empty() {
                return None;
            }
            let description = map
                .get("description")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or(NO_DESCRIPTION);
            Some(CapabilityDescriptor::observed(name, description))
        }
        _ => None,
    }
}
