//! Capability extraction from unstructured tool server output.
//!
//! Tool servers expose no standard introspection protocol, so capabilities
//! are salvaged from whatever they print: startup banners, help text, log
//! lines and any answers to the discovery probes. Extraction is a pure
//! function of the server name and the captured text.
//!
//! Layers run in order and are merged with name deduplication:
//!
//! 1. `structured` - JSON lines carrying a tool array
//! 2. `block` - "Available tools:" style blocks
//! 3. `list` - numbered, starred and dashed list lines
//! 4. `quoted` - `"name": description` fragments
//!
//! If none of these find anything, a single placeholder named after the
//! server is added. Then, regardless, the curated `vendor` catalogs and the
//! generic `keywords` contribute `inferred` descriptors.

use std::collections::HashSet;

use toolrelay_core::CapabilityDescriptor;
use tracing::debug;

mod block;
mod keywords;
mod list;
mod quoted;
mod structured;
mod vendor;

/// Description used when a listing names a tool without describing it.
pub(crate) const NO_DESCRIPTION: &str = "No description provided";

/// Description of the placeholder returned when nothing was recognised.
pub const PLACEHOLDER_DESCRIPTION: &str =
    "Tool server is running, but no capability listing was found in its output";

type Layer = fn(&str) -> Vec<CapabilityDescriptor>;

/// Layers reading capabilities the server itself reported.
const OBSERVED_LAYERS: &[(&str, Layer)] = &[
    ("structured", structured::extract),
    ("block", block::extract),
    ("list", list::extract),
    ("quoted", quoted::extract),
];

/// Infer the capabilities of `server_name` from its captured `output`.
///
/// Every returned descriptor is stamped with `server_name`. The result is
/// never empty.
pub fn extract(server_name: &str, output: &str) -> Vec<CapabilityDescriptor> {
    let mut set = DescriptorSet::default();

    for (layer, run) in OBSERVED_LAYERS {
        let added = set.extend_exact(run(output));
        if added > 0 {
            debug!(server_name = %server_name, layer, added, "Capabilities found in output");
        }
    }

    if set.is_empty() {
        set.push_exact(CapabilityDescriptor::observed(
            server_name,
            PLACEHOLDER_DESCRIPTION,
        ));
    }

    set.extend_exact(vendor::curated_for(server_name));
    set.extend_case_insensitive(keywords::infer(output));

    set.into_vec()
        .into_iter()
        .map(|tool| tool.for_server(server_name))
        .collect()
}

/// Ordered descriptor list with name deduplication.
#[derive(Default)]
struct DescriptorSet {
    tools: Vec<CapabilityDescriptor>,
    names: HashSet<String>,
    folded: HashSet<String>,
}

impl DescriptorSet {
    fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn insert(&mut self, tool: CapabilityDescriptor) {
        self.folded.insert(tool.name.to_lowercase());
        self.names.insert(tool.name.clone());
        self.tools.push(tool);
    }

    /// Add unless an entry with exactly this name exists.
    fn push_exact(&mut self, tool: CapabilityDescriptor) -> bool {
        if self.names.contains(&tool.name) {
            return false;
        }
        self.insert(tool);
        true
    }

    fn extend_exact(&mut self, tools: Vec<CapabilityDescriptor>) -> usize {
        let mut added = 0;
        for tool in tools {
            if self.push_exact(tool) {
                added += 1;
            }
        }
        added
    }

    /// Add each tool unless a name matching case-insensitively exists.
    fn extend_case_insensitive(&mut self, tools: Vec<CapabilityDescriptor>) {
        for tool in tools {
            if !self.folded.contains(&tool.name.to_lowercase()) {
                self.insert(tool);
            }
        }
    }

    fn into_vec(self) -> Vec<CapabilityDescriptor> {
        self.tools
    }
}

/// Whether `tool` is the stand-in returned when nothing was recognised.
pub fn is_placeholder(tool: &CapabilityDescriptor) -> bool {
    !tool.inferred && !tool.error && tool.description == PLACEHOLDER_DESCRIPTION
}

/// Trim a candidate name and drop decoration a listing may wrap it in.
pub(crate) fn clean_name(raw: &str) -> &str {
    raw.trim()
        .trim_end_matches(['.', ':'])
        .trim_matches(|c| matches!(c, '`' | '"' | '\'' | '*'))
}

/// Trim a candidate description, falling back to [`NO_DESCRIPTION`].
pub(crate) fn clean_description(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_start_matches(['-', ':', '–', '—'])
        .trim();
    if trimmed.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        trimmed.to_string()
    }
}
