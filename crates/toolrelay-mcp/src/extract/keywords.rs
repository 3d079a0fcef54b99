//! Generic capability keywords.
//!
//! A keyword appearing as a whole word anywhere in the output (any case)
//! yields an inferred descriptor named after it in title case.

use std::sync::LazyLock;

use regex::Regex;
use toolrelay_core::CapabilityDescriptor;

const KEYWORDS: &[(&str, &str)] = &[
    ("search", "Search for information"),
    ("browser", "Control a web browser"),
    ("fetch", "Fetch content from a URL"),
    ("scrape", "Extract content from web pages"),
    ("weather", "Get weather information"),
    ("translate", "Translate text between languages"),
    ("calculator", "Evaluate arithmetic expressions"),
    ("calendar", "Read and manage calendar events"),
    ("email", "Read and send email"),
    ("filesystem", "Read and write local files"),
    ("database", "Query a database"),
    ("sql", "Run SQL queries"),
    ("maps", "Look up places and directions"),
    ("news", "Get recent news headlines"),
    ("github", "Work with GitHub repositories"),
    ("wikipedia", "Look up Wikipedia articles"),
    ("youtube", "Work with YouTube videos"),
    ("stocks", "Get stock market data"),
    ("summarize", "Summarize text"),
    ("shell", "Run shell commands"),
];

static MATCHERS: LazyLock<Vec<(Regex, &'static str, &'static str)>> = LazyLock::new(|| {
    KEYWORDS
        .iter()
        .map(|(word, description)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
            (
                Regex::new(&pattern).expect("keyword pattern"),
                *word,
                *description,
            )
        })
        .collect()
});

pub(super) fn infer(output: &str) -> Vec<CapabilityDescriptor> {
    MATCHERS
        .iter()
        .filter(|(pattern, _, _)| pattern.is_match(output))
        .map(|(_, word, description)| CapabilityDescriptor::inferred(title_case(word), *description))
        .collect()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
