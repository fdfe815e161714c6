use serde::Serialize;
use serde_json::Value;

use crate::error::AppResult;

const REQUIRED_LEAD: &str = "Validate that";
const BANNED_PREFIXES: [&str; 5] = ["bug:", "happy path:", "scenario:", "edge case:", "test case:"];
const REPLACEABLE_LEADS: [&str; 2] = ["verify", "ensure"];

/// A single generated acceptance test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub title: String,
    pub steps: String,
}

impl Scenario {
    pub fn new(title: impl Into<String>, steps: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            steps: steps.into(),
        }
    }
}

/// Rewrites a model-produced title so it starts with "Validate that" and
/// carries none of the label prefixes models like to add.
pub fn normalize_title(raw: &str) -> String {
    let mut title = raw.trim();
    for prefix in BANNED_PREFIXES {
        if starts_with_ignore_case(title, prefix) {
            title = title[prefix.len()..].trim();
        }
    }

    if starts_with_ignore_case(title, REQUIRED_LEAD) {
        return title.to_string();
    }

    for lead in REPLACEABLE_LEADS {
        if starts_with_ignore_case(title, lead) {
            return format!("{REQUIRED_LEAD}{}", &title[lead.len()..]);
        }
    }

    format!("{REQUIRED_LEAD} {title}")
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Drops the markdown fence lines models sometimes wrap JSON in.
pub fn strip_code_fences(text: &str) -> String {
    if !text.contains("```") {
        return text.to_string();
    }
    text.lines()
        .filter(|line| !line.trim().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses a `{"scenarios": [...]}` model response into normalized scenarios,
/// keeping at most `max_tests` entries in response order.
pub fn parse_scenarios(response: &str, max_tests: usize) -> AppResult<Vec<Scenario>> {
    let payload: Value = serde_json::from_str(&strip_code_fences(response))?;
    let entries = payload
        .get("scenarios")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let scenarios = entries
        .iter()
        .take(max_tests)
        .filter_map(|entry| {
            let raw_title = entry
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("Untitled");
            let title = normalize_title(raw_title);
            let steps = coerce_steps(entry.get("steps"));
            if title.is_empty() || steps.is_empty() {
                None
            } else {
                Some(Scenario { title, steps })
            }
        })
        .collect();

    Ok(scenarios)
}

fn coerce_steps(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    }
}
