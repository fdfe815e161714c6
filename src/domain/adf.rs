//! Flattening of Atlassian Document Format bodies into plain text.

use serde_json::Value;

const BLOCK_NODES: [&str; 8] = [
    "paragraph",
    "heading",
    "codeBlock",
    "blockquote",
    "listItem",
    "tableRow",
    "panel",
    "rule",
];

/// Renders an ADF document (or a plain string body) as text.
pub fn to_text(body: &Value) -> String {
    match body {
        Value::String(text) => text.trim().to_string(),
        Value::Null => String::new(),
        node => {
            let mut out = String::new();
            walk(node, &mut out);
            tidy(&out)
        }
    }
}

/// Collects the text of every `codeBlock` node, in document order.
pub fn code_blocks(body: &Value) -> Vec<String> {
    let mut blocks = Vec::new();
    collect_code_blocks(body, &mut blocks);
    blocks
}

fn walk(node: &Value, out: &mut String) {
    let node_type = node.get("type").and_then(Value::as_str).unwrap_or_default();
    match node_type {
        "text" => {
            if let Some(text) = node.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        "hardBreak" => out.push('\n'),
        "mention" | "emoji" => {
            if let Some(text) = node.pointer("/attrs/text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        "inlineCard" => {
            if let Some(url) = node.pointer("/attrs/url").and_then(Value::as_str) {
                out.push_str(url);
            }
        }
        _ => {
            if node_type == "listItem" {
                out.push_str("- ");
            }
            if let Some(children) = node.get("content").and_then(Value::as_array) {
                for child in children {
                    walk(child, out);
                }
            }
            if BLOCK_NODES.contains(&node_type) && !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }
}

fn collect_code_blocks(node: &Value, blocks: &mut Vec<String>) {
    if node.get("type").and_then(Value::as_str) == Some("codeBlock") {
        let mut text = String::new();
        if let Some(children) = node.get("content").and_then(Value::as_array) {
            for child in children {
                walk(child, &mut text);
            }
        }
        blocks.push(text);
        return;
    }
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            collect_code_blocks(child, blocks);
        }
    }
}

fn tidy(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim_end) {
        if line.trim().is_empty() && lines.last().is_some_and(|prev| prev.trim().is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn flattens_paragraphs_and_lists() {
        let doc = json!({
            "type": "doc",
            "version": 1,
            "content": [
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "As a shopper"},
                    {"type": "hardBreak"},
                    {"type": "text", "text": "I want a cart"}
                ]},
                {"type": "bulletList", "content": [
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "shows totals"}]}
                    ]},
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [
                            {"type": "mention", "attrs": {"text": "@ana"}},
                            {"type": "text", "text": " reviews"}
                        ]}
                    ]}
                ]}
            ]
        });
        assert_eq!(
            to_text(&doc),
            "As a shopper\nI want a cart\n- shows totals\n- @ana reviews"
        );
    }

    #[test]
    fn plain_strings_pass_through() {
        assert_eq!(to_text(&json!("  hello ")), "hello");
        assert_eq!(to_text(&Value::Null), "");
    }

    #[test]
    fn finds_code_blocks() {
        let doc = json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "note"}]},
                {"type": "codeBlock", "attrs": {"language": "gherkin"},
                 "content": [{"type": "text", "text": "Feature: x\n  Scenario: y"}]}
            ]
        });
        assert_eq!(code_blocks(&doc), vec!["Feature: x\n  Scenario: y".to_string()]);
    }
}
