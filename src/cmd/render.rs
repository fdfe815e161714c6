//! Chat-style rendering of run results.

use crate::workflow::outcome::RunOutcome;

/// Largest message a chat surface accepts in one piece.
pub const CHUNK_LIMIT: usize = 1900;

pub fn render_outcome(outcome: &RunOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    if !outcome.ok {
        let error = outcome.error.as_deref().unwrap_or("unknown failure");
        lines.push(format!("Error: {error}"));
        if outcome.report.is_some() {
            lines.push("Changes written before the failure:".to_string());
        }
    }
    let Some(report) = outcome.report.as_ref() else {
        return chunk_lines(&lines, CHUNK_LIMIT);
    };

    lines.push(format!(
        "{}: {} (generated by {})",
        report.source_key, report.summary, report.provider
    ));
    if report.created.is_empty() {
        lines.push("No new tests created.".to_string());
    } else {
        lines.push(format!("Created {} test(s):", report.created.len()));
    }
    for item in &report.created {
        let mut line = format!("- {} {}: {}", item.tag, item.key, item.title);
        if let Some(url) = &item.url {
            line.push_str(&format!(" <{url}>"));
        }
        lines.push(line);
    }
    push_keys(&mut lines, "Updated", &report.updated);
    push_keys(&mut lines, "Unchanged", &report.unchanged);
    push_keys(&mut lines, "Obsolete", &report.obsolete);
    push_keys(&mut lines, "Deleted", &report.deleted);

    chunk_lines(&lines, CHUNK_LIMIT)
}

fn push_keys(lines: &mut Vec<String>, label: &str, keys: &[String]) {
    if !keys.is_empty() {
        lines.push(format!("{label}: {}", keys.join(", ")));
    }
}

/// Packs lines into newline-joined chunks of at most `limit` characters.
/// A single line longer than the limit is split across chunks.
pub fn chunk_lines(lines: &[String], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in lines {
        for piece in split_long(line, limit) {
            let piece_len = piece.chars().count();
            let needed = if current.is_empty() { piece_len } else { piece_len + 1 };
            if current_len + needed > limit && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_long(line: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= limit || limit == 0 {
        return vec![line.to_string()];
    }
    chars
        .chunks(limit)
        .map(|piece| piece.iter().collect())
        .collect()
}
