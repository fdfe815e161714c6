use crate::domain::ticket::{Comment, SourceTicket};

const NOISE_COMMENTS: [&str; 6] = ["listo", "hecho", "done", "ok", "gracias", "de acuerdo"];
const MIN_COMMENT_WORDS: usize = 3;
const ELLIPSIS: &str = " [...]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    pub max_chars: usize,
    pub max_comments: usize,
    pub max_comment_chars: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_chars: 16_000,
            max_comments: 10,
            max_comment_chars: 600,
        }
    }
}

/// Reduces a ticket to the bounded text blob sent to the model.
#[derive(Debug, Clone, Default)]
pub struct ContextFormatter {
    limits: ContextLimits,
}

impl ContextFormatter {
    pub fn new(limits: ContextLimits) -> Self {
        Self { limits }
    }

    pub fn format(&self, ticket: &SourceTicket) -> String {
        let description = if ticket.description.trim().is_empty() {
            "No description provided."
        } else {
            ticket.description.trim()
        };
        let blob = format!(
            "TITLE: {}\nDESCRIPTION:\n{}\n\nCOMMENTS:\n{}",
            ticket.summary.trim(),
            description,
            self.format_comments(&ticket.comments)
        );
        truncate_chars(&blob, self.limits.max_chars)
    }

    pub fn format_comments(&self, comments: &[Comment]) -> String {
        if comments.is_empty() {
            return "No additional comments.".to_string();
        }

        let relevant = comments
            .iter()
            .take(self.limits.max_comments)
            .filter_map(|comment| {
                let body = comment.body.trim();
                if is_noise(body) {
                    return None;
                }
                let author = if comment.author.trim().is_empty() {
                    "User"
                } else {
                    comment.author.trim()
                };
                Some(format!(
                    "- Comment from {author}: {}",
                    truncate_chars(body, self.limits.max_comment_chars)
                ))
            })
            .collect::<Vec<_>>();

        if relevant.is_empty() {
            "No relevant comments found.".to_string()
        } else {
            relevant.join("\n")
        }
    }
}

fn is_noise(body: &str) -> bool {
    body.is_empty()
        || body.split_whitespace().count() < MIN_COMMENT_WORDS
        || NOISE_COMMENTS.contains(&body.to_lowercase().as_str())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}
