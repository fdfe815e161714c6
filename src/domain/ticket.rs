use serde::Serialize;

/// Read-only snapshot of the ticket test cases are generated for.
#[derive(Debug, Clone, Default)]
pub struct SourceTicket {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub comments: Vec<Comment>,
    pub attachments: Vec<Attachment>,
}

impl SourceTicket {
    /// Backend tickets flagged `[be]` get API-contract tests instead of acceptance tests.
    pub fn is_backend(&self) -> bool {
        self.summary.to_lowercase().contains("[be]")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Comment {
    pub author: String,
    pub body: String,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub name: String,
}

/// A test ticket created by an earlier run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExistingTestTicket {
    pub key: String,
    pub title: String,
    pub steps: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Everything a tracker needs to file one generated test case.
#[derive(Debug, Clone)]
pub struct NewTestTicket {
    pub title: String,
    pub body: String,
    pub destination: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    pub key: String,
    pub url: Option<String>,
}

/// A place test tickets can be written to (a ClickUp list, a Jira project).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    pub label: String,
    pub value: String,
    pub description: String,
}

/// Builds the composite `TCnn | SOURCE | title` display title.
pub fn composite_title(index: usize, source_key: &str, title: &str) -> String {
    format!("{} | {} | {}", tc_tag(index), source_key, title)
}

pub fn tc_tag(index: usize) -> String {
    format!("TC{index:02}")
}

/// Returns the index the next created test should use: one past the highest
/// `TCnn` segment found among the given titles.
pub fn next_tc_index<'a>(titles: impl IntoIterator<Item = &'a str>) -> usize {
    titles
        .into_iter()
        .flat_map(|title| title.split(" | "))
        .filter_map(|segment| {
            let digits = segment.trim().strip_prefix("TC")?;
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            digits.parse::<usize>().ok()
        })
        .max()
        .map(|max| max + 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_composite_title() {
        assert_eq!(
            composite_title(3, "PROJ-5", "Validate that login succeeds"),
            "TC03 | PROJ-5 | Validate that login succeeds"
        );
        assert_eq!(tc_tag(12), "TC12");
    }

    #[test]
    fn next_index_follows_highest_tag() {
        let titles = [
            "TC01 | PROJ-5 | Validate that a",
            "TC07 | PROJ-5 | Validate that b",
            "PROJ-5 | TC03 | Validate that c",
        ];
        assert_eq!(next_tc_index(titles), 8);
    }

    #[test]
    fn next_index_starts_at_one() {
        assert_eq!(next_tc_index(Vec::<&str>::new()), 1);
        assert_eq!(next_tc_index(["TCX | PROJ-5 | title", "TC | a"]), 1);
    }

    #[test]
    fn detects_backend_tickets() {
        let ticket = SourceTicket {
            summary: "[BE] Expose order endpoint".to_string(),
            ..SourceTicket::default()
        };
        assert!(ticket.is_backend());
        let ticket = SourceTicket {
            summary: "Checkout button".to_string(),
            ..SourceTicket::default()
        };
        assert!(!ticket.is_backend());
    }
}
