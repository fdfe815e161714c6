use serde::Serialize;

use crate::error::AppResult;

/// Result handed to presentation code: failures are data, not errors. A
/// failed run still carries its report when it wrote anything before
/// failing.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RunReport>,
}

impl RunOutcome {
    pub fn from_run(report: RunReport, result: AppResult<()>) -> Self {
        match result {
            Ok(()) => Self {
                ok: true,
                error: None,
                report: Some(report),
            },
            Err(err) => Self {
                ok: false,
                error: Some(err.to_string()),
                report: report.has_writes().then_some(report),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub source_key: String,
    pub summary: String,
    pub provider: String,
    pub created: Vec<CreatedItem>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub obsolete: Vec<String>,
    pub deleted: Vec<String>,
}

impl RunReport {
    /// Whether the tracker was changed during the run.
    pub fn has_writes(&self) -> bool {
        !self.created.is_empty() || !self.updated.is_empty() || !self.deleted.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedItem {
    pub tag: String,
    pub key: String,
    pub title: String,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn failure_keeps_a_report_with_writes() {
        let report = RunReport {
            updated: vec!["QA-1".to_string()],
            ..RunReport::default()
        };
        let outcome = RunOutcome::from_run(report, Err(AppError::Network("reset".to_string())));
        assert!(!outcome.ok);
        assert_eq!(outcome.error.as_deref(), Some("network error: reset"));
        assert_eq!(outcome.report.unwrap().updated, vec!["QA-1"]);
    }

    #[test]
    fn failure_before_any_write_has_no_report() {
        let outcome = RunOutcome::from_run(
            RunReport::default(),
            Err(AppError::NotFound("PROJ-9".to_string())),
        );
        assert!(outcome.report.is_none());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({"ok": false, "error": "not found: PROJ-9"}));
    }
}
