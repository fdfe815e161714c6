use tracing::{Instrument, info, info_span, warn};

use crate::context::AppContext;
use crate::domain::gherkin::build_feature;
use crate::domain::ticket::{Destination, NewTestTicket, composite_title, tc_tag};
use crate::error::{AppError, AppResult};
use crate::workflow::generate::generate_scenarios;
use crate::workflow::outcome::{CreatedItem, RunOutcome, RunReport};
use crate::workflow::run_id;

#[derive(Debug, Clone)]
pub struct ClickUpCreateOptions {
    pub task_id: String,
    /// Destination list; the configured default list when `None`.
    pub list_id: Option<String>,
    pub max_tests: usize,
}

/// Destinations offered to the user before a ClickUp run.
pub async fn clickup_destinations(ctx: &AppContext) -> AppResult<Vec<Destination>> {
    ctx.clickup.list_destinations().await
}

/// Generates tests for a ClickUp task and files each one as a new task in
/// the destination list. ClickUp runs never reconcile: numbering restarts
/// at TC01 every time.
pub async fn create_clickup_tests(ctx: &AppContext, options: ClickUpCreateOptions) -> RunOutcome {
    let span = info_span!("run", run_id = %run_id(), source = %options.task_id);
    let mut report = RunReport::default();
    let result = create(ctx, options, &mut report).instrument(span).await;
    RunOutcome::from_run(report, result)
}

async fn create(
    ctx: &AppContext,
    options: ClickUpCreateOptions,
    report: &mut RunReport,
) -> AppResult<()> {
    let list_id = options
        .list_id
        .clone()
        .or_else(|| ctx.config.clickup.default_list_id.clone())
        .ok_or_else(|| AppError::Configuration("no destination ClickUp list".to_string()))?;

    info!(list = %list_id, "starting ClickUp run");
    let ticket = ctx.clickup.fetch_ticket(&options.task_id).await?;
    report.source_key = ticket.key.clone();
    report.summary = ticket.summary.clone();
    let context = ctx.context_formatter().format(&ticket);

    let generation =
        generate_scenarios(ctx.language_model.as_ref(), &ticket, &context, options.max_tests).await;
    if generation.scenarios.is_empty() {
        return Err(AppError::LanguageModel(format!(
            "no scenarios generated ({})",
            generation.provider
        )));
    }

    report.provider = generation.provider.clone();

    for (offset, scenario) in generation.scenarios.iter().enumerate() {
        let index = offset + 1;
        let tag = tc_tag(index);
        let request = NewTestTicket {
            title: composite_title(index, &ticket.key, &scenario.title),
            body: build_feature(&ticket.summary, &ticket.key, scenario),
            destination: list_id.clone(),
            file_name: format!("{}-{tag}.feature", ticket.key),
        };
        let created = ctx.clickup.create_test_ticket(&request).await?;
        if let Err(err) = ctx.clickup.link(&created.key, &ticket.key).await {
            warn!(key = %created.key, error = %err, "created task left unlinked");
        }
        report.created.push(CreatedItem {
            tag,
            key: created.key,
            title: scenario.title.clone(),
            url: created.url,
        });
    }

    info!(created = report.created.len(), "ClickUp run finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::{FakeTracker, context_with};

    const RESPONSE: &str = r#"```json
{"scenarios": [
    {"title": "Happy Path: Validate that checkout completes", "steps": "Given a cart\nWhen paying\nThen an order exists"},
    {"title": "Ensure totals include tax", "steps": "Given a taxed item\nThen the total includes tax"}
]}
```"#;

    fn options(list_id: Option<&str>) -> ClickUpCreateOptions {
        ClickUpCreateOptions {
            task_id: "86abc".to_string(),
            list_id: list_id.map(str::to_string),
            max_tests: 10,
        }
    }

    #[tokio::test]
    async fn creates_numbered_tasks_in_order() {
        let tracker = FakeTracker::with_existing(Vec::new());
        let ctx = context_with(tracker.clone(), RESPONSE);

        let outcome = create_clickup_tests(&ctx, options(Some("list-9"))).await;

        assert!(outcome.ok, "{:?}", outcome.error);
        let report = outcome.report.unwrap();
        let tags: Vec<_> = report.created.iter().map(|item| item.tag.as_str()).collect();
        assert_eq!(tags, vec!["TC01", "TC02"]);
        assert_eq!(report.created[1].title, "Validate that totals include tax");

        let created = tracker.created.lock().unwrap();
        assert_eq!(
            created[0].title,
            "TC01 | 86abc | Validate that checkout completes"
        );
        assert_eq!(created[0].destination, "list-9");
        assert!(created[1].body.starts_with("Feature: Login page\n  # Source: 86abc\n"));
        assert_eq!(
            *tracker.links.lock().unwrap(),
            vec![
                ("NEW-1".to_string(), "86abc".to_string()),
                ("NEW-2".to_string(), "86abc".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn falls_back_to_the_configured_list() {
        let tracker = FakeTracker::with_existing(Vec::new());
        let ctx = context_with(tracker.clone(), RESPONSE);

        let outcome = create_clickup_tests(&ctx, options(None)).await;
        assert!(outcome.ok);
        assert_eq!(tracker.created.lock().unwrap()[0].destination, "list-1");
    }

    #[tokio::test]
    async fn missing_list_is_a_configuration_failure() {
        let tracker = FakeTracker::with_existing(Vec::new());
        let mut ctx = context_with(tracker, RESPONSE);
        ctx.config.clickup.default_list_id = None;

        let outcome = create_clickup_tests(&ctx, options(None)).await;
        assert!(!outcome.ok);
        assert!(outcome.error.unwrap().starts_with("configuration error"));
    }

    #[tokio::test]
    async fn unknown_task_is_reported_not_raised() {
        let tracker = FakeTracker::with_existing(Vec::new());
        let ctx = context_with(tracker, RESPONSE);

        let mut opts = options(Some("list-9"));
        opts.task_id = "MISSING".to_string();
        let outcome = create_clickup_tests(&ctx, opts).await;
        assert!(!outcome.ok);
        assert!(outcome.report.is_none());
        assert!(outcome.error.unwrap().contains("MISSING"));
    }

    #[tokio::test]
    async fn failed_create_keeps_earlier_tasks_in_the_report() {
        let tracker = FakeTracker::with_existing(Vec::new());
        tracker.fail_creates_after(1);
        let ctx = context_with(tracker, RESPONSE);

        let outcome = create_clickup_tests(&ctx, options(Some("list-9"))).await;
        assert!(!outcome.ok);
        assert!(outcome.error.unwrap().contains("create refused"));
        let report = outcome.report.unwrap();
        assert_eq!(report.source_key, "86abc");
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].key, "NEW-1");
    }

    #[tokio::test]
    async fn link_failures_do_not_stop_the_run() {
        let tracker = FakeTracker::with_existing(Vec::new());
        tracker.fail_links();
        let ctx = context_with(tracker, RESPONSE);

        let outcome = create_clickup_tests(&ctx, options(Some("list-9"))).await;
        assert!(outcome.ok);
        assert_eq!(outcome.report.unwrap().created.len(), 2);
    }
}
