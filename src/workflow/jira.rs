use tracing::{Instrument, info, info_span, warn};

use crate::context::AppContext;
use crate::domain::gherkin::build_feature;
use crate::domain::reconcile::{display_title, reconcile};
use crate::domain::scenario::Scenario;
use crate::domain::ticket::{NewTestTicket, composite_title, next_tc_index, tc_tag};
use crate::error::{AppError, AppResult};
use crate::workflow::generate::generate_scenarios;
use crate::workflow::outcome::{CreatedItem, RunOutcome, RunReport};
use crate::workflow::run_id;

#[derive(Debug, Clone)]
pub struct JiraSyncOptions {
    pub issue_key: String,
    pub project_key: Option<String>,
    pub max_tests: usize,
    pub delete_obsolete: bool,
}

/// Generates tests for a Jira issue and reconciles them with the tests
/// earlier runs created: new scenarios are filed, changed ones rewritten and
/// stale ones reported (and deleted when asked to). Writes made before a
/// failure are still reported.
pub async fn sync_jira_tests(ctx: &AppContext, options: JiraSyncOptions) -> RunOutcome {
    let span = info_span!("run", run_id = %run_id(), source = %options.issue_key);
    let mut report = RunReport::default();
    let result = sync(ctx, options, &mut report).instrument(span).await;
    RunOutcome::from_run(report, result)
}

async fn sync(ctx: &AppContext, options: JiraSyncOptions, report: &mut RunReport) -> AppResult<()> {
    let project = options
        .project_key
        .clone()
        .or_else(|| ctx.config.jira.default_project.clone())
        .ok_or_else(|| AppError::Configuration("no target Jira project configured".to_string()))?;

    info!(project = %project, "starting Jira sync");
    let ticket = ctx.jira.fetch_ticket(&options.issue_key).await?;
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

    let existing = ctx.jira.existing_tests(&ticket.key, &project).await?;
    let plan = reconcile(&existing, &generation.scenarios);
    info!(
        create = plan.to_create.len(),
        update = plan.to_update.len(),
        unchanged = plan.unchanged.len(),
        obsolete = plan.obsolete.len(),
        "sync plan ready"
    );
    if plan.is_noop() {
        info!("existing tests already match the generated scenarios");
    }

    for test in &plan.to_update {
        let scenario = Scenario::new(display_title(&test.title), test.steps.clone());
        let feature = build_feature(&ticket.summary, &ticket.key, &scenario);
        ctx.jira.update_test_ticket(test, &feature).await?;
        report.updated.push(test.key.clone());
    }

    let mut index = next_tc_index(existing.iter().map(|test| test.title.as_str()));
    for scenario in &plan.to_create {
        let tag = tc_tag(index);
        let request = NewTestTicket {
            title: composite_title(index, &ticket.key, &scenario.title),
            body: build_feature(&ticket.summary, &ticket.key, scenario),
            destination: project.clone(),
            file_name: format!("{}-{tag}.feature", ticket.key),
        };
        let created = ctx.jira.create_test_ticket(&request).await?;
        if let Err(err) = ctx.jira.link(&created.key, &ticket.key).await {
            warn!(key = %created.key, error = %err, "created test left unlinked");
        }
        report.created.push(CreatedItem {
            tag,
            key: created.key,
            title: scenario.title.clone(),
            url: created.url,
        });
        index += 1;
    }

    report.unchanged = plan.unchanged.iter().map(|t| t.key.clone()).collect();
    report.obsolete = plan.obsolete.iter().map(|t| t.key.clone()).collect();
    if options.delete_obsolete {
        for test in &plan.obsolete {
            match ctx.jira.delete_ticket(&test.key).await {
                Ok(()) => report.deleted.push(test.key.clone()),
                Err(err) => warn!(key = %test.key, error = %err, "failed to delete obsolete test"),
            }
        }
    }

    info!(
        created = report.created.len(),
        updated = report.updated.len(),
        deleted = report.deleted.len(),
        "Jira sync finished"
    );
    Ok(())
}
