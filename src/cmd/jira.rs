use clap::Args;

use crate::context::AppContext;
use crate::workflow::jira::{JiraSyncOptions, sync_jira_tests};
use crate::workflow::outcome::RunOutcome;

#[derive(Args, Debug, Clone)]
pub struct JiraArgs {
    /// Source issue key, e.g. PROJ-123.
    pub issue_key: String,
    /// Project receiving the tests (defaults to DEFAULT_PROJECT_KEY).
    #[arg(short, long)]
    pub project: Option<String>,
    /// Upper bound on generated tests (defaults to MAX_TESTS).
    #[arg(long)]
    pub max_tests: Option<usize>,
    /// Delete tests whose scenario is no longer generated.
    #[arg(long)]
    pub delete_obsolete: bool,
}

pub async fn run(ctx: &AppContext, args: JiraArgs) -> RunOutcome {
    let options = JiraSyncOptions {
        issue_key: args.issue_key.trim().to_string(),
        project_key: args.project,
        max_tests: args.max_tests.unwrap_or(ctx.config.max_tests),
        delete_obsolete: args.delete_obsolete,
    };
    sync_jira_tests(ctx, options).await
}
