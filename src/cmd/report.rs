use clap::Args;

use crate::context::AppContext;
use crate::error::AppResult;
use crate::workflow::report::folder_report;

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// ClickUp folder holding the test lists.
    pub folder_id: String,
}

pub async fn run(ctx: &AppContext, args: ReportArgs) -> AppResult<String> {
    folder_report(ctx.clickup_directory.as_ref(), args.folder_id.trim()).await
}
