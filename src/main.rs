mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cmd::clickup::ClickUpArgs;
use crate::cmd::config::ConfigArgs;
use crate::cmd::jira::JiraArgs;
use crate::cmd::render::{CHUNK_LIMIT, chunk_lines, render_outcome};
use crate::cmd::report::ReportArgs;
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::clickup::ClickUpClient;
use crate::infra::http::RetryPolicy;
use crate::infra::jira::JiraClient;
use crate::infra::llm::GeminiClient;
use crate::workflow::outcome::RunOutcome;

#[derive(Parser)]
#[command(
    name = "gherkin-sync",
    author,
    version,
    about = "Generate Gherkin test cases from tracker tickets and keep them in sync"
)]
struct Cli {
    /// Debug-level logs.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate tests for a Jira issue and reconcile them with earlier runs.
    Jira(JiraArgs),
    /// Generate tests for a ClickUp task into a destination list.
    Clickup(ClickUpArgs),
    /// List the ClickUp lists tests can be written to.
    Destinations,
    /// Print a markdown checklist of the tests in a ClickUp folder.
    Report(ReportArgs),
    /// Inspect the effective configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("gherkin_sync=debug")
        } else {
            EnvFilter::new("gherkin_sync=info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Runs the selected command; `Ok(false)` means the run reported a failure.
async fn run(cli: Cli) -> AppResult<bool> {
    let ctx = build_context(AppConfig::from_env())?;
    dispatch(&ctx, cli.command, cli.json).await
}

async fn dispatch(ctx: &AppContext, command: Commands, json: bool) -> AppResult<bool> {
    match command {
        Commands::Jira(args) => {
            let outcome = cmd::jira::run(ctx, args).await;
            print_outcome(&outcome, json)
        }
        Commands::Clickup(args) => {
            let outcome = cmd::clickup::run(ctx, args).await?;
            print_outcome(&outcome, json)
        }
        Commands::Destinations => {
            let destinations = cmd::destinations::run(ctx).await?;
            if json {
                print_json(&destinations)?;
            } else {
                print_chunks(&cmd::destinations::render(&destinations));
            }
            Ok(true)
        }
        Commands::Report(args) => {
            let report = cmd::report::run(ctx, args).await?;
            if json {
                print_json(&serde_json::json!({ "report": report }))?;
            } else {
                let lines: Vec<String> = report.lines().map(str::to_string).collect();
                print_chunks(&lines);
            }
            Ok(true)
        }
        Commands::Config(args) => {
            cmd::config::run(args.command, &ctx.config);
            Ok(true)
        }
    }
}

fn build_context(config: AppConfig) -> AppResult<AppContext> {
    let policy = RetryPolicy::default();
    let jira = Arc::new(JiraClient::new(config.jira.clone(), policy)?);
    let clickup = Arc::new(ClickUpClient::new(config.clickup.clone(), policy)?);
    let language_model = Arc::new(GeminiClient::new(config.llm.clone(), policy)?);

    Ok(AppContext::new(
        config,
        jira,
        clickup.clone(),
        clickup,
        language_model,
    ))
}

fn print_outcome(outcome: &RunOutcome, json: bool) -> AppResult<bool> {
    if json {
        print_json(outcome)?;
    } else {
        for chunk in render_outcome(outcome) {
            println!("{chunk}");
        }
    }
    Ok(outcome.ok)
}

fn print_chunks(lines: &[String]) {
    for chunk in chunk_lines(lines, CHUNK_LIMIT) {
        println!("{chunk}");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
