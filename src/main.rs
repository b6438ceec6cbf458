use std::process::ExitCode;

use ai_llm_service::telemetry;
use anyhow::Result;
use clap::{Parser, Subcommand};
use pr_reviewer::{context::EventContext, inputs::Inputs, orchestrator::validate_event, report::Reporter};
use tracing::{Level, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pr-review-bot")]
#[command(about = "Assigns, requests reviewers, writes descriptions and per-file AI reviews for pull requests")]
#[command(version)]
struct Cli {
    /// Log level for the workspace crates when RUST_LOG is not set
    #[arg(long, global = true, env = "PR_REVIEW_BOT_LOG_LEVEL", default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the review pipeline for the current pull request event (default)
    Review,
    /// Complete the `openai-prompt` input once and export it as `text`
    Complete,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Local runs read inputs from .env; on the runner there is none.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level(cli.log_level))
        .with(telemetry::layer())
        .init();

    let reporter = Reporter::from_env();
    let result = match cli.command.unwrap_or(Command::Review) {
        Command::Review => review(&reporter).await,
        Command::Complete => complete(&reporter).await,
    };

    if let Err(e) = result {
        error!(error = ?e, "run aborted");
        reporter.fail(format!("{e:#}"));
    }

    if reporter.has_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn review(reporter: &Reporter) -> Result<()> {
    let ctx = EventContext::from_env()?;
    if let Err(stage) = validate_event(&ctx, reporter) {
        info!(?stage, event = %ctx.event_name, "event not handled");
        return Ok(());
    }
    let inputs = Inputs::from_env()?;

    let outcome = pr_reviewer::run_action(&inputs, &ctx, reporter).await?;
    info!(
        stage = ?outcome.stopped_at,
        failures = outcome.failures.len(),
        "run finished"
    );
    Ok(())
}

async fn complete(reporter: &Reporter) -> Result<()> {
    let inputs = Inputs::from_env()?;
    let text = pr_reviewer::complete_prompt(&inputs, reporter).await?;
    info!(chars = text.chars().count(), "completion exported");
    Ok(())
}
