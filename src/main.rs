mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::login;
use crate::cmd::report::{self, ReportCommandArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::git::GitCli;
use crate::infra::jira::JiraClient;

#[derive(Parser)]
#[command(
    name = "depcomment",
    author,
    version,
    about = "Deployment readiness report for the services touched by local changes"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report which services the working tree changes touch (default).
    Report(ReportArgs),
    /// Store Jira credentials for posting comments.
    Login,
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[derive(Args, Default)]
struct ReportArgs {
    /// Post the report as a comment on this Jira issue.
    #[arg(short, long)]
    issue: Option<String>,
    /// Mark a service as blocked from deploy. Repeatable.
    #[arg(short, long = "block", value_name = "SERVICE")]
    block: Vec<String>,
    /// Seconds to wait for the change-set scan before giving up.
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Also show the result as a desktop notification.
    #[arg(short, long)]
    notify: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "depcomment=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config(args)) => config_cmd::run(args.command),
        Some(Commands::Login) => {
            let email = login::run()?;
            println!("Logged in as {email}");
            Ok(())
        }
        Some(Commands::Report(args)) => run_report(args).await,
        None => run_report(ReportArgs::default()).await,
    }
}

async fn run_report(args: ReportArgs) -> AppResult<()> {
    let cwd = std::env::current_dir()?;
    let config = AppConfig::load(&cwd)?;

    let posting = args.issue.is_some() || config.default_issue.is_some();
    if posting {
        if config.jira_base_url.is_none() {
            warn!("Jira base URL not configured; posting the comment will fail");
        }
        if config.jira_email.is_none() || config.jira_token.is_none() {
            warn!("Jira credentials not configured; run `depcomment login`");
        }
    }

    let git = Arc::new(GitCli::new(config.workspace_root.clone()));
    let issue_tracker = Arc::new(JiraClient::new(
        config.jira_base_url.clone(),
        config.jira_email.clone(),
        config.jira_token.clone(),
    )?);
    let context = AppContext::new(config, git, issue_tracker);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let outcome = report::run(
        &context,
        ReportCommandArgs {
            issue: args.issue,
            blocked: args.block,
            timeout: args.timeout.map(Duration::from_secs),
            notify: args.notify,
        },
        cancel,
    )
    .await?;

    if let Some(issue) = &outcome.posted_to {
        eprintln!(
            "Deployment comment for {} service(s) posted to {issue}",
            outcome.report.rows().len()
        );
    }

    Ok(())
}
