use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{StoredConfig, config_file_path};
use crate::domain::service::DEFAULT_SERVICES;
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring depcomment.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in the local config file; protect your filesystem accordingly.");
    println!();

    apply_prompt(
        "Jira base URL (e.g., https://company.atlassian.net)",
        &mut cfg.jira_base_url,
        false,
    )?;
    apply_prompt("Jira email", &mut cfg.jira_email, false)?;
    apply_prompt("Jira API token", &mut cfg.jira_token, true)?;
    apply_prompt("Default Jira issue for deployment comments", &mut cfg.default_issue, false)?;
    apply_prompt(
        "Directory holding the services (e.g., services)",
        &mut cfg.services_root,
        false,
    )?;

    let mut services = cfg.services.as_ref().map(|names| names.join(","));
    apply_prompt("Known services (comma separated)", &mut services, false)?;
    cfg.services = services.map(|value| split_list(&value));

    let mut blocked = Some(cfg.blocked_services.join(",")).filter(|value| !value.is_empty());
    apply_prompt("Services blocked from deploy (comma separated)", &mut blocked, false)?;
    cfg.blocked_services = blocked.map(|value| split_list(&value)).unwrap_or_default();

    let mut timeout = cfg.scan_timeout_secs.map(|secs| secs.to_string());
    apply_prompt("Git scan timeout in seconds", &mut timeout, false)?;
    cfg.scan_timeout_secs = timeout.and_then(|value| value.parse().ok());

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("Jira base URL: {}", display_value(&cfg.jira_base_url));
    println!("Jira email: {}", display_value(&cfg.jira_email));
    println!("Jira API token: {}", mask_secret(&cfg.jira_token));
    println!("Default issue: {}", display_value(&cfg.default_issue));
    println!("Services root: {}", display_value(&cfg.services_root));
    println!(
        "Known services: {}",
        cfg.services
            .as_ref()
            .map(|names| names.join(", "))
            .unwrap_or_else(|| format!("{} (default)", DEFAULT_SERVICES.join(", ")))
    );
    println!(
        "Blocked services: {}",
        display_value(&Some(cfg.blocked_services.join(", ")))
    );
    println!(
        "Git scan timeout: {}",
        display_value(&cfg.scan_timeout_secs.map(|secs| format!("{secs}s")))
    );

    Ok(())
}

pub(crate) fn apply_prompt(
    field: &str,
    target: &mut Option<String>,
    secret: bool,
) -> AppResult<()> {
    match prompt(field, target.as_deref(), secret)? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn prompt(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(parse_prompt_input(&input))
}

fn parse_prompt_input(input: &str) -> PromptAction {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        PromptAction::Keep
    } else if trimmed == "-" {
        PromptAction::Clear
    } else {
        PromptAction::Set(trimmed.to_string())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.len() > 6 => {
            let prefix = &token[..3];
            let suffix = &token[token.len() - 3..];
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PromptAction {
    Keep,
    Clear,
    Set(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_long_and_short_secrets() {
        assert_eq!(mask_secret(&Some("abcdefghij".to_string())), "abc***hij");
        assert_eq!(mask_secret(&Some("abc".to_string())), "***");
        assert_eq!(mask_secret(&None), "<not set>");
    }

    #[test]
    fn interprets_prompt_input() {
        assert_eq!(parse_prompt_input("\n"), PromptAction::Keep);
        assert_eq!(parse_prompt_input(" - \n"), PromptAction::Clear);
        assert_eq!(
            parse_prompt_input("DEP-42\n"),
            PromptAction::Set("DEP-42".to_string())
        );
    }

    #[test]
    fn splits_comma_separated_lists() {
        assert_eq!(
            split_list(" ManagerService, ,RestAPIService "),
            vec!["ManagerService", "RestAPIService"]
        );
    }
}
