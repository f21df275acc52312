use crate::cmd::config::apply_prompt;
use crate::config::{StoredConfig, config_file_path};
use crate::error::{AppError, AppResult};

/// Stores Jira credentials used when posting deployment comments.
pub fn run() -> AppResult<String> {
    let mut cfg = StoredConfig::load()?;

    if cfg.jira_base_url.is_none() {
        apply_prompt(
            "Jira base URL (e.g., https://company.atlassian.net)",
            &mut cfg.jira_base_url,
            false,
        )?;
    }
    apply_prompt("Jira email", &mut cfg.jira_email, false)?;
    apply_prompt("Jira API token", &mut cfg.jira_token, true)?;

    let email = cfg
        .jira_email
        .clone()
        .ok_or_else(|| AppError::Configuration("Jira email is required to log in".to_string()))?;
    if cfg.jira_token.is_none() {
        return Err(AppError::Configuration(
            "Jira API token is required to log in".to_string(),
        ));
    }

    cfg.save()?;
    let path = config_file_path()?;
    println!("Credentials saved to {}", path.display());
    Ok(email)
}
