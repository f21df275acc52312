use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::change::{ChangedPath, normalize_status_output};
use crate::error::{AppError, AppResult};
use crate::services::ChangeSetSource;

const STATUS_ARGS: [&str; 3] = ["status", "--porcelain", "--untracked-files=all"];

pub struct GitCli {
    workspace_root: PathBuf,
}

impl GitCli {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }

    fn command_line() -> String {
        format!("git {}", STATUS_ARGS.join(" "))
    }
}

#[async_trait]
impl ChangeSetSource for GitCli {
    async fn scan(&self) -> AppResult<Vec<ChangedPath>> {
        debug!(workspace = %self.workspace_root.display(), "running git status");

        let output = Command::new("git")
            .args(STATUS_ARGS)
            .current_dir(&self.workspace_root)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| AppError::ExternalTool {
                command: Self::command_line(),
                detail: format!("failed to spawn: {err}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = match stderr.trim() {
                "" => format!("exited with {}", output.status),
                message => format!("exited with {}: {message}", output.status),
            };
            return Err(AppError::ExternalTool {
                command: Self::command_line(),
                detail,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let paths = normalize_status_output(&stdout);
        debug!(changed = paths.len(), "git status captured");
        Ok(paths)
    }
}
