use async_trait::async_trait;
use notify_rust::Notification;
use tracing::debug;

use crate::domain::report::{ApprovalMark, DeploymentReport};
use crate::error::{AppError, AppResult};
use crate::services::ReportPublisher;

const NOTIFICATION_SUMMARY: &str = "Deployment comment";

/// Announces the finished report through the desktop notification service.
pub struct DesktopPublisher;

impl DesktopPublisher {
    fn body(report: &DeploymentReport) -> String {
        if report.is_empty() {
            return "No registered services changed".to_string();
        }
        let names_with = |mark: ApprovalMark| {
            report
                .rows()
                .iter()
                .filter(|row| row.mark == mark)
                .map(|row| row.service.as_str())
                .collect::<Vec<_>>()
        };

        let approved = names_with(ApprovalMark::Approved);
        let blocked = names_with(ApprovalMark::Blocked);
        let mut lines = Vec::new();
        if !approved.is_empty() {
            lines.push(format!("Ready: {}", approved.join(", ")));
        }
        if !blocked.is_empty() {
            lines.push(format!("Blocked: {}", blocked.join(", ")));
        }
        lines.join("\n")
    }
}

#[async_trait]
impl ReportPublisher for DesktopPublisher {
    async fn publish(&self, report: &DeploymentReport) -> AppResult<()> {
        let body = Self::body(report);
        debug!("sending desktop notification");

        tokio::task::spawn_blocking(move || {
            Notification::new()
                .appname("depcomment")
                .summary(NOTIFICATION_SUMMARY)
                .body(&body)
                .show()
                .map(|_| ())
                .map_err(|err| AppError::Notification(err.to_string()))
        })
        .await
        .map_err(|err| AppError::Notification(format!("notification task failed: {err}")))?
    }
}
