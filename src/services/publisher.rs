use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::report::DeploymentReport;
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

/// Destination for a finished report.
#[async_trait]
pub trait ReportPublisher: Send + Sync {
    async fn publish(&self, report: &DeploymentReport) -> AppResult<()>;
}

/// Posts the report as a comment on a single issue, skipping it if an identical
/// comment is already there.
pub struct IssueCommentPublisher {
    tracker: Arc<dyn IssueTrackerService>,
    issue_key: String,
}

impl IssueCommentPublisher {
    pub fn new(tracker: Arc<dyn IssueTrackerService>, issue_key: impl Into<String>) -> Self {
        Self {
            tracker,
            issue_key: issue_key.into(),
        }
    }
}

#[async_trait]
impl ReportPublisher for IssueCommentPublisher {
    async fn publish(&self, report: &DeploymentReport) -> AppResult<()> {
        let issue_key = self.issue_key.trim();
        if issue_key.is_empty() {
            return Err(AppError::IssueTracker(
                "issue key must not be empty".to_string(),
            ));
        }

        let body = report.to_markup();
        let existing = self.tracker.list_comments(issue_key).await?;
        if existing.iter().any(|comment| comment.body.trim() == body.trim()) {
            info!(issue = issue_key, "identical deployment comment already posted");
            return Ok(());
        }

        let comment = self.tracker.add_comment(issue_key, &body).await?;
        info!(
            issue = issue_key,
            comment = %comment.id,
            url = comment.url.as_deref(),
            "posted deployment comment"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use super::*;
    use crate::domain::comment::IssueComment;
    use crate::domain::report::ApprovalOverrides;
    use crate::domain::service::{ServiceName, ServiceRegistry};

    #[derive(Default)]
    struct RecordingTracker {
        comments: Mutex<Vec<IssueComment>>,
    }

    #[async_trait]
    impl IssueTrackerService for RecordingTracker {
        async fn list_comments(&self, _issue_key: &str) -> AppResult<Vec<IssueComment>> {
            Ok(self.comments.lock().unwrap().clone())
        }

        async fn add_comment(&self, _issue_key: &str, body: &str) -> AppResult<IssueComment> {
            let mut comments = self.comments.lock().unwrap();
            let comment = IssueComment {
                id: comments.len().to_string(),
                body: body.to_string(),
                url: None,
            };
            comments.push(comment.clone());
            Ok(comment)
        }
    }

    fn sample_report() -> DeploymentReport {
        let detected: BTreeSet<_> = [ServiceName::new("ManagerService")].into_iter().collect();
        DeploymentReport::render(
            &detected,
            &ServiceRegistry::default(),
            &ApprovalOverrides::new(),
        )
    }

    #[tokio::test]
    async fn posts_report_once() {
        let tracker = Arc::new(RecordingTracker::default());
        let publisher = IssueCommentPublisher::new(tracker.clone(), "DEP-7");
        let report = sample_report();

        publisher.publish(&report).await.unwrap();
        publisher.publish(&report).await.unwrap();

        let comments = tracker.comments.lock().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, report.to_markup());
    }

    #[tokio::test]
    async fn rejects_blank_issue_key() {
        let tracker = Arc::new(RecordingTracker::default());
        let publisher = IssueCommentPublisher::new(tracker, "  ");
        let err = publisher.publish(&sample_report()).await.unwrap_err();
        assert!(matches!(err, AppError::IssueTracker(_)));
    }
}
