use async_trait::async_trait;

use crate::domain::comment::IssueComment;
use crate::error::AppResult;

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    async fn list_comments(&self, issue_key: &str) -> AppResult<Vec<IssueComment>>;
    async fn add_comment(&self, issue_key: &str, body: &str) -> AppResult<IssueComment>;
}
