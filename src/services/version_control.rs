use async_trait::async_trait;

use crate::domain::change::ChangedPath;
use crate::error::AppResult;

/// Produces the working tree's change-set in one shot.
#[async_trait]
pub trait ChangeSetSource: Send + Sync {
    async fn scan(&self) -> AppResult<Vec<ChangedPath>>;
}
