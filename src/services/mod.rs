pub mod issue_tracker;
pub mod publisher;
pub mod version_control;

pub use issue_tracker::IssueTrackerService;
pub use publisher::{IssueCommentPublisher, ReportPublisher};
pub use version_control::ChangeSetSource;
