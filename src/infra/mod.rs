pub mod console;
pub mod desktop;
pub mod git;
pub mod jira;
