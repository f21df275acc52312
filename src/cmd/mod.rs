pub mod config;
pub mod login;
pub mod report;
