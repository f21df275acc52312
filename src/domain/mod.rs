pub mod change;
pub mod comment;
pub mod report;
pub mod service;
