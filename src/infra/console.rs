use std::io::{self, Write};

use async_trait::async_trait;

use crate::domain::report::DeploymentReport;
use crate::error::AppResult;
use crate::services::ReportPublisher;

/// Writes the report markup to stdout.
pub struct ConsolePublisher;

#[async_trait]
impl ReportPublisher for ConsolePublisher {
    async fn publish(&self, report: &DeploymentReport) -> AppResult<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{report}")?;
        stdout.flush()?;
        Ok(())
    }
}
