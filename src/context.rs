use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::service::{ServiceRegistry, ServiceResolver};
use crate::services::{ChangeSetSource, IssueTrackerService};
use crate::workflow::report::ReportPipeline;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub registry: Arc<ServiceRegistry>,
    pub version_control: Arc<dyn ChangeSetSource>,
    pub issue_tracker: Arc<dyn IssueTrackerService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        version_control: Arc<dyn ChangeSetSource>,
        issue_tracker: Arc<dyn IssueTrackerService>,
    ) -> Self {
        let registry = Arc::new(config.registry.clone());
        Self {
            config,
            registry,
            version_control,
            issue_tracker,
        }
    }

    pub fn report_pipeline(&self) -> ReportPipeline {
        ReportPipeline::new(
            self.version_control.clone(),
            ServiceResolver::new(self.config.services_root.clone()),
            self.registry.clone(),
            self.config.scan_timeout,
        )
    }
}
