use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::domain::report::{ApprovalOverrides, DeploymentReport};
use crate::error::{AppError, AppResult};
use crate::infra::console::ConsolePublisher;
use crate::infra::desktop::DesktopPublisher;
use crate::services::{IssueCommentPublisher, ReportPublisher};

#[derive(Debug, Clone, Default)]
pub struct ReportCommandArgs {
    pub issue: Option<String>,
    pub blocked: Vec<String>,
    pub timeout: Option<Duration>,
    pub notify: bool,
}

pub struct ReportOutcome {
    pub report: DeploymentReport,
    pub posted_to: Option<String>,
}

pub async fn run(
    ctx: &AppContext,
    args: ReportCommandArgs,
    cancel: CancellationToken,
) -> AppResult<ReportOutcome> {
    let overrides = ApprovalOverrides::block(
        ctx.config
            .blocked_services
            .iter()
            .cloned()
            .chain(args.blocked),
    );

    debug!(known_services = ctx.registry.len(), "building deployment report");
    let mut pipeline = ctx.report_pipeline();
    if let Some(timeout) = args.timeout {
        pipeline = pipeline.with_timeout(timeout);
    }
    let report = pipeline.build_report(&overrides, cancel.clone()).await?;

    if report.is_empty() {
        warn!("no registered services touched by the current changes");
    }

    let mut publishers: Vec<Arc<dyn ReportPublisher>> = vec![Arc::new(ConsolePublisher)];
    let issue = args
        .issue
        .or_else(|| ctx.config.default_issue.clone())
        .filter(|key| !key.trim().is_empty());
    if let Some(issue) = &issue {
        publishers.push(Arc::new(IssueCommentPublisher::new(
            ctx.issue_tracker.clone(),
            issue.clone(),
        )));
    }
    if args.notify {
        publishers.push(Arc::new(DesktopPublisher));
    }

    publish_all(&publishers, &report, &cancel).await?;

    Ok(ReportOutcome {
        report,
        posted_to: issue,
    })
}

/// Hands the report to each publisher in turn; stops at the first failure or on cancel.
async fn publish_all(
    publishers: &[Arc<dyn ReportPublisher>],
    report: &DeploymentReport,
    cancel: &CancellationToken,
) -> AppResult<()> {
    for publisher in publishers {
        tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            published = publisher.publish(report) => published?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::service::ServiceRegistry;

    #[derive(Default)]
    struct CountingPublisher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReportPublisher for CountingPublisher {
        async fn publish(&self, _report: &DeploymentReport) -> AppResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct HungPublisher;

    #[async_trait]
    impl ReportPublisher for HungPublisher {
        async fn publish(&self, _report: &DeploymentReport) -> AppResult<()> {
            std::future::pending().await
        }
    }

    fn empty_report() -> DeploymentReport {
        DeploymentReport::render(
            &BTreeSet::new(),
            &ServiceRegistry::default(),
            &ApprovalOverrides::new(),
        )
    }

    #[tokio::test]
    async fn publishes_to_every_sink() {
        let first = Arc::new(CountingPublisher::default());
        let second = Arc::new(CountingPublisher::default());
        let publishers: Vec<Arc<dyn ReportPublisher>> = vec![first.clone(), second.clone()];

        publish_all(&publishers, &empty_report(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn interrupt_stops_a_hung_publisher() {
        let after = Arc::new(CountingPublisher::default());
        let publishers: Vec<Arc<dyn ReportPublisher>> = vec![Arc::new(HungPublisher), after.clone()];
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = publish_all(&publishers, &empty_report(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(after.calls.load(Ordering::SeqCst), 0);
    }
}
