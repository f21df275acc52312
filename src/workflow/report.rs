use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::change::ChangedPath;
use crate::domain::report::{ApprovalOverrides, DeploymentReport};
use crate::domain::service::{ServiceName, ServiceRegistry, ServiceResolver};
use crate::error::{AppError, AppResult};
use crate::services::ChangeSetSource;

type ScanResult = AppResult<Vec<ChangedPath>>;
type ResolveResult = AppResult<BTreeSet<ServiceName>>;

/// Scans the working tree and resolves services on two tasks, then renders the report.
///
/// The scanner hands its complete path list to the resolver over a one-slot
/// channel; the resolver answers on a oneshot. Both stages stop as soon as the
/// build returns, whether it finished, timed out or was cancelled.
pub struct ReportPipeline {
    source: Arc<dyn ChangeSetSource>,
    resolver: ServiceResolver,
    registry: Arc<ServiceRegistry>,
    timeout: Duration,
}

impl ReportPipeline {
    pub fn new(
        source: Arc<dyn ChangeSetSource>,
        resolver: ServiceResolver,
        registry: Arc<ServiceRegistry>,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            resolver,
            registry,
            timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn build_report(
        &self,
        overrides: &ApprovalOverrides,
        cancel: CancellationToken,
    ) -> AppResult<DeploymentReport> {
        let stages = cancel.child_token();
        let _stop_stages = stages.clone().drop_guard();

        let (paths_tx, paths_rx) = mpsc::channel::<ScanResult>(1);
        let (services_tx, services_rx) = oneshot::channel::<ResolveResult>();

        tokio::spawn(scan_stage(self.source.clone(), paths_tx, stages.clone()));
        tokio::spawn(resolve_stage(
            self.resolver.clone(),
            paths_rx,
            services_tx,
            stages,
        ));

        let services = tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            waited = tokio::time::timeout(self.timeout, services_rx) => match waited {
                Ok(Ok(resolved)) => resolved?,
                Ok(Err(_)) => {
                    return Err(AppError::Pipeline(
                        "resolver stopped before delivering services".to_string(),
                    ));
                }
                Err(_) => return Err(AppError::Timeout(self.timeout)),
            },
        };

        debug!(services = services.len(), "rendering deployment report");
        Ok(DeploymentReport::render(&services, &self.registry, overrides))
    }
}

async fn scan_stage(
    source: Arc<dyn ChangeSetSource>,
    paths_tx: mpsc::Sender<ScanResult>,
    cancel: CancellationToken,
) {
    debug!("scanning change-set");
    let scanned = tokio::select! {
        _ = cancel.cancelled() => return,
        scanned = source.scan() => scanned,
    };
    if paths_tx.send(scanned).await.is_err() {
        debug!("resolver gone before change-set handoff");
    }
}

async fn resolve_stage(
    resolver: ServiceResolver,
    mut paths_rx: mpsc::Receiver<ScanResult>,
    services_tx: oneshot::Sender<ResolveResult>,
    cancel: CancellationToken,
) {
    let received = tokio::select! {
        _ = cancel.cancelled() => return,
        received = paths_rx.recv() => received,
    };

    let resolved = match received {
        Some(Ok(paths)) => {
            let services = resolver.resolve(&paths);
            debug!(
                paths = paths.len(),
                services = services.len(),
                "resolved changed services"
            );
            Ok(services)
        }
        Some(Err(err)) => Err(err),
        None => Err(AppError::Pipeline(
            "scanner stopped without handing off changes".to_string(),
        )),
    };

    if services_tx.send(resolved).is_err() {
        debug!("orchestrator gone before services handoff");
    }
}
