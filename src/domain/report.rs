use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::domain::service::{ServiceName, ServiceRegistry};

pub const REPORT_HEADER: &str =
    "h1. >>>>>>>>>>>>>>>>>>>> DEPLOYMENT COMMENT <<<<<<<<<<<<<<<<<<<\n";
pub const REPORT_FOOTER: &str =
    "h1. >>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>><<<<<<<<<<<<<<<<<<<<<<<<<<<<";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalMark {
    Approved,
    Blocked,
}

impl ApprovalMark {
    /// Jira wiki markup emoticon for the mark.
    pub fn glyph(&self) -> &'static str {
        match self {
            ApprovalMark::Approved => "(/)",
            ApprovalMark::Blocked => "(x)",
        }
    }
}

/// Caller-supplied marks that replace the default approval for specific services.
#[derive(Debug, Clone, Default)]
pub struct ApprovalOverrides(HashMap<ServiceName, ApprovalMark>);

impl ApprovalOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut overrides = Self::new();
        for name in names {
            overrides.set(ServiceName::new(name), ApprovalMark::Blocked);
        }
        overrides
    }

    pub fn set(&mut self, service: ServiceName, mark: ApprovalMark) {
        self.0.insert(service, mark);
    }

    pub fn mark_for(&self, service: &ServiceName) -> ApprovalMark {
        self.0
            .get(service)
            .copied()
            .unwrap_or(ApprovalMark::Approved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub service: ServiceName,
    pub mark: ApprovalMark,
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "h3. {} {}", self.service, self.mark.glyph())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    rows: Vec<ReportRow>,
}

impl DeploymentReport {
    /// Builds one row per detected service that the registry knows about.
    pub fn render(
        detected: &BTreeSet<ServiceName>,
        registry: &ServiceRegistry,
        overrides: &ApprovalOverrides,
    ) -> Self {
        let rows = detected
            .iter()
            .filter(|service| registry.contains(service))
            .map(|service| ReportRow {
                service: service.clone(),
                mark: overrides.mark_for(service),
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_markup(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DeploymentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REPORT_HEADER)?;
        for row in &self.rows {
            write!(f, "{row}")?;
        }
        f.write_str(REPORT_FOOTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detected(names: &[&str]) -> BTreeSet<ServiceName> {
        names.iter().map(|n| ServiceName::new(*n)).collect()
    }

    #[test]
    fn drops_services_missing_from_registry() {
        let registry = ServiceRegistry::new(["svcA"]);
        let report = DeploymentReport::render(
            &detected(&["svcA", "unknown"]),
            &registry,
            &ApprovalOverrides::new(),
        );

        assert_eq!(report.rows().len(), 1);
        assert_eq!(report.rows()[0].service.as_str(), "svcA");
        assert_eq!(
            report.to_markup(),
            format!("{REPORT_HEADER}h3. svcA (/)\n{REPORT_FOOTER}")
        );
    }

    #[test]
    fn empty_detection_renders_only_banners() {
        let report = DeploymentReport::render(
            &BTreeSet::new(),
            &ServiceRegistry::default(),
            &ApprovalOverrides::new(),
        );
        assert!(report.is_empty());
        assert_eq!(report.to_markup(), format!("{REPORT_HEADER}{REPORT_FOOTER}"));
    }

    #[test]
    fn overrides_block_individual_services() {
        let registry = ServiceRegistry::new(["svcA", "svcB"]);
        let overrides = ApprovalOverrides::block(["svcB", "svcZ"]);
        let report = DeploymentReport::render(&detected(&["svcB", "svcA"]), &registry, &overrides);

        assert_eq!(
            report.to_markup(),
            format!("{REPORT_HEADER}h3. svcA (/)\nh3. svcB (x)\n{REPORT_FOOTER}")
        );
    }

    #[test]
    fn glyphs_differ_per_mark() {
        assert_ne!(ApprovalMark::Approved.glyph(), ApprovalMark::Blocked.glyph());
    }
}
