use std::collections::BTreeSet;
use std::fmt;

use tracing::trace;

use crate::domain::change::ChangedPath;

pub const DEFAULT_SERVICES: [&str; 6] = [
    "ActivityHistoryService",
    "ConverterService",
    "ManagerService",
    "NativeEditService",
    "RestAPIService",
    "WebSocketConnectionService",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The services a report may mention. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistry {
    services: BTreeSet<ServiceName>,
}

impl ServiceRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let services = names
            .into_iter()
            .map(Into::into)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .map(ServiceName)
            .collect();
        Self { services }
    }

    pub fn contains(&self, service: &ServiceName) -> bool {
        self.services.contains(service)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICES)
    }
}

/// Maps changed paths to the service directories that contain them.
#[derive(Debug, Clone, Default)]
pub struct ServiceResolver {
    services_root: Option<String>,
}

impl ServiceResolver {
    pub fn new(services_root: Option<String>) -> Self {
        let services_root = services_root
            .map(|root| root.trim().trim_matches('/').to_string())
            .filter(|root| !root.is_empty());
        Self { services_root }
    }

    pub fn resolve(&self, paths: &[ChangedPath]) -> BTreeSet<ServiceName> {
        paths
            .iter()
            .filter_map(|path| {
                let service = self.service_of(path.as_str());
                if service.is_none() {
                    trace!(%path, "path does not belong to a service");
                }
                service
            })
            .collect()
    }

    fn service_of(&self, path: &str) -> Option<ServiceName> {
        // Untracked directories are reported as a single `name/` entry.
        let is_directory = path.ends_with('/');
        let mut segments = path.split('/').filter(|s| !s.is_empty() && *s != ".");

        if let Some(root) = &self.services_root {
            for expected in root.split('/') {
                if segments.next()? != expected {
                    return None;
                }
            }
        }

        let service = segments.next()?;
        // A file must sit below the service directory to belong to it.
        if !is_directory {
            segments.next()?;
        }
        Some(ServiceName::new(service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(paths: &[&str]) -> Vec<ChangedPath> {
        paths.iter().filter_map(|p| ChangedPath::new(*p)).collect()
    }

    fn names(set: &BTreeSet<ServiceName>) -> Vec<&str> {
        set.iter().map(ServiceName::as_str).collect()
    }

    #[test]
    fn top_level_files_belong_to_no_service() {
        let resolver = ServiceResolver::default();
        assert!(resolver.resolve(&changed(&["file.go"])).is_empty());
    }

    #[test]
    fn first_directory_names_the_service() {
        let resolver = ServiceResolver::default();
        let services = resolver.resolve(&changed(&["svcA/file.go"]));
        assert_eq!(names(&services), vec!["svcA"]);
    }

    #[test]
    fn duplicates_collapse_regardless_of_order() {
        let resolver = ServiceResolver::default();
        let forward = changed(&["b/x.go", "a/deep/y.go", "b/z.go", "top.md"]);
        let mut reversed = forward.clone();
        reversed.reverse();

        let first = resolver.resolve(&forward);
        assert_eq!(names(&first), vec!["a", "b"]);
        assert_eq!(first, resolver.resolve(&reversed));
        assert_eq!(first, resolver.resolve(&forward));
    }

    #[test]
    fn services_root_is_stripped_and_enforced() {
        let resolver = ServiceResolver::new(Some("/services/".to_string()));
        let services = resolver.resolve(&changed(&[
            "services/ManagerService/handler.go",
            "services/README.md",
            "docs/ConverterService/notes.md",
        ]));
        assert_eq!(names(&services), vec!["ManagerService"]);
    }

    #[test]
    fn ignores_empty_and_dot_segments() {
        let resolver = ServiceResolver::default();
        let services = resolver.resolve(&changed(&["./svcA//file.go", "/"]));
        assert_eq!(names(&services), vec!["svcA"]);
    }

    #[test]
    fn untracked_directory_names_the_service() {
        let resolver = ServiceResolver::default();
        let services = resolver.resolve(&changed(&["NewService/", "notes/"]));
        assert_eq!(names(&services), vec!["NewService", "notes"]);

        let rooted = ServiceResolver::new(Some("services".to_string()));
        let services = rooted.resolve(&changed(&["services/", "services/Billing/"]));
        assert_eq!(names(&services), vec!["Billing"]);
    }

    #[test]
    fn registry_ignores_blank_names() {
        let registry = ServiceRegistry::new(["svcA", " ", " svcB "]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&ServiceName::new("svcB")));
        assert_eq!(ServiceRegistry::default().len(), DEFAULT_SERVICES.len());
    }
}
