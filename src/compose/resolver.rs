//! Dependency resolution of requested services

use crate::catalog::{Catalog, ServiceDefinition, CONTAINER_NAME_FIELD};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Length of the random suffix appended to generated container names
pub const CONTAINER_SUFFIX_LENGTH: usize = 10;

/// Resolved services by name, each with a generated container name
pub type ResolvedSet = BTreeMap<String, ServiceDefinition>;

/// Why a requested service was left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// No carbon file declares the service
    NotFound(String),
    /// The service depends on one that was not requested
    MissingDependency { service: String, dependency: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NotFound(name) => write!(f, "No carbon file found for: {}", name),
            Diagnostic::MissingDependency {
                service,
                dependency,
            } => write!(
                f,
                "'{}' depends on '{}' but '{}' is not provided",
                service, dependency, dependency
            ),
        }
    }
}

/// Outcome of a resolution pass
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Services safe to start
    pub services: ResolvedSet,
    /// Services that were left out, and why
    pub diagnostics: Vec<Diagnostic>,
}

/// Pick the requested services that can be started.
///
/// Unknown names are skipped. A service is skipped when any of its direct
/// dependencies was not requested too; dependencies are never pulled in
/// automatically. Only direct dependencies are checked: there is no
/// transitive closure and no cycle detection.
pub fn resolve(requested: &[String], catalog: &Catalog) -> Resolution {
    let mut resolution = Resolution::default();

    for name in requested {
        if resolution.services.contains_key(name) {
            continue;
        }

        let Some(found) = catalog.get(name) else {
            resolution
                .diagnostics
                .push(Diagnostic::NotFound(name.clone()));
            continue;
        };

        let missing: Vec<Diagnostic> = found
            .depends_on
            .iter()
            .filter(|dependency| !requested.contains(dependency))
            .map(|dependency| Diagnostic::MissingDependency {
                service: name.clone(),
                dependency: dependency.clone(),
            })
            .collect();

        if !missing.is_empty() {
            resolution.diagnostics.extend(missing);
            continue;
        }

        let mut service = found.clone();
        let container = container_name(name);
        service
            .fields
            .insert(CONTAINER_NAME_FIELD.to_string(), Value::String(container.clone()));
        service.container = Some(container);

        resolution.services.insert(name.clone(), service);
    }

    for diagnostic in &resolution.diagnostics {
        warn!("{}", diagnostic);
    }

    resolution
}

/// `<service>-<random suffix>`
pub fn container_name(service: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CONTAINER_SUFFIX_LENGTH)
        .map(char::from)
        .collect();

    format!("{}-{}", service, suffix)
}
