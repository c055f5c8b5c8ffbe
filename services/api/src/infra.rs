use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use ticket_audit::audit::{AuditConfig, ReferenceData};
use ticket_audit::config::AuditPaths;
use ticket_audit::error::AppError;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) audit: Arc<AuditDefaults>,
}

/// Audit settings resolved at startup and shared by every request.
#[derive(Debug, Clone)]
pub(crate) struct AuditDefaults {
    pub(crate) paths: AuditPaths,
    pub(crate) config: AuditConfig,
}

impl AuditDefaults {
    pub(crate) fn from_paths(paths: AuditPaths) -> Result<Self, AppError> {
        let config = load_audit_config(paths.rules_config.as_deref())?;
        Ok(Self { paths, config })
    }

    /// Reference tables are re-read per batch so edits to the mapping files apply without a
    /// restart.
    pub(crate) fn reference(&self) -> ReferenceData {
        ReferenceData::load(&self.paths.tower_map, &self.paths.category_map)
    }
}

pub(crate) fn load_audit_config(path: Option<&Path>) -> Result<AuditConfig, AppError> {
    match path {
        Some(path) => {
            let config = AuditConfig::from_path(path)?;
            info!(
                path = %path.display(),
                rules = config.selected_rules.len(),
                "audit configuration loaded"
            );
            Ok(config)
        }
        None => Ok(AuditConfig::default()),
    }
}
