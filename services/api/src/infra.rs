use internship_match::error::AppError;
use internship_match::workflows::matching::{EngineConfig, Fixture, InMemoryStore, MatchingService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type StoreService = MatchingService<InMemoryStore, InMemoryStore, InMemoryStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Read a fixture file; without a path the store starts empty.
pub(crate) fn load_fixture(path: Option<&Path>) -> Result<Fixture, AppError> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(Fixture::default()),
    }
}

pub(crate) fn build_service(
    fixture: Fixture,
    config: EngineConfig,
) -> Result<Arc<StoreService>, AppError> {
    let store = Arc::new(InMemoryStore::from_fixture(fixture)?);
    let service = MatchingService::new(store.clone(), store.clone(), store, config)?;
    Ok(Arc::new(service))
}
