use grants_ui::tasklist::{ApplicantState, ApplicantStateStore, StateKey, StateStoreError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local session state. Progress is lost on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicantStateStore {
    states: Arc<Mutex<HashMap<StateKey, ApplicantState>>>,
}

impl ApplicantStateStore for InMemoryApplicantStateStore {
    fn fetch(&self, key: &StateKey) -> Result<Option<ApplicantState>, StateStoreError> {
        let guard = self.states.lock().map_err(poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn save(&self, key: &StateKey, state: ApplicantState) -> Result<(), StateStoreError> {
        let mut guard = self.states.lock().map_err(poisoned)?;
        guard.insert(key.clone(), state);
        Ok(())
    }
}

fn poisoned<T>(_: T) -> StateStoreError {
    StateStoreError::Unavailable("applicant state mutex poisoned".to_string())
}
