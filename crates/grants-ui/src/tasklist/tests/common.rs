use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::AppEnvironment;
use crate::tasklist::document::TasklistConfig;
use crate::tasklist::loader::parse_config;
use crate::tasklist::service::TasklistService;
use crate::tasklist::store::{
    ApplicantState, ApplicantStateStore, DocumentError, StateKey, StateStoreError, TasklistStore,
};
use crate::tasklist::tasklist_router;

pub(super) const EXAMPLE_YAML: &str = r#"
tasklist:
  id: ex
  title: Example Tasklist
  sections:
    - id: s1
      title: Section 1
      subsections:
        - id: sub1
          title: Subsection 1
          href: /subsection1
        - id: sub2
          title: Subsection 2
          dependsOn: [sub1]
"#;

/// A fuller journey exercising conditions, optional entries and status rules.
pub(super) const FARMING_YAML: &str = r#"
tasklist:
  id: farming
  title: Farming grant
  closingDate: 31 March 2026
  helpText: Complete each section before you submit.
  sections:
    - id: about
      title: About your farm
      subsections:
        - id: business-details
          title: Business details
        - id: land-details
          title: Land details
          href: select-land-parcel
          dependsOn: [business-details]
        - id: livestock
          title: Livestock
          required: false
          condition: has-livestock
    - id: apply
      title: Apply
      subsections:
        - id: actions
          title: Choose actions
          dependsOn:
            allOf: [land-details, livestock]
        - id: check-answers
          title: Check your answers
conditions:
  has-livestock:
    type: conditional
    rules:
      - if:
          field: business-details.livestock
          equals: true
        then: not_yet_started
      - if:
          field: business-details.livestock
          exists: false
        then: cannot_start_yet
    default: hidden
statusRules:
  check-answers:
    type: allComplete
    dependsOn: [business-details, land-details, livestock, actions]
"#;

pub(super) fn config_from(yaml: &str) -> TasklistConfig {
    let document = serde_yaml::from_str(yaml).expect("fixture is valid yaml");
    parse_config(document, None).expect("fixture is a valid tasklist")
}

pub(super) fn visited(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[derive(Default)]
pub(super) struct MemoryStore {
    documents: HashMap<String, String>,
}

impl MemoryStore {
    pub(super) fn with_document(mut self, key: &str, yaml: &str) -> Self {
        self.documents.insert(key.to_string(), yaml.to_string());
        self
    }
}

impl TasklistStore for MemoryStore {
    fn read(&self, key: &str) -> Result<String, DocumentError> {
        self.documents
            .get(key)
            .cloned()
            .ok_or_else(|| DocumentError::Missing(key.to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryState {
    states: Mutex<HashMap<StateKey, ApplicantState>>,
}

impl MemoryState {
    pub(super) fn get(&self, key: &StateKey) -> Option<ApplicantState> {
        self.states.lock().expect("state mutex poisoned").get(key).cloned()
    }
}

impl ApplicantStateStore for MemoryState {
    fn fetch(&self, key: &StateKey) -> Result<Option<ApplicantState>, StateStoreError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &StateKey, state: ApplicantState) -> Result<(), StateStoreError> {
        self.states
            .lock()
            .expect("state mutex poisoned")
            .insert(key.clone(), state);
        Ok(())
    }
}

pub(super) struct UnavailableState;

impl ApplicantStateStore for UnavailableState {
    fn fetch(&self, _key: &StateKey) -> Result<Option<ApplicantState>, StateStoreError> {
        Err(StateStoreError::Unavailable("cache offline".to_string()))
    }

    fn save(&self, _key: &StateKey, _state: ApplicantState) -> Result<(), StateStoreError> {
        Err(StateStoreError::Unavailable("cache offline".to_string()))
    }
}

pub(super) fn store() -> MemoryStore {
    MemoryStore::default()
        .with_document("ex-tasklist", EXAMPLE_YAML)
        .with_document("farming-tasklist", FARMING_YAML)
        .with_document("broken-tasklist", "tasklist:\n  title: No id\n  sections: []\n")
        .with_document("garbled-tasklist", "tasklist: [unclosed\n")
}

pub(super) fn build_service() -> (TasklistService<MemoryStore, MemoryState>, Arc<MemoryState>) {
    let state = Arc::new(MemoryState::default());
    let service = TasklistService::new(
        Arc::new(store()),
        state.clone(),
        AppEnvironment::Development,
    );
    (service, state)
}

pub(super) fn router_with_service(
    service: TasklistService<MemoryStore, MemoryState>,
) -> axum::Router {
    tasklist_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
