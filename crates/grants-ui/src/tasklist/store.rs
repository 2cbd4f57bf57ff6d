use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Source of raw tasklist documents, keyed `"{tasklistId}-tasklist"`.
pub trait TasklistStore: Send + Sync {
    fn read(&self, key: &str) -> Result<String, DocumentError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document '{0}' does not exist")]
    Missing(String),
    #[error("document '{key}' could not be read: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

/// Reads `<root>/<key>.yaml` (falling back to `.yml`).
#[derive(Debug, Clone)]
pub struct FileTasklistStore {
    root: PathBuf,
}

impl FileTasklistStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, key: &str) -> [PathBuf; 2] {
        [
            self.root.join(format!("{key}.yaml")),
            self.root.join(format!("{key}.yml")),
        ]
    }
}

impl TasklistStore for FileTasklistStore {
    fn read(&self, key: &str) -> Result<String, DocumentError> {
        if key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(DocumentError::Missing(key.to_string()));
        }

        for path in self.candidates(key) {
            match std::fs::read_to_string(&path) {
                Ok(contents) => return Ok(contents),
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(DocumentError::Io {
                        key: key.to_string(),
                        source,
                    })
                }
            }
        }

        Err(DocumentError::Missing(key.to_string()))
    }
}

/// Identifies one applicant's progress through one tasklist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    pub session_id: String,
    pub tasklist_id: String,
}

impl StateKey {
    pub fn new(session_id: impl Into<String>, tasklist_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            tasklist_id: tasklist_id.into(),
        }
    }
}

/// Saved answers plus the subsections opened but not yet completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantState {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub visited_sub_sections: Vec<String>,
}

impl ApplicantState {
    pub fn mark_visited(&mut self, subsection_id: &str) {
        if !self.visited_sub_sections.iter().any(|id| id == subsection_id) {
            self.visited_sub_sections.push(subsection_id.to_string());
        }
    }

    pub fn record_answers(&mut self, subsection_id: &str, answers: Value) {
        self.data.insert(subsection_id.to_string(), answers);
        self.visited_sub_sections.retain(|id| id != subsection_id);
    }
}

/// Session-backed persistence for applicant state.
pub trait ApplicantStateStore: Send + Sync {
    fn fetch(&self, key: &StateKey) -> Result<Option<ApplicantState>, StateStoreError>;
    fn save(&self, key: &StateKey, state: ApplicantState) -> Result<(), StateStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StateStoreError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),
}
