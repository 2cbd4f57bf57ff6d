use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::AppEnvironment;

use super::document::TasklistConfig;
use super::error::TasklistError;
use super::generator::{TasklistGenerator, TasklistView};
use super::loader::TasklistLoader;
use super::store::{ApplicantState, ApplicantStateStore, StateKey, TasklistStore};

/// Service composing the document loader, the applicant state store, and the
/// status engine.
pub struct TasklistService<S, A> {
    loader: TasklistLoader<S>,
    state: Arc<A>,
}

impl<S, A> TasklistService<S, A>
where
    S: TasklistStore + 'static,
    A: ApplicantStateStore + 'static,
{
    pub fn new(store: Arc<S>, state: Arc<A>, environment: AppEnvironment) -> Self {
        Self {
            loader: TasklistLoader::new(store, environment),
            state,
        }
    }

    /// Load and validate a tasklist without rendering it.
    pub fn validate(&self, tasklist_id: &str) -> Result<TasklistConfig, TasklistError> {
        self.loader.load_config(tasklist_id)
    }

    /// Render a tasklist for a session, or for a fresh applicant when no session is given.
    pub fn render(
        &self,
        tasklist_id: &str,
        session_id: Option<&str>,
    ) -> Result<TasklistView, TasklistError> {
        let config = self.loader.load_config(tasklist_id)?;
        let state = match session_id {
            Some(session_id) => self.state_or_default(&StateKey::new(session_id, tasklist_id)),
            None => ApplicantState::default(),
        };

        let data = Value::Object(state.data);
        TasklistGenerator::new(&config).generate_tasklist(&data, &state.visited_sub_sections)
    }

    /// Marks a subsection as opened so it renders as in progress.
    pub fn record_visit(
        &self,
        tasklist_id: &str,
        session_id: &str,
        subsection_id: &str,
    ) -> Result<(), TasklistError> {
        self.ensure_subsection(tasklist_id, subsection_id)?;

        let key = StateKey::new(session_id, tasklist_id);
        let mut state = self.state.fetch(&key)?.unwrap_or_default();
        state.mark_visited(subsection_id);
        self.state.save(&key, state)?;
        Ok(())
    }

    /// Stores a subsection's answers, which completes it.
    pub fn record_answers(
        &self,
        tasklist_id: &str,
        session_id: &str,
        subsection_id: &str,
        answers: Value,
    ) -> Result<(), TasklistError> {
        self.ensure_subsection(tasklist_id, subsection_id)?;

        let key = StateKey::new(session_id, tasklist_id);
        let mut state = self.state.fetch(&key)?.unwrap_or_default();
        state.record_answers(subsection_id, answers);
        self.state.save(&key, state)?;

        info!(tasklist_id, subsection_id, "recorded subsection answers");
        Ok(())
    }

    fn ensure_subsection(
        &self,
        tasklist_id: &str,
        subsection_id: &str,
    ) -> Result<(), TasklistError> {
        let config = self.loader.load_config(tasklist_id)?;
        if config.find_subsection(subsection_id).is_none() {
            return Err(TasklistError::UnknownSubsection {
                tasklist_id: tasklist_id.to_string(),
                subsection_id: subsection_id.to_string(),
            });
        }
        Ok(())
    }

    fn state_or_default(&self, key: &StateKey) -> ApplicantState {
        match self.state.fetch(key) {
            Ok(state) => state.unwrap_or_default(),
            Err(err) => {
                warn!(
                    session_id = %key.session_id,
                    tasklist_id = %key.tasklist_id,
                    error = %err,
                    "applicant state unavailable, rendering with empty state"
                );
                ApplicantState::default()
            }
        }
    }
}
