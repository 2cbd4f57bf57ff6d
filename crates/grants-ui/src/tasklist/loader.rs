use std::sync::Arc;

use serde_yaml::Value as YamlValue;
use tracing::{debug, warn};

use crate::config::AppEnvironment;

use super::document::TasklistConfig;
use super::error::{TasklistError, ValidationError};
use super::store::TasklistStore;

/// Key under which a tasklist's document is stored.
pub fn document_key(tasklist_id: &str) -> String {
    format!("{tasklist_id}-tasklist")
}

/// Reads, gates, validates and decodes tasklist documents.
///
/// Nothing is cached: every call goes back to the store, so a request always
/// sees the document as currently deployed.
pub struct TasklistLoader<S> {
    store: Arc<S>,
    environment: AppEnvironment,
}

impl<S> TasklistLoader<S>
where
    S: TasklistStore,
{
    pub fn new(store: Arc<S>, environment: AppEnvironment) -> Self {
        Self { store, environment }
    }

    /// Reads and parses the raw document, applying the production gate.
    pub fn load_document(&self, tasklist_id: &str) -> Result<YamlValue, TasklistError> {
        let key = document_key(tasklist_id);
        let not_found = |message: String| TasklistError::NotFound {
            tasklist_id: tasklist_id.to_string(),
            message,
        };

        let contents = self
            .store
            .read(&key)
            .map_err(|err| not_found(err.to_string()))?;
        let document: YamlValue = serde_yaml::from_str(&contents)
            .map_err(|err| not_found(format!("document '{key}' is not valid YAML: {err}")))?;

        if self.environment.is_production() && !enabled_in_prod(&document) {
            warn!(tasklist_id, "tasklist requested in production but not enabled");
            return Err(not_found("tasklist is not enabled".to_string()));
        }

        Ok(document)
    }

    pub fn load_config(&self, tasklist_id: &str) -> Result<TasklistConfig, TasklistError> {
        let document = self.load_document(tasklist_id)?;
        let config = parse_config(document, Some(tasklist_id))?;
        debug!(
            tasklist_id,
            sections = config.tasklist.sections.len(),
            "loaded tasklist config"
        );
        Ok(config)
    }
}

fn enabled_in_prod(document: &YamlValue) -> bool {
    document
        .get("metadata")
        .and_then(|metadata| metadata.get("enabledInProd"))
        .and_then(YamlValue::as_bool)
        == Some(true)
}

/// Validates the document structure, then decodes it into typed form.
pub fn parse_config(
    document: YamlValue,
    tasklist_id: Option<&str>,
) -> Result<TasklistConfig, ValidationError> {
    validate_config(&document, tasklist_id)?;
    serde_yaml::from_value(document).map_err(|err| {
        ValidationError::new(tasklist_id, format!("Invalid tasklist config: {err}"))
    })
}

/// Checks the structural requirements of a tasklist document, stopping at the
/// first defect.
pub fn validate_config(
    document: &YamlValue,
    tasklist_id: Option<&str>,
) -> Result<(), ValidationError> {
    let fail = |message: String| Err(ValidationError::new(tasklist_id, message));

    let Some(tasklist) = document.get("tasklist").filter(|value| is_present(value)) else {
        return fail("Missing tasklist root element in config".to_string());
    };
    if !has_value(tasklist, "id") {
        return fail("Tasklist config must have an id".to_string());
    }
    if !has_value(tasklist, "title") {
        return fail("Tasklist config must have a title".to_string());
    }
    let Some(sections) = tasklist.get("sections").and_then(YamlValue::as_sequence) else {
        return fail("Tasklist config must have sections array".to_string());
    };

    for (index, section) in sections.iter().enumerate() {
        let Some(section_id) = section.get("id").filter(|value| is_present(value)) else {
            return fail(format!("Section at index {index} must have an id"));
        };
        let section_id = scalar_text(section_id);
        if !has_value(section, "title") {
            return fail(format!("Section '{section_id}' must have a title"));
        }
        let Some(subsections) = section.get("subsections").and_then(YamlValue::as_sequence)
        else {
            return fail(format!("Section '{section_id}' must have subsections array"));
        };

        for (position, subsection) in subsections.iter().enumerate() {
            let Some(subsection_id) = subsection.get("id").filter(|value| is_present(value))
            else {
                return fail(format!(
                    "Subsection at index {position} in section '{section_id}' must have an id"
                ));
            };
            if !has_value(subsection, "title") {
                return fail(format!(
                    "Subsection '{}' must have a title",
                    scalar_text(subsection_id)
                ));
            }
        }
    }

    Ok(())
}

fn has_value(node: &YamlValue, key: &str) -> bool {
    node.get(key).is_some_and(is_present)
}

/// Null, empty strings, `false` and zero all count as absent.
fn is_present(value: &YamlValue) -> bool {
    match value {
        YamlValue::Null => false,
        YamlValue::Bool(flag) => *flag,
        YamlValue::String(text) => !text.is_empty(),
        YamlValue::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}

fn scalar_text(value: &YamlValue) -> String {
    match value {
        YamlValue::String(text) => text.clone(),
        YamlValue::Number(number) => number.to_string(),
        YamlValue::Bool(flag) => flag.to_string(),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim().to_string())
            .unwrap_or_default(),
    }
}
