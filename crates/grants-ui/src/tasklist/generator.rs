use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::document::{DependsOn, StatusRule, StatusRuleKind, Subsection, TasklistConfig};
use super::error::TasklistError;
use super::evaluator::ConditionEvaluator;
use super::status::{DisplayStatus, TaskListStatus};

/// Computed status for every subsection and status rule, keyed by id.
pub type StatusMap = HashMap<String, TaskListStatus>;

/// Render model consumed by the task list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TasklistView {
    pub page_heading: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub title: String,
    pub subsections: Vec<SubsectionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsectionView {
    pub title: TitleText,
    pub href: Option<String>,
    pub status: DisplayStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleText {
    pub text: String,
}

/// Turns a loaded tasklist config plus applicant state into a render model.
pub struct TasklistGenerator<'c> {
    config: &'c TasklistConfig,
}

impl<'c> TasklistGenerator<'c> {
    pub fn new(config: &'c TasklistConfig) -> Self {
        Self { config }
    }

    /// `data` may be null (treated as no answers) or an object keyed by subsection id.
    pub fn generate_tasklist(
        &self,
        data: &Value,
        visited: &[String],
    ) -> Result<TasklistView, TasklistError> {
        let empty = Map::new();
        let data = match data {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(TasklistError::Generation {
                    tasklist_id: self.config.tasklist.id.clone(),
                    message: format!("applicant data must be an object, got {}", kind_of(other)),
                })
            }
        };

        let evaluator = ConditionEvaluator::new(data, visited);
        let statuses = self.determine_statuses(&evaluator);
        let sections = self.apply_section_statuses(&statuses)?;

        debug!(
            tasklist_id = %self.config.tasklist.id,
            answered = data.len(),
            visited = visited.len(),
            "generated tasklist"
        );

        Ok(TasklistView {
            page_heading: self.config.tasklist.title.clone(),
            closing_date: self.config.tasklist.closing_date.clone(),
            help_text: self.config.tasklist.help_text.clone(),
            sections,
        })
    }

    /// Subsections first, in document order, then status rules in declaration
    /// order. Each entry only sees the statuses computed before it.
    pub fn determine_statuses(&self, evaluator: &ConditionEvaluator<'_>) -> StatusMap {
        let mut statuses = StatusMap::new();

        for subsection in self.config.subsections() {
            let status = self.subsection_status(subsection, evaluator, &statuses);
            statuses.insert(subsection.id.clone(), status);
        }

        for (id, rule) in self.config.status_rules.iter() {
            let status = self.evaluate_status_rule(id, rule, &statuses, evaluator);
            statuses.insert(id.to_string(), status);
        }

        statuses
    }

    pub fn subsection_status(
        &self,
        subsection: &Subsection,
        evaluator: &ConditionEvaluator<'_>,
        statuses: &StatusMap,
    ) -> TaskListStatus {
        if evaluator.is_completed(&subsection.id) {
            return TaskListStatus::Completed;
        }
        if evaluator.is_visited(&subsection.id) {
            return TaskListStatus::InProgress;
        }

        if let Some(condition) = &subsection.condition {
            let spec = self.config.conditions.get(condition);
            match evaluator.evaluate_condition(condition, spec) {
                Ok(Some(status)) => return status,
                Ok(None) => {}
                Err(err) => warn!(
                    subsection_id = %subsection.id,
                    condition = %condition,
                    error = %err,
                    "condition evaluation failed, using default status"
                ),
            }
        }

        if let Some(depends_on) = &subsection.depends_on {
            if !Self::check_dependencies(depends_on, statuses) {
                return TaskListStatus::CannotStartYet;
            }
        }

        if subsection.is_required() {
            TaskListStatus::NotYetStarted
        } else {
            TaskListStatus::Hidden
        }
    }

    /// Dependencies checked against computed statuses. Ids without a status yet
    /// are unmet. `noneOf` only constrains condition dependencies, which look at
    /// raw answers; here it imposes nothing.
    pub fn check_dependencies(depends_on: &DependsOn, statuses: &StatusMap) -> bool {
        let status_of = |id: &String| statuses.get(id).copied();

        match depends_on {
            DependsOn::AllOf(ids) => ids
                .iter()
                .all(|id| status_of(id).is_some_and(TaskListStatus::satisfies_dependency)),
            DependsOn::AnyOf(ids) => ids
                .iter()
                .any(|id| status_of(id) == Some(TaskListStatus::Completed)),
            DependsOn::NoneOf(_) | DependsOn::Unconstrained => true,
        }
    }

    pub fn evaluate_status_rule(
        &self,
        id: &str,
        rule: &StatusRule,
        statuses: &StatusMap,
        evaluator: &ConditionEvaluator<'_>,
    ) -> TaskListStatus {
        if evaluator.is_completed(id) {
            return TaskListStatus::Completed;
        }
        if evaluator.is_visited(id) {
            return TaskListStatus::InProgress;
        }

        match rule.rule_kind() {
            StatusRuleKind::AllComplete => {
                let ready = rule.depends_on.iter().all(|dependency| {
                    statuses
                        .get(dependency)
                        .is_some_and(|status| status.satisfies_dependency())
                });
                if ready {
                    TaskListStatus::NotYetStarted
                } else {
                    TaskListStatus::CannotStartYet
                }
            }
            StatusRuleKind::Unsupported => TaskListStatus::CannotStartYet,
        }
    }

    /// Builds the section views. Hidden subsections are left out entirely.
    ///
    /// `statuses` must come from [`Self::determine_statuses`]; a subsection
    /// without a computed status is a generation error rather than a guess.
    pub fn apply_section_statuses(
        &self,
        statuses: &StatusMap,
    ) -> Result<Vec<SectionView>, TasklistError> {
        self.config
            .tasklist
            .sections
            .iter()
            .map(|section| {
                let mut subsections = Vec::with_capacity(section.subsections.len());
                for subsection in &section.subsections {
                    let status = statuses.get(&subsection.id).copied().ok_or_else(|| {
                        TasklistError::Generation {
                            tasklist_id: self.config.tasklist.id.clone(),
                            message: format!(
                                "no status computed for subsection '{}'",
                                subsection.id
                            ),
                        }
                    })?;
                    if status == TaskListStatus::Hidden {
                        continue;
                    }
                    subsections.push(SubsectionView {
                        title: TitleText {
                            text: subsection.title.clone(),
                        },
                        href: self.build_href(subsection, status),
                        status: status.display(),
                    });
                }
                Ok(SectionView {
                    title: section.title.clone(),
                    subsections,
                })
            })
            .collect()
    }

    /// Link into the subsection's first page, or `None` while it cannot be opened.
    pub fn build_href(&self, subsection: &Subsection, status: TaskListStatus) -> Option<String> {
        if matches!(
            status,
            TaskListStatus::CannotStartYet | TaskListStatus::Hidden
        ) {
            return None;
        }

        let target = subsection
            .href
            .as_deref()
            .filter(|href| !href.is_empty())
            .unwrap_or(&subsection.id);
        let target = target.strip_prefix('/').unwrap_or(target);

        Some(format!(
            "/{target}?source={}-tasklist",
            self.config.tasklist.id
        ))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
