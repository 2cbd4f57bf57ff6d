use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Map, Value};

use super::document::{
    ConditionSpec, ConditionalRule, DependsOn, FieldOperator, FieldRule, RuleExpr,
};
use super::status::TaskListStatus;

/// Failure to turn a named condition into a status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("Condition '{0}' not found in config")]
    NotFound(String),
    #[error("Unknown condition type: {0}")]
    UnknownType(String),
    #[error("Condition '{condition}' resolved to unknown status '{value}'")]
    UnknownStatus { condition: String, value: String },
}

/// Evaluates conditions and dependencies against one applicant's answers.
///
/// Built once per tasklist render; the data and visited list are fixed for
/// its lifetime.
pub struct ConditionEvaluator<'a> {
    data: &'a Map<String, Value>,
    visited: &'a [String],
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(data: &'a Map<String, Value>, visited: &'a [String]) -> Self {
        Self { data, visited }
    }

    /// `Ok(None)` means the condition had no opinion (a status map with no
    /// matching or default entry).
    pub fn evaluate_condition(
        &self,
        name: &str,
        spec: Option<&ConditionSpec>,
    ) -> Result<Option<TaskListStatus>, ConditionError> {
        match spec {
            None => Err(ConditionError::NotFound(name.to_string())),
            Some(ConditionSpec::Conditional { rules, default }) => self
                .evaluate_conditional_rules(name, rules, default.as_deref())
                .map(Some),
            Some(ConditionSpec::Dependency {
                depends_on,
                status_map,
            }) => self.evaluate_dependency_rules(name, depends_on, status_map.as_ref()),
            Some(ConditionSpec::Unsupported { kind }) => Err(ConditionError::UnknownType(
                kind.clone().unwrap_or_else(|| "(none)".to_string()),
            )),
        }
    }

    /// First matching rule wins; otherwise the default, or `CannotStartYet`.
    pub fn evaluate_conditional_rules(
        &self,
        name: &str,
        rules: &[ConditionalRule],
        default: Option<&str>,
    ) -> Result<TaskListStatus, ConditionError> {
        let matched = rules.iter().find(|rule| match &rule.when {
            Some(expr) => self.evaluate_rule(expr),
            None => true,
        });

        match (matched, default) {
            (Some(rule), _) => resolve_status(name, &rule.then),
            (None, Some(default)) => resolve_status(name, default),
            (None, None) => Ok(TaskListStatus::CannotStartYet),
        }
    }

    pub fn evaluate_dependency_rules(
        &self,
        name: &str,
        depends_on: &DependsOn,
        status_map: Option<&HashMap<String, String>>,
    ) -> Result<Option<TaskListStatus>, ConditionError> {
        let satisfied = self.check_dependencies(depends_on);

        let Some(status_map) = status_map else {
            return Ok(Some(if satisfied {
                TaskListStatus::NotYetStarted
            } else {
                TaskListStatus::CannotStartYet
            }));
        };

        status_map
            .get(if satisfied { "true" } else { "false" })
            .or_else(|| status_map.get("default"))
            .map(|value| resolve_status(name, value))
            .transpose()
    }

    pub fn evaluate_rule(&self, expr: &RuleExpr) -> bool {
        match expr {
            RuleExpr::Always => true,
            RuleExpr::And(rules) => rules.iter().all(|rule| self.evaluate_rule(rule)),
            RuleExpr::Or(rules) => rules.iter().any(|rule| self.evaluate_rule(rule)),
            RuleExpr::Not(rule) => !self.evaluate_rule(rule),
            RuleExpr::Field(rule) => self.evaluate_field_rule(rule),
            RuleExpr::Unrecognized => false,
        }
    }

    fn evaluate_field_rule(&self, rule: &FieldRule) -> bool {
        let value = self.field_value(&rule.field);

        match &rule.operator {
            FieldOperator::Equals(expected) => value.is_some_and(|v| values_equal(v, expected)),
            FieldOperator::NotEquals(expected) => {
                !value.is_some_and(|v| values_equal(v, expected))
            }
            FieldOperator::Exists(required) => value.is_some_and(|v| !v.is_null()) == *required,
            FieldOperator::In(options) => match options.as_array() {
                Some(options) => contains(options, value),
                None => false,
            },
            FieldOperator::NotIn(options) => match options.as_array() {
                Some(options) => !contains(options, value),
                None => false,
            },
            FieldOperator::Gt(bound) => compare(value, bound).is_some_and(Ordering::is_gt),
            FieldOperator::Gte(bound) => compare(value, bound).is_some_and(Ordering::is_ge),
            FieldOperator::Lt(bound) => compare(value, bound).is_some_and(Ordering::is_lt),
            FieldOperator::Lte(bound) => compare(value, bound).is_some_and(Ordering::is_le),
            FieldOperator::IsEmpty(required) => is_empty(value) == *required,
        }
    }

    /// Resolves a dot path such as `farm.parcels.0.area`; any missing segment
    /// yields `None`.
    pub fn field_value(&self, path: &str) -> Option<&'a Value> {
        let mut segments = path.split('.');
        let mut current = self.data.get(segments.next()?)?;

        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Dependencies checked against raw answers: an id is met once it has data.
    pub fn check_dependencies(&self, depends_on: &DependsOn) -> bool {
        match depends_on {
            DependsOn::AllOf(ids) => ids.iter().all(|id| self.is_completed(id)),
            DependsOn::AnyOf(ids) => ids.iter().any(|id| self.is_completed(id)),
            DependsOn::NoneOf(ids) => !ids.iter().any(|id| self.is_completed(id)),
            DependsOn::Unconstrained => true,
        }
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }

    pub fn is_visited(&self, id: &str) -> bool {
        self.visited.iter().any(|visited| visited == id)
    }

    /// Completed beats visited beats untouched.
    pub fn base_status(&self, id: &str) -> TaskListStatus {
        if self.is_completed(id) {
            TaskListStatus::Completed
        } else if self.is_visited(id) {
            TaskListStatus::InProgress
        } else {
            TaskListStatus::NotYetStarted
        }
    }
}

fn resolve_status(condition: &str, value: &str) -> Result<TaskListStatus, ConditionError> {
    TaskListStatus::from_name(value).ok_or_else(|| ConditionError::UnknownStatus {
        condition: condition.to_string(),
        value: value.to_string(),
    })
}

/// Numbers compare by value so `1` and `1.0` match.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn contains(options: &[Value], value: Option<&Value>) -> bool {
    value.is_some_and(|value| options.iter().any(|option| values_equal(value, option)))
}

fn compare(value: Option<&Value>, bound: &Value) -> Option<Ordering> {
    let value = value?.as_f64()?;
    let bound = bound.as_f64()?;
    value.partial_cmp(&bound)
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}
