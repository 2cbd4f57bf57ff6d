//! Tasklist status engine.
//!
//! A tasklist is a YAML document of sections and subsections. Each request
//! loads the document, evaluates every subsection against the applicant's
//! saved answers and visited pages, and renders a status badge per entry.
//! Nothing is carried between requests.

pub mod document;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod loader;
pub mod router;
pub mod service;
pub mod status;
pub mod store;

#[cfg(test)]
mod tests;

pub use document::{
    ConditionSpec, ConditionalRule, DependsOn, FieldOperator, FieldRule, RuleExpr, Section,
    StatusRule, StatusRuleKind, Subsection, TasklistConfig, TasklistDefinition,
};
pub use error::{TasklistError, ValidationError};
pub use evaluator::{ConditionError, ConditionEvaluator};
pub use generator::{SectionView, StatusMap, SubsectionView, TasklistGenerator, TasklistView};
pub use loader::{document_key, parse_config, validate_config, TasklistLoader};
pub use router::tasklist_router;
pub use service::TasklistService;
pub use status::{normalise_status, DisplayStatus, TaskListStatus};
pub use store::{
    ApplicantState, ApplicantStateStore, DocumentError, FileTasklistStore, StateKey,
    StateStoreError, TasklistStore,
};
