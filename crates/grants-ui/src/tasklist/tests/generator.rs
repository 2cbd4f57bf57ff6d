use super::common::*;
use serde_json::{json, Value};

use crate::tasklist::document::DependsOn;
use crate::tasklist::{
    ConditionEvaluator, StatusMap, TaskListStatus, TasklistError, TasklistGenerator, TasklistView,
};

fn render(yaml: &str, data: Value, seen: &[&str]) -> TasklistView {
    let config = config_from(yaml);
    TasklistGenerator::new(&config)
        .generate_tasklist(&data, &visited(seen))
        .expect("tasklist generates")
}

/// `(title, status label, href)` per rendered subsection, across all sections.
fn rows(view: &TasklistView) -> Vec<(String, String, Option<String>)> {
    view.sections
        .iter()
        .flat_map(|section| section.subsections.iter())
        .map(|subsection| {
            (
                subsection.title.text.clone(),
                subsection.status.label().to_string(),
                subsection.href.clone(),
            )
        })
        .collect()
}

fn statuses_for(yaml: &str, data: Value, seen: &[&str]) -> StatusMap {
    let config = config_from(yaml);
    let Value::Object(map) = data else {
        panic!("fixture data must be an object");
    };
    let seen = visited(seen);
    let evaluator = ConditionEvaluator::new(&map, &seen);
    TasklistGenerator::new(&config).determine_statuses(&evaluator)
}

#[test]
fn completed_prerequisite_unlocks_dependant() {
    let statuses = statuses_for(EXAMPLE_YAML, json!({ "sub1": { "value": "completed" } }), &[]);
    assert_eq!(statuses["sub1"], TaskListStatus::Completed);
    assert_eq!(statuses["sub2"], TaskListStatus::NotYetStarted);

    let view = render(EXAMPLE_YAML, json!({ "sub1": { "value": "completed" } }), &[]);
    assert_eq!(
        rows(&view),
        vec![
            (
                "Subsection 1".to_string(),
                "Completed".to_string(),
                Some("/subsection1?source=ex-tasklist".to_string())
            ),
            (
                "Subsection 2".to_string(),
                "Not yet started".to_string(),
                Some("/sub2?source=ex-tasklist".to_string())
            ),
        ]
    );
}

#[test]
fn fresh_applicant_cannot_open_blocked_entries() {
    let statuses = statuses_for(EXAMPLE_YAML, json!({}), &[]);
    assert_eq!(statuses["sub1"], TaskListStatus::NotYetStarted);
    assert_eq!(statuses["sub2"], TaskListStatus::CannotStartYet);

    let view = render(EXAMPLE_YAML, Value::Null, &[]);
    let sub1 = &view.sections[0].subsections[0];
    let sub2 = &view.sections[0].subsections[1];
    assert_eq!(sub1.href.as_deref(), Some("/subsection1?source=ex-tasklist"));
    assert_eq!(sub2.href, None);
    assert_eq!(
        sub2.status.classes.as_deref(),
        Some("govuk-task-list__status--cannot-start-yet")
    );
}

#[test]
fn completion_beats_visits_and_visits_beat_dependencies() {
    let statuses = statuses_for(
        EXAMPLE_YAML,
        json!({ "sub1": { "answer": 1 } }),
        &["sub1"],
    );
    assert_eq!(statuses["sub1"], TaskListStatus::Completed);

    let statuses = statuses_for(EXAMPLE_YAML, json!({}), &["sub2"]);
    assert_eq!(statuses["sub1"], TaskListStatus::NotYetStarted);
    assert_eq!(statuses["sub2"], TaskListStatus::InProgress);
}

#[test]
fn optional_subsection_is_left_out_of_the_render() {
    let yaml = r#"
tasklist:
  id: opt
  title: Optional
  sections:
    - id: s1
      title: Section 1
      subsections:
        - id: always
          title: Always shown
        - id: extra
          title: Extra details
          required: false
"#;
    let statuses = statuses_for(yaml, json!({}), &[]);
    assert_eq!(statuses["extra"], TaskListStatus::Hidden);

    let view = render(yaml, json!({}), &[]);
    let titles: Vec<&str> = view.sections[0]
        .subsections
        .iter()
        .map(|subsection| subsection.title.text.as_str())
        .collect();
    assert_eq!(titles, ["Always shown"]);
}

const RULE_YAML: &str = r#"
tasklist:
  id: rules
  title: Rules
  sections:
    - id: s1
      title: Section 1
      subsections:
        - id: sub1
          title: First
        - id: sub2
          title: Second
          required: false
statusRules:
  submit:
    type: allComplete
    dependsOn: [sub1, sub2]
"#;

#[test]
fn all_complete_rule_treats_hidden_as_done() {
    let statuses = statuses_for(RULE_YAML, json!({ "sub1": {} }), &[]);
    assert_eq!(statuses["sub2"], TaskListStatus::Hidden);
    assert_eq!(statuses["submit"], TaskListStatus::NotYetStarted);

    let required = RULE_YAML.replace("          required: false\n", "");
    let statuses = statuses_for(&required, json!({ "sub1": {} }), &[]);
    assert_eq!(statuses["sub2"], TaskListStatus::NotYetStarted);
    assert_eq!(statuses["submit"], TaskListStatus::CannotStartYet);
}

#[test]
fn status_rules_respect_their_own_progress() {
    let statuses = statuses_for(RULE_YAML, json!({ "submit": {} }), &[]);
    assert_eq!(statuses["submit"], TaskListStatus::Completed);

    let statuses = statuses_for(RULE_YAML, json!({}), &["submit"]);
    assert_eq!(statuses["submit"], TaskListStatus::InProgress);
}

#[test]
fn unsupported_rule_type_blocks() {
    let yaml = RULE_YAML.replace("type: allComplete", "type: anyComplete");
    let statuses = statuses_for(&yaml, json!({ "sub1": {} }), &[]);
    assert_eq!(statuses["submit"], TaskListStatus::CannotStartYet);
}

#[test]
fn dependency_forms_against_computed_statuses() {
    let statuses: StatusMap = [
        ("done".to_string(), TaskListStatus::Completed),
        ("skipped".to_string(), TaskListStatus::Hidden),
        ("open".to_string(), TaskListStatus::InProgress),
    ]
    .into_iter()
    .collect();
    let ids = |ids: &[&str]| visited(ids);
    let check = |depends_on: DependsOn| {
        TasklistGenerator::check_dependencies(&depends_on, &statuses)
    };

    assert!(check(DependsOn::AllOf(ids(&["done", "skipped"]))));
    assert!(!check(DependsOn::AllOf(ids(&["done", "open"]))));
    assert!(!check(DependsOn::AllOf(ids(&["done", "unknown"]))));
    assert!(check(DependsOn::AnyOf(ids(&["open", "done"]))));
    assert!(!check(DependsOn::AnyOf(ids(&["open", "skipped"]))));
    assert!(check(DependsOn::NoneOf(ids(&["open", "skipped"]))));
    assert!(check(DependsOn::NoneOf(ids(&["done"]))));
    assert!(check(DependsOn::Unconstrained));
}

#[test]
fn none_of_does_not_gate_a_subsection() {
    let yaml = r#"
tasklist:
  id: gate
  title: Gate
  sections:
    - id: s1
      title: Section 1
      subsections:
        - id: a
          title: A
        - id: b
          title: B
          dependsOn:
            noneOf: [a]
"#;
    let statuses = statuses_for(yaml, json!({ "a": {} }), &[]);
    assert_eq!(statuses["a"], TaskListStatus::Completed);
    assert_eq!(statuses["b"], TaskListStatus::NotYetStarted);
}

#[test]
fn missing_computed_status_is_a_generation_error() {
    let config = config_from(EXAMPLE_YAML);
    let err = TasklistGenerator::new(&config)
        .apply_section_statuses(&StatusMap::new())
        .expect_err("statuses missing");

    assert!(matches!(err, TasklistError::Generation { .. }));
    assert!(err.to_string().contains("no status computed for subsection 'sub1'"));
}

#[test]
fn farming_journey_unlocks_step_by_step() {
    let labels = |view: &TasklistView| -> Vec<(String, String)> {
        rows(view)
            .into_iter()
            .map(|(title, label, _)| (title, label))
            .collect()
    };
    let pairs = |expected: &[(&str, &str)]| -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(title, label)| (title.to_string(), label.to_string()))
            .collect()
    };

    let fresh = render(FARMING_YAML, json!({}), &[]);
    assert_eq!(fresh.page_heading, "Farming grant");
    assert_eq!(fresh.closing_date.as_deref(), Some("31 March 2026"));
    assert_eq!(
        labels(&fresh),
        pairs(&[
            ("Business details", "Not yet started"),
            ("Land details", "Cannot start yet"),
            ("Livestock", "Cannot start yet"),
            ("Choose actions", "Cannot start yet"),
            ("Check your answers", "Cannot start yet"),
        ])
    );

    let no_livestock = json!({ "business-details": { "livestock": false } });
    let view = render(FARMING_YAML, no_livestock, &[]);
    assert_eq!(
        labels(&view),
        pairs(&[
            ("Business details", "Completed"),
            ("Land details", "Not yet started"),
            ("Choose actions", "Cannot start yet"),
            ("Check your answers", "Cannot start yet"),
        ])
    );
    let land = &view.sections[0].subsections[1];
    assert_eq!(
        land.href.as_deref(),
        Some("/select-land-parcel?source=farming-tasklist")
    );

    let land_done = json!({
        "business-details": { "livestock": false },
        "land-details": { "parcels": ["SX0001"] }
    });
    let view = render(FARMING_YAML, land_done, &["actions"]);
    assert_eq!(
        labels(&view)[2..].to_vec(),
        pairs(&[
            ("Choose actions", "In progress"),
            ("Check your answers", "Cannot start yet"),
        ])
    );

    let ready = json!({
        "business-details": { "livestock": false },
        "land-details": { "parcels": ["SX0001"] },
        "actions": { "codes": ["CSAM1"] }
    });
    let view = render(FARMING_YAML, ready, &[]);
    let check_answers = &view.sections[1].subsections[1];
    assert_eq!(check_answers.status.label(), "Not yet started");
    assert_eq!(
        check_answers.href.as_deref(),
        Some("/check-answers?source=farming-tasklist")
    );
}

#[test]
fn livestock_keepers_must_finish_livestock_before_actions() {
    let data = json!({
        "business-details": { "livestock": true },
        "land-details": { "parcels": ["SX0001"] }
    });
    let statuses = statuses_for(FARMING_YAML, data, &[]);
    assert_eq!(statuses["livestock"], TaskListStatus::NotYetStarted);
    assert_eq!(statuses["actions"], TaskListStatus::CannotStartYet);
}

#[test]
fn broken_conditions_fall_back_to_default_logic() {
    let yaml = r#"
tasklist:
  id: faulty
  title: Faulty
  sections:
    - id: s1
      title: Section 1
      subsections:
        - id: missing-condition
          title: Missing condition
          condition: ghost
        - id: odd-type
          title: Odd type
          condition: lookup
        - id: odd-status
          title: Odd status
          required: false
          condition: pending
        - id: no-opinion
          title: No opinion
          condition: silent
          dependsOn: [missing-condition]
conditions:
  lookup:
    type: lookup
  pending:
    type: conditional
    rules: []
    default: pending_review
  silent:
    type: dependency
    dependsOn: [elsewhere]
    statusMap:
      true: completed
"#;
    let statuses = statuses_for(yaml, json!({}), &[]);
    assert_eq!(statuses["missing-condition"], TaskListStatus::NotYetStarted);
    assert_eq!(statuses["odd-type"], TaskListStatus::NotYetStarted);
    assert_eq!(statuses["odd-status"], TaskListStatus::Hidden);
    assert_eq!(statuses["no-opinion"], TaskListStatus::CannotStartYet);
}

#[test]
fn generation_is_repeatable() {
    let data = json!({ "business-details": { "livestock": true } });
    let first = render(FARMING_YAML, data.clone(), &["livestock"]);
    let second = render(FARMING_YAML, data, &["livestock"]);
    assert_eq!(first, second);
}

#[test]
fn non_object_data_is_rejected() {
    let config = config_from(EXAMPLE_YAML);
    let err = TasklistGenerator::new(&config)
        .generate_tasklist(&json!(["sub1"]), &[])
        .expect_err("array data rejected");

    assert!(matches!(err, TasklistError::Generation { .. }));
    assert_eq!(err.tasklist_id(), Some("ex"));
    assert!(err.to_string().contains("got an array"));
}

#[test]
fn view_serialises_for_the_template() {
    let view = render(EXAMPLE_YAML, json!({}), &["sub1"]);
    let rendered = serde_json::to_value(&view).expect("view serialises");

    assert_eq!(rendered["pageHeading"], "Example Tasklist");
    assert!(rendered.get("helpText").is_none());
    let first = &rendered["sections"][0]["subsections"][0];
    assert_eq!(first["title"]["text"], "Subsection 1");
    assert_eq!(first["status"]["tag"]["text"], "In progress");
    assert_eq!(first["status"]["tag"]["classes"], "govuk-tag--light-blue");
    assert_eq!(rendered["sections"][0]["subsections"][1]["href"], Value::Null);
}
