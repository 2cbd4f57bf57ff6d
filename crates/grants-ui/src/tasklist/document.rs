//! Typed form of a tasklist document.
//!
//! Documents are YAML of the shape
//!
//! ```yaml
//! tasklist:
//!   id: example
//!   title: Example Tasklist
//!   sections:
//!     - id: s1
//!       title: Section 1
//!       subsections:
//!         - id: sub1
//!           title: Subsection 1
//! conditions: {}      # optional, named condition specs
//! statusRules: {}     # optional, computed statuses in declaration order
//! metadata:
//!   enabledInProd: true
//! ```
//!
//! Structural checks with user-facing messages live in [`super::loader::validate_config`];
//! the types here only describe the decoded shape.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasklistConfig {
    pub tasklist: TasklistDefinition,
    #[serde(default)]
    pub conditions: BTreeMap<String, ConditionSpec>,
    #[serde(default)]
    pub status_rules: StatusRules,
    #[serde(default)]
    pub metadata: TasklistMetadata,
}

impl TasklistConfig {
    pub fn subsections(&self) -> impl Iterator<Item = &Subsection> {
        self.tasklist
            .sections
            .iter()
            .flat_map(|section| section.subsections.iter())
    }

    pub fn find_subsection(&self, id: &str) -> Option<&Subsection> {
        self.subsections().find(|subsection| subsection.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasklistDefinition {
    #[serde(deserialize_with = "scalar_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub closing_date: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasklistMetadata {
    /// Only a literal boolean counts; any other value reads as unset.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub enabled_in_prod: Option<bool>,
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool())
}

/// Ids may be written as bare numbers or booleans in YAML; they key applicant
/// data by their text.
fn scalar_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(de::Error::custom(format!(
            "id must be a string or number, got {other}"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Section {
    #[serde(deserialize_with = "scalar_id")]
    pub id: String,
    pub title: String,
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subsection {
    #[serde(deserialize_with = "scalar_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub depends_on: Option<DependsOn>,
}

impl Subsection {
    /// Subsections are required unless they say `required: false`.
    pub fn is_required(&self) -> bool {
        self.required != Some(false)
    }
}

/// Prerequisites expressed over other subsection or status rule ids.
///
/// A bare list means every id is required. Shapes that match none of the
/// forms impose no constraint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub enum DependsOn {
    AllOf(Vec<String>),
    AnyOf(Vec<String>),
    NoneOf(Vec<String>),
    Unconstrained,
}

impl From<Value> for DependsOn {
    fn from(value: Value) -> Self {
        if let Value::Array(items) = &value {
            return Self::AllOf(id_list(items));
        }

        let Value::Object(map) = &value else {
            return Self::Unconstrained;
        };

        if let Some(Value::Array(items)) = map.get("allOf") {
            Self::AllOf(id_list(items))
        } else if let Some(Value::Array(items)) = map.get("anyOf") {
            Self::AnyOf(id_list(items))
        } else if let Some(Value::Array(items)) = map.get("noneOf") {
            Self::NoneOf(id_list(items))
        } else {
            Self::Unconstrained
        }
    }
}

fn id_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(id) => Some(id.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
        .collect()
}

/// Named, reusable condition referenced by `Subsection::condition`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCondition")]
pub enum ConditionSpec {
    Conditional {
        rules: Vec<ConditionalRule>,
        default: Option<String>,
    },
    Dependency {
        depends_on: DependsOn,
        status_map: Option<HashMap<String, String>>,
    },
    /// Kept so that the failure surfaces when the condition is evaluated, not at load.
    Unsupported { kind: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConditionalRule {
    #[serde(rename = "if", default)]
    pub when: Option<RuleExpr>,
    pub then: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCondition {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    rules: Vec<ConditionalRule>,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    depends_on: Option<DependsOn>,
    #[serde(default, deserialize_with = "deserialize_status_map")]
    status_map: Option<HashMap<String, String>>,
}

impl From<RawCondition> for ConditionSpec {
    fn from(raw: RawCondition) -> Self {
        match raw.kind.as_deref() {
            Some("conditional") => Self::Conditional {
                rules: raw.rules,
                default: raw.default,
            },
            Some("dependency") => Self::Dependency {
                depends_on: raw.depends_on.unwrap_or(DependsOn::Unconstrained),
                status_map: raw.status_map,
            },
            _ => Self::Unsupported { kind: raw.kind },
        }
    }
}

/// YAML writes `true:` / `false:` keys as booleans; status maps key on their text.
#[derive(Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
enum StatusMapKey {
    Flag(bool),
    Name(String),
}

fn deserialize_status_map<'de, D>(
    deserializer: D,
) -> Result<Option<HashMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<HashMap<StatusMapKey, String>>::deserialize(deserializer)?;
    Ok(raw.map(|entries| {
        entries
            .into_iter()
            .map(|(key, status)| {
                let key = match key {
                    StatusMapKey::Flag(flag) => flag.to_string(),
                    StatusMapKey::Name(name) => name,
                };
                (key, status)
            })
            .collect()
    }))
}

/// Boolean expression evaluated against applicant data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum RuleExpr {
    /// A missing or null expression, which always passes.
    Always,
    And(Vec<RuleExpr>),
    Or(Vec<RuleExpr>),
    Not(Box<RuleExpr>),
    Field(FieldRule),
    /// Any other shape; never passes.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    /// Dot-separated path into applicant data.
    pub field: String,
    pub operator: FieldOperator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldOperator {
    Equals(Value),
    NotEquals(Value),
    Exists(bool),
    In(Value),
    NotIn(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    IsEmpty(bool),
}

/// Operator keys in the order they are recognised.
pub const FIELD_OPERATORS: [&str; 10] = [
    "equals",
    "notEquals",
    "exists",
    "in",
    "notIn",
    "gt",
    "gte",
    "lt",
    "lte",
    "isEmpty",
];

impl TryFrom<Value> for RuleExpr {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut map = match value {
            Value::Null => return Ok(Self::Always),
            Value::Object(map) => map,
            _ => return Ok(Self::Unrecognized),
        };

        if let Some(children) = map.remove("and") {
            return rule_list("and", children).map(Self::And);
        }
        if let Some(children) = map.remove("or") {
            return rule_list("or", children).map(Self::Or);
        }
        if let Some(inner) = map.remove("not") {
            return Self::try_from(inner).map(|rule| Self::Not(Box::new(rule)));
        }

        let Some(field) = map.remove("field") else {
            return Ok(Self::Unrecognized);
        };
        let Value::String(field) = field else {
            return Err(format!("Rule field must be a string, got {field}"));
        };

        let present: Vec<&str> = FIELD_OPERATORS
            .iter()
            .copied()
            .filter(|key| map.contains_key(*key))
            .collect();

        match present.as_slice() {
            [] => Ok(Self::Unrecognized),
            [key] => {
                let operand = map.remove(*key).unwrap_or(Value::Null);
                let operator = field_operator(&field, key, operand)?;
                Ok(Self::Field(FieldRule { field, operator }))
            }
            many => Err(format!(
                "Rule on field '{field}' declares multiple operators: {}",
                many.join(", ")
            )),
        }
    }
}

fn rule_list(key: &str, value: Value) -> Result<Vec<RuleExpr>, String> {
    match value {
        Value::Array(items) => items.into_iter().map(RuleExpr::try_from).collect(),
        other => Err(format!("'{key}' must be a list of rules, got {other}")),
    }
}

fn field_operator(field: &str, key: &str, operand: Value) -> Result<FieldOperator, String> {
    let flag = |operand: Value| match operand {
        Value::Bool(flag) => Ok(flag),
        other => Err(format!(
            "Operator '{key}' on field '{field}' expects true or false, got {other}"
        )),
    };

    Ok(match key {
        "equals" => FieldOperator::Equals(operand),
        "notEquals" => FieldOperator::NotEquals(operand),
        "exists" => FieldOperator::Exists(flag(operand)?),
        "in" => FieldOperator::In(operand),
        "notIn" => FieldOperator::NotIn(operand),
        "gt" => FieldOperator::Gt(operand),
        "gte" => FieldOperator::Gte(operand),
        "lt" => FieldOperator::Lt(operand),
        "lte" => FieldOperator::Lte(operand),
        "isEmpty" => FieldOperator::IsEmpty(flag(operand)?),
        other => return Err(format!("Unknown operator '{other}' on field '{field}'")),
    })
}

/// Computed statuses, kept in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusRules(Vec<(String, StatusRule)>);

impl StatusRules {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatusRule)> {
        self.0.iter().map(|(id, rule)| (id.as_str(), rule))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, StatusRule)> for StatusRules {
    fn from_iter<I: IntoIterator<Item = (String, StatusRule)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for StatusRules {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedRules;

        impl<'de> Visitor<'de> for OrderedRules {
            type Value = StatusRules;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of status rule ids to rules")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(StatusRules::default())
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut rules = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, rule)) = access.next_entry::<String, StatusRule>()? {
                    rules.push((id, rule));
                }
                Ok(StatusRules(rules))
            }
        }

        deserializer.deserialize_any(OrderedRules)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRule {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRuleKind {
    AllComplete,
    Unsupported,
}

impl StatusRule {
    pub fn rule_kind(&self) -> StatusRuleKind {
        match self.kind.as_deref() {
            Some("allComplete") => StatusRuleKind::AllComplete,
            _ => StatusRuleKind::Unsupported,
        }
    }
}
