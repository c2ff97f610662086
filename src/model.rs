//! Record types stored in the access-control collections.
//!
//! Roles and policies are stored as JSON documents. `Shape` names the layout a
//! request decodes into; `Record` and `Listing` are the decoded single value and
//! sequence for each shape.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl Role {
    pub fn new(id: impl Into<String>, members: &[&str]) -> Self {
        Self { id: id.into(), members: members.iter().map(|m| m.to_string()).collect() }
    }

    /// True if any member appears in `wanted`.
    pub fn has_any_member(&self, wanted: &[String]) -> bool {
        intersects(&self.members, wanted)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    #[default]
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub effect: Effect,
    #[serde(default = "empty_object")]
    pub conditions: JsonValue,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            id: String::new(),
            description: String::new(),
            subjects: Vec::new(),
            resources: Vec::new(),
            actions: Vec::new(),
            effect: Effect::default(),
            conditions: empty_object(),
        }
    }
}

impl Policy {
    pub fn new(id: impl Into<String>, subjects: &[&str], resources: &[&str], actions: &[&str]) -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            id: id.into(),
            subjects: owned(subjects),
            resources: owned(resources),
            actions: owned(actions),
            ..Self::default()
        }
    }

    pub fn has_any_subject(&self, wanted: &[String]) -> bool { intersects(&self.subjects, wanted) }
    pub fn has_any_resource(&self, wanted: &[String]) -> bool { intersects(&self.resources, wanted) }
    pub fn has_any_action(&self, wanted: &[String]) -> bool { intersects(&self.actions, wanted) }
}

fn empty_object() -> JsonValue { JsonValue::Object(serde_json::Map::new()) }

/// Exact, case-sensitive set intersection test.
fn intersects(have: &[String], wanted: &[String]) -> bool {
    have.iter().any(|h| wanted.iter().any(|w| w == h))
}

/// Layout a request decodes backend documents into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Roles,
    Policies,
    /// Untyped JSON documents, passed through as stored.
    Raw,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Roles => "roles",
            Shape::Policies => "policies",
            Shape::Raw => "raw",
        }
    }
}

/// A single decoded document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Role(Role),
    Policy(Policy),
    Raw(JsonValue),
}

impl Record {
    pub fn decode(shape: Shape, value: JsonValue) -> AppResult<Record> {
        Ok(match shape {
            Shape::Roles => Record::Role(serde_json::from_value(value)?),
            Shape::Policies => Record::Policy(serde_json::from_value(value)?),
            Shape::Raw => Record::Raw(value),
        })
    }

    /// Decode a request body; malformed input is a user error rather than a backend one.
    pub fn from_body(shape: Shape, body: &[u8]) -> AppResult<Record> {
        let value: JsonValue = serde_json::from_slice(body)
            .map_err(|e| AppError::user("invalid_body".to_string(), format!("request body is not valid JSON: {e}")))?;
        Record::decode(shape, value)
            .map_err(|e| AppError::user("invalid_body".to_string(), format!("request body is not a valid {}: {}", shape.as_str(), e.message())))
    }

    pub fn shape(&self) -> Shape {
        match self {
            Record::Role(_) => Shape::Roles,
            Record::Policy(_) => Shape::Policies,
            Record::Raw(_) => Shape::Raw,
        }
    }

    pub fn to_value(&self) -> AppResult<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A decoded sequence of documents, in backend order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Listing {
    Roles(Vec<Role>),
    Policies(Vec<Policy>),
    Raw(Vec<JsonValue>),
}

impl Listing {
    pub fn decode(shape: Shape, values: Vec<JsonValue>) -> AppResult<Listing> {
        Ok(match shape {
            Shape::Roles => Listing::Roles(values.into_iter().map(serde_json::from_value).collect::<Result<_, _>>()?),
            Shape::Policies => Listing::Policies(values.into_iter().map(serde_json::from_value).collect::<Result<_, _>>()?),
            Shape::Raw => Listing::Raw(values),
        })
    }

    pub fn shape(&self) -> Shape {
        match self {
            Listing::Roles(_) => Shape::Roles,
            Listing::Policies(_) => Shape::Policies,
            Listing::Raw(_) => Shape::Raw,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Listing::Roles(v) => v.len(),
            Listing::Policies(v) => v.len(),
            Listing::Raw(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn policy_defaults_fill_missing_fields() {
        let p: Policy = serde_json::from_value(json!({"id": "p1", "actions": ["read"]})).unwrap();
        assert_eq!(p.effect, Effect::Deny);
        assert_eq!(p.conditions, json!({}));
        assert!(p.subjects.is_empty());
    }

    #[test]
    fn intersection_is_case_sensitive() {
        let r = Role::new("r1", &["alice"]);
        assert!(r.has_any_member(&["bob".into(), "alice".into()]));
        assert!(!r.has_any_member(&["Alice".into()]));
        assert!(!r.has_any_member(&[]));
    }

    #[test]
    fn listing_serializes_as_plain_array() {
        let l = Listing::Roles(vec![Role::new("r1", &["alice"])]);
        assert_eq!(serde_json::to_value(&l).unwrap(), json!([{"id": "r1", "members": ["alice"]}]));
    }

    #[test]
    fn body_decode_errors_are_user_errors() {
        let err = Record::from_body(Shape::Roles, b"{\"members\": 3}").unwrap_err();
        assert_eq!(err.http_status(), 400);
        let err = Record::from_body(Shape::Policies, b"nope").unwrap_err();
        assert_eq!(err.code_str(), "invalid_body");
    }

    #[test]
    fn raw_records_pass_through() {
        let rec = Record::decode(Shape::Raw, json!({"anything": [1, 2]})).unwrap();
        assert_eq!(rec.shape(), Shape::Raw);
        assert_eq!(rec.to_value().unwrap(), json!({"anything": [1, 2]}));
    }
}
