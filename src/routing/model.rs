//! Structured body models.
//!
//! A [`BodySchema`] declares the fields a handler expects from the request
//! body. Validation turns a decoded body into a [`BodyModel`], coercing the
//! string values that form bodies produce into the declared field kinds.

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::http::request::{json_type_name, Body};

/// Expected type of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    List,
    Any,
}

impl FieldKind {
    fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::List => "list",
            FieldKind::Any => "any",
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

/// Why a body failed to validate against its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("field `{field}` expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },
}

/// Declared field set of a structured body model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySchema {
    name: String,
    fields: Vec<FieldSpec>,
    allow_unknown: bool,
}

impl BodySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            allow_unknown: false,
        }
    }

    /// Add a required field.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    /// Add an optional field.
    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    /// Keep fields the schema does not declare instead of rejecting them.
    pub fn allow_unknown_fields(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate and coerce `body` into a model.
    pub fn validate(&self, body: &Body) -> Result<BodyModel, ModelError> {
        if !self.allow_unknown {
            if let Some(unknown) = body
                .keys()
                .find(|k| !self.fields.iter().any(|f| &f.name == *k))
            {
                return Err(ModelError::UnknownField(unknown.clone()));
            }
        }

        let mut values = Map::new();
        for spec in &self.fields {
            match body.get(&spec.name) {
                None if spec.required => return Err(ModelError::MissingField(spec.name.clone())),
                None => {}
                Some(Value::Null) if !spec.required => {
                    values.insert(spec.name.clone(), Value::Null);
                }
                Some(raw) => {
                    values.insert(spec.name.clone(), coerce(spec, raw)?);
                }
            }
        }
        if self.allow_unknown {
            for (k, v) in body {
                if !values.contains_key(k) && !self.fields.iter().any(|f| &f.name == k) {
                    values.insert(k.clone(), v.clone());
                }
            }
        }

        Ok(BodyModel {
            schema: self.name.clone(),
            values,
        })
    }
}

fn coerce(spec: &FieldSpec, raw: &Value) -> Result<Value, ModelError> {
    let mismatch = || ModelError::TypeMismatch {
        field: spec.name.clone(),
        expected: spec.kind.as_str(),
        found: describe(raw),
    };

    match (spec.kind, raw) {
        (FieldKind::Any, v) => Ok(v.clone()),
        (FieldKind::String, Value::String(_)) => Ok(raw.clone()),
        (FieldKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(raw.clone()),
        (FieldKind::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(|i| Value::Number(i.into()))
            .map_err(|_| mismatch()),
        (FieldKind::Float, Value::Number(n)) => n
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(mismatch),
        (FieldKind::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(mismatch),
        (FieldKind::Boolean, Value::Bool(_)) => Ok(raw.clone()),
        (FieldKind::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(mismatch()),
        },
        (FieldKind::List, Value::Array(_)) => Ok(raw.clone()),
        (FieldKind::List, Value::Null) => Err(mismatch()),
        (FieldKind::List, scalar) => Ok(Value::Array(vec![scalar.clone()])),
        _ => Err(mismatch()),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("string {s:?}"),
        other => json_type_name(other).to_string(),
    }
}

/// A body that passed schema validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyModel {
    schema: String,
    values: Map<String, Value>,
}

impl BodyModel {
    /// Name of the schema this model was built from.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Convert into a concrete type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn body(value: Value) -> Body {
        match value {
            Value::Object(map) => map,
            _ => panic!("test body must be an object"),
        }
    }

    fn user_schema() -> BodySchema {
        BodySchema::new("User")
            .field("name", FieldKind::String)
            .field("age", FieldKind::Integer)
            .optional("admin", FieldKind::Boolean)
    }

    #[test]
    fn accepts_matching_json_body() {
        let model = user_schema()
            .validate(&body(json!({"name": "ada", "age": 36})))
            .unwrap();
        assert_eq!(model.schema(), "User");
        assert_eq!(model.to_value(), json!({"name": "ada", "age": 36}));
    }

    #[test]
    fn coerces_form_strings() {
        let model = user_schema()
            .validate(&body(json!({"name": "ada", "age": "36", "admin": "true"})))
            .unwrap();
        assert_eq!(model.get("age"), Some(&json!(36)));
        assert_eq!(model.get("admin"), Some(&json!(true)));
    }

    #[test]
    fn missing_required_field_fails() {
        let err = user_schema()
            .validate(&body(json!({"name": "ada"})))
            .unwrap_err();
        assert_eq!(err, ModelError::MissingField("age".into()));
    }

    #[test]
    fn unknown_field_fails_unless_allowed() {
        let input = body(json!({"name": "ada", "age": 1, "extra": "x"}));
        assert_eq!(
            user_schema().validate(&input).unwrap_err(),
            ModelError::UnknownField("extra".into())
        );

        let model = user_schema().allow_unknown_fields().validate(&input).unwrap();
        assert_eq!(model.get("extra"), Some(&json!("x")));
    }

    #[test]
    fn mistyped_field_fails() {
        let err = user_schema()
            .validate(&body(json!({"name": "ada", "age": "old"})))
            .unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { ref field, expected: "integer", .. } if field == "age"));

        let err = user_schema()
            .validate(&body(json!({"name": 7, "age": 1})))
            .unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { expected: "string", .. }));
    }

    #[test]
    fn list_field_wraps_single_value() {
        let schema = BodySchema::new("Tags").field("tag", FieldKind::List);
        let one = schema.validate(&body(json!({"tag": "a"}))).unwrap();
        assert_eq!(one.get("tag"), Some(&json!(["a"])));
        let many = schema.validate(&body(json!({"tag": ["a", "b"]}))).unwrap();
        assert_eq!(many.get("tag"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn float_accepts_integers_and_strings() {
        let schema = BodySchema::new("Price").field("amount", FieldKind::Float);
        let m = schema.validate(&body(json!({"amount": 3}))).unwrap();
        assert_eq!(m.get("amount"), Some(&json!(3.0)));
        let m = schema.validate(&body(json!({"amount": "2.5"}))).unwrap();
        assert_eq!(m.get("amount"), Some(&json!(2.5)));
    }

    #[test]
    fn deserializes_into_concrete_type() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            name: String,
            age: u32,
            admin: Option<bool>,
        }

        let model = user_schema()
            .validate(&body(json!({"name": "ada", "age": "36"})))
            .unwrap();
        let user: User = model.deserialize().unwrap();
        assert_eq!(
            user,
            User {
                name: "ada".into(),
                age: 36,
                admin: None
            }
        );
    }
}
