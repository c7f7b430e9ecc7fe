//! Declarative request schemas and the validator that applies them.
//!
//! Validation is a value-level operation: malformed input produces
//! [`ValidationOutcome::Invalid`] with one entry per offending field, never an
//! `Err`. A successful outcome holds exactly the declared fields, in declared
//! order, coerced to their declared types.

use super::method::ChainMethod;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::fmt;

/// Pseudo field name used when the payload itself is not an object.
pub const BODY_FIELD: &str = "$body";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            field_type,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            field_type,
            required: false,
        });
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

/// Validated fields in schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedFields(Vec<(String, Value)>);

impl ValidatedFields {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values in schema order, ready to be used as positional call params.
    ///
    /// Absent optional fields at the tail are left out, so the ledger sees
    /// the same arguments as when the caller omits them. An absent optional
    /// followed by a present field keeps its position as JSON `null`.
    pub fn into_params(self) -> Vec<Value> {
        let mut values: Vec<Value> = self.0.into_iter().map(|(_, v)| v).collect();
        while values.last().is_some_and(Value::is_null) {
            values.pop();
        }
        values
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(ValidatedFields),
    /// Always non-empty.
    Invalid(Vec<FieldError>),
}

impl ValidationOutcome {
    pub fn into_result(self) -> Result<ValidatedFields, Vec<FieldError>> {
        match self {
            ValidationOutcome::Valid(fields) => Ok(fields),
            ValidationOutcome::Invalid(errors) => Err(errors),
        }
    }
}

/// Applies `schema` to an untyped payload. Pure; no partial success.
pub fn validate(schema: &Schema, body: &Value) -> ValidationOutcome {
    let Some(object) = body.as_object() else {
        return ValidationOutcome::Invalid(vec![FieldError::new(
            BODY_FIELD,
            "must be an object",
        )]);
    };

    let mut fields = Vec::with_capacity(schema.fields.len());
    let mut errors = Vec::new();

    for spec in &schema.fields {
        match coerce_field(spec, object) {
            Ok(value) => fields.push((spec.name.clone(), value)),
            Err(error) => errors.push(error),
        }
    }

    if errors.is_empty() {
        ValidationOutcome::Valid(ValidatedFields(fields))
    } else {
        ValidationOutcome::Invalid(errors)
    }
}

fn coerce_field(spec: &FieldSpec, object: &Map<String, Value>) -> Result<Value, FieldError> {
    let raw = object.get(&spec.name).unwrap_or(&Value::Null);

    if raw.is_null() || raw.as_str().is_some_and(|s| s.is_empty() && spec.required) {
        return if spec.required {
            Err(FieldError::new(&spec.name, "is required"))
        } else {
            Ok(Value::Null)
        };
    }

    let coerced = match spec.field_type {
        FieldType::String => match raw {
            Value::String(_) => Some(raw.clone()),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        FieldType::Integer => match raw {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(raw.clone()),
            Value::Number(n) => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| Value::from(f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
            _ => None,
        },
        FieldType::Number => match raw {
            Value::Number(_) => Some(raw.clone()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            _ => None,
        },
        FieldType::Boolean => match raw {
            Value::Bool(_) => Some(raw.clone()),
            Value::String(s) if s == "true" => Some(Value::Bool(true)),
            Value::String(s) if s == "false" => Some(Value::Bool(false)),
            _ => None,
        },
    };

    coerced.ok_or_else(|| FieldError::new(&spec.name, type_reason(spec.field_type)))
}

fn type_reason(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "must be a string",
        FieldType::Integer => "must be an integer",
        FieldType::Number => "must be a number",
        FieldType::Boolean => "must be a boolean",
    }
}

/// Method to schema associations, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<ChainMethod, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schemas for the write methods of the car and asset chaincode.
    pub fn standard() -> Self {
        Self::new()
            .with(
                ChainMethod::CreateCar,
                Schema::new()
                    .required("Key", FieldType::String)
                    .required("Make", FieldType::String)
                    .required("Model", FieldType::String)
                    .required("Colour", FieldType::String)
                    .required("Owner", FieldType::String),
            )
            .with(
                ChainMethod::ChangeCarOwner,
                Schema::new()
                    .required("Key", FieldType::String)
                    .required("Owner", FieldType::String),
            )
            .with(
                ChainMethod::CreateAsset,
                Schema::new()
                    .required("Key", FieldType::String)
                    .required("Name", FieldType::String)
                    .optional("Value", FieldType::Number),
            )
    }

    pub fn with(mut self, method: ChainMethod, schema: Schema) -> Self {
        self.schemas.insert(method, schema);
        self
    }

    pub fn get(&self, method: ChainMethod) -> Option<&Schema> {
        self.schemas.get(&method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn car_schema() -> Schema {
        SchemaRegistry::standard()
            .get(ChainMethod::CreateCar)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_valid_body_keeps_schema_order_and_strips_unknown() {
        let body = json!({
            "Owner": "Alice",
            "Colour": "Blue",
            "Model": "Corolla",
            "Make": "Toyota",
            "Key": "car1",
            "Extra": "ignored"
        });

        let fields = validate(&car_schema(), &body).into_result().unwrap();
        assert_eq!(fields.len(), 5);
        assert!(fields.get("Extra").is_none());
        assert_eq!(
            fields.into_params(),
            vec![
                json!("car1"),
                json!("Toyota"),
                json!("Corolla"),
                json!("Blue"),
                json!("Alice")
            ]
        );
    }

    #[test]
    fn test_missing_and_empty_required_fields() {
        let body = json!({"Key": "car1", "Make": "", "Model": "Corolla", "Colour": "Blue"});

        let errors = validate(&car_schema(), &body).into_result().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["Make", "Owner"]);
        assert!(errors.iter().all(|e| e.reason == "is required"));
    }

    #[test]
    fn test_non_object_body() {
        let outcome = validate(&car_schema(), &json!(["car1"]));
        let errors = outcome.into_result().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, BODY_FIELD);
    }

    #[test]
    fn test_coercions() {
        let schema = Schema::new()
            .required("s", FieldType::String)
            .required("i", FieldType::Integer)
            .required("n", FieldType::Number)
            .required("b", FieldType::Boolean)
            .optional("o", FieldType::String);
        let body = json!({"s": 7, "i": "12", "n": "1.5", "b": "true"});

        let fields = validate(&schema, &body).into_result().unwrap();
        assert_eq!(fields.get("s"), Some(&json!("7")));
        assert_eq!(fields.get("i"), Some(&json!(12)));
        assert_eq!(fields.get("n"), Some(&json!(1.5)));
        assert_eq!(fields.get("b"), Some(&json!(true)));
        assert_eq!(fields.get("o"), Some(&Value::Null));
    }

    #[test]
    fn test_absent_trailing_optional_is_left_out() {
        let asset = SchemaRegistry::standard()
            .get(ChainMethod::CreateAsset)
            .cloned()
            .unwrap();

        let without = validate(&asset, &json!({"Key": "a1", "Name": "widget"}))
            .into_result()
            .unwrap();
        assert_eq!(without.into_params(), vec![json!("a1"), json!("widget")]);

        let with = validate(&asset, &json!({"Key": "a1", "Name": "widget", "Value": "3"}))
            .into_result()
            .unwrap();
        assert_eq!(with.into_params(), vec![json!("a1"), json!("widget"), json!(3.0)]);
    }

    #[test]
    fn test_absent_inner_optional_keeps_position() {
        let schema = Schema::new()
            .required("Key", FieldType::String)
            .optional("Note", FieldType::String)
            .required("Owner", FieldType::String);

        let fields = validate(&schema, &json!({"Key": "k", "Owner": "Alice"}))
            .into_result()
            .unwrap();
        assert_eq!(
            fields.into_params(),
            vec![json!("k"), Value::Null, json!("Alice")]
        );
    }

    #[test]
    fn test_type_mismatch_reasons() {
        let schema = Schema::new()
            .required("i", FieldType::Integer)
            .required("s", FieldType::String);
        let body = json!({"i": "twelve", "s": {"nested": true}});

        let errors = validate(&schema, &body).into_result().unwrap_err();
        assert_eq!(errors[0], FieldError::new("i", "must be an integer"));
        assert_eq!(errors[1], FieldError::new("s", "must be a string"));
    }
}
