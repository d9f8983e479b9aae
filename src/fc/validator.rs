use crate::fc::schema::{ObjectField, SchemaKind, SchemaNode};
use crate::util::json_type_name;
use smallvec::SmallVec;
use std::fmt;

/// One step of a path into a JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Field-name chain from the arguments root to the offending value.
///
/// Renders as `$`, `$.city`, `$.stops[2].name`, ...
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(SmallVec<[PathSegment; 4]>);

impl FieldPath {
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The innermost field name on the path, skipping array indices.
    #[must_use]
    pub fn last_field(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|segment| match segment {
            PathSegment::Field(name) => Some(name.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    fn push_field(&mut self, name: &str) {
        self.0.push(PathSegment::Field(name.to_string()));
    }

    fn push_index(&mut self, idx: usize) {
        self.0.push(PathSegment::Index(idx));
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// Which inclusive numeric bound was crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Minimum(f64),
    Maximum(f64),
}

/// The constraint a value violated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationErrorKind {
    #[error("expected type '{expected}', got '{found}'")]
    TypeMismatch {
        expected: SchemaKind,
        found: &'static str,
    },
    #[error("missing required property")]
    MissingField,
    #[error("string does not match pattern {pattern:?}")]
    PatternMismatch { pattern: String },
    #[error("{}", describe_range(.bound, .actual))]
    RangeViolation { bound: Bound, actual: f64 },
}

fn describe_range(bound: &Bound, actual: &f64) -> String {
    match *bound {
        Bound::Minimum(min) => format!("value {actual} is less than minimum {min}"),
        Bound::Maximum(max) => format!("value {actual} is greater than maximum {max}"),
    }
}

/// A validation failure with the JSON path where it occurred.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{path}: {kind}")]
pub struct ValidationError {
    pub path: FieldPath,
    pub kind: ValidationErrorKind,
}

/// Validate a value against a compiled schema.
///
/// Validation is a pass/fail check: on success the input is returned
/// unchanged. Unknown object members are accepted; absent optional members
/// are skipped. The first violation found short-circuits the walk.
///
/// # Errors
///
/// Returns [`ValidationError`] carrying the path to the first offending value
/// and the violated constraint.
pub fn validate<'v>(
    schema: &SchemaNode,
    value: &'v serde_json::Value,
) -> Result<&'v serde_json::Value, ValidationError> {
    let mut path = FieldPath::default();
    if let Err(kind) = validate_node(schema, value, &mut path) {
        return Err(ValidationError { path, kind });
    }
    Ok(value)
}

/// Convenience predicate over [`validate`].
#[must_use]
pub fn is_valid(schema: &SchemaNode, value: &serde_json::Value) -> bool {
    validate(schema, value).is_ok()
}

// On error `path` is left pointing at the offending value.
fn validate_node(
    schema: &SchemaNode,
    value: &serde_json::Value,
    path: &mut FieldPath,
) -> Result<(), ValidationErrorKind> {
    match schema {
        SchemaNode::String { pattern } => {
            let text = value.as_str().ok_or_else(|| mismatch(schema, value))?;
            if let Some(pattern) = pattern {
                if !pattern.is_full_match(text) {
                    return Err(ValidationErrorKind::PatternMismatch {
                        pattern: pattern.as_str().to_string(),
                    });
                }
            }
            Ok(())
        }
        SchemaNode::Number { minimum, maximum } => {
            let n = value.as_f64().ok_or_else(|| mismatch(schema, value))?;
            if let Some(min) = *minimum {
                if n < min {
                    return Err(ValidationErrorKind::RangeViolation {
                        bound: Bound::Minimum(min),
                        actual: n,
                    });
                }
            }
            if let Some(max) = *maximum {
                if n > max {
                    return Err(ValidationErrorKind::RangeViolation {
                        bound: Bound::Maximum(max),
                        actual: n,
                    });
                }
            }
            Ok(())
        }
        SchemaNode::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(mismatch(schema, value))
            }
        }
        SchemaNode::Array { items } => {
            let arr = value.as_array().ok_or_else(|| mismatch(schema, value))?;
            for (idx, item) in arr.iter().enumerate() {
                path.push_index(idx);
                validate_node(items, item, path)?;
                path.pop();
            }
            Ok(())
        }
        SchemaNode::Object { fields } => {
            let obj = value.as_object().ok_or_else(|| mismatch(schema, value))?;
            validate_fields(fields, obj, path)
        }
    }
}

fn validate_fields(
    fields: &[ObjectField],
    obj: &serde_json::Map<String, serde_json::Value>,
    path: &mut FieldPath,
) -> Result<(), ValidationErrorKind> {
    for field in fields {
        match obj.get(&field.name) {
            Some(item) => {
                path.push_field(&field.name);
                validate_node(&field.schema, item, path)?;
                path.pop();
            }
            None if field.required => {
                path.push_field(&field.name);
                return Err(ValidationErrorKind::MissingField);
            }
            None => {}
        }
    }
    Ok(())
}

#[inline]
fn mismatch(schema: &SchemaNode, value: &serde_json::Value) -> ValidationErrorKind {
    ValidationErrorKind::TypeMismatch {
        expected: schema.kind(),
        found: json_type_name(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fc::schema::compile;
    use serde_json::json;

    fn weather_schema() -> SchemaNode {
        compile(&json!({
            "type": "object",
            "properties": {
                "city": {"type": "string"},
                "days": {"type": "integer", "minimum": 1, "maximum": 14},
                "units": {"type": "string", "pattern": "metric|imperial"},
                "alerts": {"type": "boolean"}
            },
            "required": ["city"]
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_simple_call() {
        let schema = weather_schema();
        let args = json!({"city": "London", "days": 3, "units": "metric"});
        assert_eq!(validate(&schema, &args).unwrap(), &args);
    }

    #[test]
    fn test_missing_required() {
        let err = validate(&weather_schema(), &json!({"days": 3})).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::MissingField);
        assert_eq!(err.path.to_string(), "$.city");
        assert!(err.to_string().contains("missing required property"));
    }

    #[test]
    fn test_absent_optional_is_skipped() {
        assert!(is_valid(&weather_schema(), &json!({"city": "Paris"})));
    }

    #[test]
    fn test_optional_with_wrong_type_fails() {
        let err = validate(&weather_schema(), &json!({"city": "Paris", "alerts": "yes"}))
            .unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::TypeMismatch {
                expected: SchemaKind::Boolean,
                found: "string"
            }
        );
        assert_eq!(err.path.last_field(), Some("alerts"));
    }

    #[test]
    fn test_null_optional_is_rejected() {
        assert!(!is_valid(&weather_schema(), &json!({"city": "Paris", "days": null})));
    }

    #[test]
    fn test_wrong_type() {
        let err = validate(&weather_schema(), &json!({"city": 42})).unwrap_err();
        assert!(err.to_string().contains("expected type 'string'"));
    }

    #[test]
    fn test_numeric_constraints() {
        let schema = weather_schema();
        assert!(is_valid(&schema, &json!({"city": "a", "days": 1})));
        assert!(is_valid(&schema, &json!({"city": "a", "days": 14})));

        let err = validate(&schema, &json!({"city": "a", "days": 0})).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::RangeViolation {
                bound: Bound::Minimum(1.0),
                actual: 0.0
            }
        );

        let err = validate(&schema, &json!({"city": "a", "days": 15})).unwrap_err();
        assert!(matches!(
            err.kind,
            ValidationErrorKind::RangeViolation {
                bound: Bound::Maximum(_),
                ..
            }
        ));
        assert!(err.to_string().contains("greater than maximum 14"));
    }

    #[test]
    fn test_float_accepted_for_integer_kind() {
        assert!(is_valid(&weather_schema(), &json!({"city": "a", "days": 2.5})));
    }

    #[test]
    fn test_pattern_matches_whole_string() {
        let schema = weather_schema();
        assert!(is_valid(&schema, &json!({"city": "a", "units": "imperial"})));
        let err = validate(&schema, &json!({"city": "a", "units": "metrics"})).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::PatternMismatch {
                pattern: "metric|imperial".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_fields_are_permitted() {
        assert!(is_valid(&weather_schema(), &json!({"city": "Oslo", "extra": [1, 2]})));
    }

    #[test]
    fn test_non_object_arguments() {
        let err = validate(&weather_schema(), &json!("city=Oslo")).unwrap_err();
        assert!(err.path.is_root());
        assert_eq!(
            err.kind,
            ValidationErrorKind::TypeMismatch {
                expected: SchemaKind::Object,
                found: "string"
            }
        );
    }

    #[test]
    fn test_array_items_short_circuit_with_index_path() {
        let schema = compile(&json!({
            "type": "object",
            "properties": {
                "stops": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"name": {"type": "string"}},
                        "required": ["name"]
                    }
                }
            }
        }))
        .unwrap();

        assert!(is_valid(&schema, &json!({"stops": []})));
        assert!(is_valid(&schema, &json!({"stops": [{"name": "a"}, {"name": "b"}]})));

        let err = validate(&schema, &json!({"stops": [{"name": "a"}, {}, {"name": 1}]}))
            .unwrap_err();
        assert_eq!(err.path.to_string(), "$.stops[1].name");
        assert_eq!(
            err.path.segments(),
            &[
                PathSegment::Field("stops".to_string()),
                PathSegment::Index(1),
                PathSegment::Field("name".to_string()),
            ]
        );
        assert_eq!(err.kind, ValidationErrorKind::MissingField);
    }

    #[test]
    fn test_array_of_scalars() {
        let schema = compile(&json!({
            "type": "object",
            "properties": {"tags": {"type": "array", "items": {"type": "string"}}}
        }))
        .unwrap();
        assert!(is_valid(&schema, &json!({"tags": ["a", "b"]})));
        let err = validate(&schema, &json!({"tags": ["a", 1]})).unwrap_err();
        assert_eq!(err.path.to_string(), "$.tags[1]");
    }

    #[test]
    fn test_range_example_from_contract() {
        let schema = compile(&json!({
            "type": "object",
            "properties": {"x": {"type": "number", "minimum": 0, "maximum": 10}},
            "required": ["x"]
        }))
        .unwrap();
        assert!(is_valid(&schema, &json!({"x": 5})));
        let err = validate(&schema, &json!({"x": 15})).unwrap_err();
        assert_eq!(err.path.last_field(), Some("x"));
        assert_eq!(
            err.kind,
            ValidationErrorKind::RangeViolation {
                bound: Bound::Maximum(10.0),
                actual: 15.0
            }
        );
    }

    #[test]
    fn test_zero_bounds_are_enforced() {
        let schema = compile(&json!({
            "type": "object",
            "properties": {"x": {"type": "number", "minimum": 0, "maximum": 0}},
            "required": ["x"]
        }))
        .unwrap();
        assert!(is_valid(&schema, &json!({"x": 0})));

        let err = validate(&schema, &json!({"x": -1})).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::RangeViolation {
                bound: Bound::Minimum(0.0),
                actual: -1.0
            }
        );
        assert_eq!(err.to_string(), "$.x: value -1 is less than minimum 0");

        let err = validate(&schema, &json!({"x": 1})).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::RangeViolation {
                bound: Bound::Maximum(0.0),
                actual: 1.0
            }
        );
    }
}
