/// Schema compiler — turns a JSON-Schema-like tool parameter descriptor into a
/// closed [`SchemaNode`] tree.
///
/// Only the subset that tool-call arguments actually use is recognized:
/// `string`, `number`/`integer`/`float`, `boolean`, `array` and `object`.
/// Anything else is rejected up front so validation never has to guess.
///
/// Key invariants:
/// - The root must be an object with a `properties` mapping.
/// - A property is required iff it is listed in the parent's `required`.
/// - Patterns are compiled once here and matched against the whole string.
/// - A compiled tree is immutable and may be shared across threads.
use regex_lite::Regex;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::fmt;

static REGEX_CACHE: std::sync::LazyLock<parking_lot::RwLock<FxHashMap<String, Regex>>> =
    std::sync::LazyLock::new(|| parking_lot::RwLock::new(FxHashMap::default()));

const REGEX_CACHE_CAPACITY: usize = 256;
const ROOT_PATH: &str = "$";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The five value kinds a schema node can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl SchemaKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array => "array",
            SchemaKind::Object => "object",
        }
    }

    /// Map a descriptor `type` keyword onto a kind.
    ///
    /// `integer` and `float` collapse into [`SchemaKind::Number`]; precision
    /// is not enforced at validation time.
    #[must_use]
    pub fn from_type_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(SchemaKind::String),
            "number" | "integer" | "float" => Some(SchemaKind::Number),
            "boolean" => Some(SchemaKind::Boolean),
            "array" => Some(SchemaKind::Array),
            "object" => Some(SchemaKind::Object),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string pattern compiled for whole-string matching.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// The pattern text exactly as written in the descriptor.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_full_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// One compiled node of a tool parameter schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    String {
        pattern: Option<Pattern>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Boolean,
    Array {
        items: Box<SchemaNode>,
    },
    Object {
        fields: Vec<ObjectField>,
    },
}

/// A named member of an object node, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub name: String,
    pub schema: SchemaNode,
    pub required: bool,
    /// Free-text description carried over from the descriptor. Metadata only.
    pub description: Option<String>,
}

impl SchemaNode {
    #[must_use]
    pub fn kind(&self) -> SchemaKind {
        match self {
            SchemaNode::String { .. } => SchemaKind::String,
            SchemaNode::Number { .. } => SchemaKind::Number,
            SchemaNode::Boolean => SchemaKind::Boolean,
            SchemaNode::Array { .. } => SchemaKind::Array,
            SchemaNode::Object { .. } => SchemaKind::Object,
        }
    }

    /// Look up an object field by name. Returns `None` for non-object nodes.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ObjectField> {
        match self {
            SchemaNode::Object { fields } => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }
}

/// Reasons a descriptor cannot be compiled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnsupportedSchemaError {
    #[error("Unsupported root schema type: expected an object with properties")]
    RootNotObject,
    #[error("Unsupported type at '{path}': {found}")]
    UnsupportedType { path: String, found: String },
    #[error("object at '{path}' has no properties mapping")]
    MissingProperties { path: String },
    #[error("array at '{path}' has no items schema")]
    MissingItems { path: String },
    #[error("invalid pattern {pattern:?} at '{path}': {message}")]
    InvalidPattern {
        path: String,
        pattern: String,
        message: String,
    },
    #[error("'{keyword}' at '{path}' must be a number")]
    InvalidBound { path: String, keyword: &'static str },
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Compile a tool parameter descriptor into a [`SchemaNode`].
///
/// The descriptor root must be `{"type": "object", "properties": {...}}`,
/// mirroring the contract that tool-call arguments are always a JSON object.
///
/// # Errors
///
/// Returns [`UnsupportedSchemaError`] when the root is not an object schema,
/// a property declares an unrecognized type, an array lacks `items`, or a
/// constraint keyword is malformed.
pub fn compile(descriptor: &Value) -> Result<SchemaNode, UnsupportedSchemaError> {
    let Some(obj) = descriptor.as_object() else {
        return Err(UnsupportedSchemaError::RootNotObject);
    };
    if type_keyword(obj) != Some("object") || !obj.get("properties").is_some_and(Value::is_object)
    {
        return Err(UnsupportedSchemaError::RootNotObject);
    }
    compile_object(obj, ROOT_PATH)
}

// ---------------------------------------------------------------------------
// Recursive walk
// ---------------------------------------------------------------------------

#[inline]
fn type_keyword(obj: &Map<String, Value>) -> Option<&str> {
    obj.get("type").and_then(Value::as_str)
}

fn compile_object(
    obj: &Map<String, Value>,
    path: &str,
) -> Result<SchemaNode, UnsupportedSchemaError> {
    let Some(properties) = obj.get("properties").and_then(Value::as_object) else {
        return Err(UnsupportedSchemaError::MissingProperties {
            path: path.to_string(),
        });
    };

    let required: Vec<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut fields = Vec::with_capacity(properties.len());
    for (name, prop) in properties {
        let field_path = format!("{path}.{name}");
        let schema = compile_node(prop, &field_path)?;
        let description = prop
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        fields.push(ObjectField {
            name: name.clone(),
            schema,
            required: required.contains(&name.as_str()),
            description,
        });
    }

    Ok(SchemaNode::Object { fields })
}

fn compile_node(descriptor: &Value, path: &str) -> Result<SchemaNode, UnsupportedSchemaError> {
    let Some(obj) = descriptor.as_object() else {
        return Err(UnsupportedSchemaError::UnsupportedType {
            path: path.to_string(),
            found: describe_type(None),
        });
    };

    let keyword = type_keyword(obj);
    let Some(kind) = keyword.and_then(SchemaKind::from_type_keyword) else {
        return Err(UnsupportedSchemaError::UnsupportedType {
            path: path.to_string(),
            found: describe_type(obj.get("type")),
        });
    };

    match kind {
        SchemaKind::String => Ok(SchemaNode::String {
            pattern: compile_pattern(obj, path)?,
        }),
        SchemaKind::Number => Ok(SchemaNode::Number {
            minimum: numeric_bound(obj, "minimum", path)?,
            maximum: numeric_bound(obj, "maximum", path)?,
        }),
        SchemaKind::Boolean => Ok(SchemaNode::Boolean),
        SchemaKind::Array => {
            let Some(items) = obj.get("items").filter(|items| !items.is_null()) else {
                return Err(UnsupportedSchemaError::MissingItems {
                    path: path.to_string(),
                });
            };
            let items = compile_node(items, &format!("{path}[]"))?;
            Ok(SchemaNode::Array {
                items: Box::new(items),
            })
        }
        SchemaKind::Object => compile_object(obj, path),
    }
}

fn describe_type(found: Option<&Value>) -> String {
    match found {
        None | Some(Value::Null) => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn numeric_bound(
    obj: &Map<String, Value>,
    keyword: &'static str,
    path: &str,
) -> Result<Option<f64>, UnsupportedSchemaError> {
    match obj.get(keyword) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(_) => Err(UnsupportedSchemaError::InvalidBound {
            path: path.to_string(),
            keyword,
        }),
    }
}

fn compile_pattern(
    obj: &Map<String, Value>,
    path: &str,
) -> Result<Option<Pattern>, UnsupportedSchemaError> {
    let source = match obj.get("pattern") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.is_empty() => return Ok(None),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(UnsupportedSchemaError::InvalidPattern {
                path: path.to_string(),
                pattern: other.to_string(),
                message: "pattern must be a string".to_string(),
            })
        }
    };

    let regex = cached_full_match_regex(source).map_err(|message| {
        UnsupportedSchemaError::InvalidPattern {
            path: path.to_string(),
            pattern: source.clone(),
            message,
        }
    })?;
    Ok(Some(Pattern {
        source: source.clone(),
        regex,
    }))
}

fn cached_full_match_regex(pattern: &str) -> Result<Regex, String> {
    if let Some(cached) = REGEX_CACHE.read().get(pattern) {
        return Ok(cached.clone());
    }

    let compiled = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| e.to_string())?;
    let mut cache = REGEX_CACHE.write();
    if cache.len() >= REGEX_CACHE_CAPACITY {
        cache.clear();
    }
    cache.insert(pattern.to_string(), compiled.clone());
    Ok(compiled)
}
