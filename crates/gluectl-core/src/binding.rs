//! Invocation context and request construction
//!
//! Callers bind values to an operation's local field names; [`build_request`]
//! turns the bound set into the JSON request document, placing each value at
//! its wire path.
//!
//! [`build_request`]: InvocationContext::build_request

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use tracing::trace;

use crate::descriptor::{FieldSpec, FieldType, OperationDescriptor};
use crate::error::{CoreError, Result};
use crate::select::Selector;

/// A value bound to one input field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    String(String),
    Boolean(bool),
    Integer(i64),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
    Json(Value),
}

impl FieldValue {
    /// Convert raw command-line text according to the field's type
    pub fn parse(field: &FieldSpec, raw: &[String]) -> Result<Self> {
        let invalid = |reason: String| CoreError::InvalidArgument {
            parameter: field.local.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Ok(FieldValue::Null);
        }

        if !field.ty.is_repeatable() && raw.len() > 1 {
            return Err(invalid(format!(
                "expects a single value, got {}",
                raw.len()
            )));
        }

        let first = raw[0].trim();
        let single_empty = raw.len() == 1 && first.is_empty();

        match field.ty {
            FieldType::String => Ok(FieldValue::String(raw[0].clone())),
            _ if single_empty => Ok(FieldValue::Null),
            FieldType::Boolean => match first.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(FieldValue::Boolean(true)),
                "false" | "0" | "no" => Ok(FieldValue::Boolean(false)),
                other => Err(invalid(format!("'{}' is not a boolean", other))),
            },
            FieldType::Integer => first
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|e| invalid(format!("'{}' is not an integer: {}", first, e))),
            FieldType::StringList => Ok(FieldValue::List(raw.to_vec())),
            FieldType::StringMap => parse_map(raw).map(FieldValue::Map).map_err(invalid),
            FieldType::Structure => serde_json::from_str(first)
                .map(FieldValue::Json)
                .map_err(|e| invalid(format!("invalid JSON: {}", e))),
        }
    }

    /// Null, an empty string or an empty collection
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::String(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Map(entries) => entries.is_empty(),
            FieldValue::Json(value) => value.is_null(),
            FieldValue::Boolean(_) | FieldValue::Integer(_) => false,
        }
    }

    /// Fresh JSON copy of the value
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            FieldValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
            FieldValue::Json(value) => value.clone(),
        }
    }

    fn accepts(&self, ty: FieldType) -> bool {
        matches!(
            (self, ty),
            (FieldValue::Null, _)
                | (FieldValue::Json(_), _)
                | (FieldValue::String(_), FieldType::String)
                | (FieldValue::Boolean(_), FieldType::Boolean)
                | (FieldValue::Integer(_), FieldType::Integer)
                | (FieldValue::List(_), FieldType::StringList)
                | (FieldValue::Map(_), FieldType::StringMap)
        )
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Json(value)
    }
}

/// `key=value` pairs, or one JSON object
fn parse_map(raw: &[String]) -> std::result::Result<BTreeMap<String, String>, String> {
    if let [single] = raw
        && single.trim_start().starts_with('{')
    {
        let object: Map<String, Value> =
            serde_json::from_str(single).map_err(|e| format!("invalid JSON object: {}", e))?;
        return Ok(object
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect());
    }

    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| format!("'{}' is not a key=value pair", pair))
        })
        .collect()
}

/// Non-fatal problems found while building a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingWarning {
    /// Required field bound to an empty value; it is still sent
    RequiredEmpty { parameter: &'static str },
    /// Required field never bound; it is left out of the request
    RequiredUnbound { parameter: &'static str },
}

impl BindingWarning {
    pub fn parameter(&self) -> &'static str {
        match self {
            BindingWarning::RequiredEmpty { parameter }
            | BindingWarning::RequiredUnbound { parameter } => parameter,
        }
    }
}

impl fmt::Display for BindingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingWarning::RequiredEmpty { parameter } => write!(
                f,
                "required parameter '{}' is empty; sending the request anyway",
                parameter
            ),
            BindingWarning::RequiredUnbound { parameter } => write!(
                f,
                "required parameter '{}' was not specified; the service may reject the request",
                parameter
            ),
        }
    }
}

/// Inputs for one invocation of one operation
#[derive(Debug, Clone)]
pub struct InvocationContext {
    operation: &'static OperationDescriptor,
    bound: BTreeMap<&'static str, FieldValue>,
    selector: Selector,
    no_auto_iteration: bool,
}

impl InvocationContext {
    pub fn new(operation: &'static OperationDescriptor) -> Self {
        Self {
            operation,
            bound: BTreeMap::new(),
            selector: operation.default_selector(),
            no_auto_iteration: false,
        }
    }

    pub fn operation(&self) -> &'static OperationDescriptor {
        self.operation
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    #[must_use]
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Stop after the first page even when more results exist
    #[must_use]
    pub fn with_no_auto_iteration(mut self, no_auto_iteration: bool) -> Self {
        self.no_auto_iteration = no_auto_iteration;
        self
    }

    pub fn no_auto_iteration(&self) -> bool {
        self.no_auto_iteration
    }

    fn spec(&self, local: &str) -> Result<&'static FieldSpec> {
        self.operation
            .field(local)
            .ok_or_else(|| CoreError::InvalidArgument {
                parameter: local.to_string(),
                reason: format!("not a parameter of {}", self.operation.command),
            })
    }

    /// Bind a typed value; rebinding replaces the previous value
    pub fn bind(&mut self, local: &str, value: impl Into<FieldValue>) -> Result<&mut Self> {
        let field = self.spec(local)?;
        let value = value.into();
        if !value.accepts(field.ty) {
            return Err(CoreError::InvalidArgument {
                parameter: field.local.to_string(),
                reason: format!("expected a {} value", field.ty.label()),
            });
        }
        trace!("bound {}.{} = {:?}", self.operation.name, field.local, value);
        self.bound.insert(field.local, value);
        Ok(self)
    }

    /// Bind from raw command-line text
    pub fn bind_raw(&mut self, local: &str, raw: &[String]) -> Result<&mut Self> {
        let field = self.spec(local)?;
        let value = FieldValue::parse(field, raw)?;
        self.bind(field.local, value)
    }

    pub fn value(&self, local: &str) -> Option<&FieldValue> {
        let field = self.operation.field(local)?;
        self.bound.get(field.local)
    }

    pub fn is_bound(&self, local: &str) -> bool {
        self.value(local).is_some()
    }

    /// Cursor the caller asked to start from, if any
    pub fn starting_cursor(&self) -> Option<String> {
        let cursor = self.operation.cursor_field()?;
        match self.bound.get(cursor.local) {
            Some(FieldValue::String(token)) if !token.is_empty() => Some(token.clone()),
            _ => None,
        }
    }

    /// True when only one page should be fetched: the caller disabled
    /// auto-iteration or passed a cursor of their own
    pub fn user_controls_paging(&self) -> bool {
        self.no_auto_iteration
            || self
                .operation
                .cursor_field()
                .is_some_and(|c| self.bound.contains_key(c.local))
    }

    /// Request document for the bound values, cursor excluded
    pub fn build_request(&self) -> (Value, Vec<BindingWarning>) {
        let cursor = self.operation.cursor_field().map(|c| c.local);
        let mut request = Value::Object(Map::new());
        let mut warnings = Vec::new();

        for field in self.operation.fields {
            if Some(field.local) == cursor {
                continue;
            }
            match self.bound.get(field.local) {
                None if field.required => warnings.push(BindingWarning::RequiredUnbound {
                    parameter: field.local,
                }),
                None => {}
                Some(value) if field.required => {
                    if value.is_empty() {
                        warnings.push(BindingWarning::RequiredEmpty {
                            parameter: field.local,
                        });
                    }
                    insert_at(&mut request, field, value.to_json());
                }
                Some(FieldValue::Null) => {}
                Some(value) => insert_at(&mut request, field, value.to_json()),
            }
        }

        (request, warnings)
    }
}

/// Place `value` at the field's wire path, creating intermediate objects
pub(crate) fn insert_at(request: &mut Value, field: &FieldSpec, value: Value) {
    let segments: Vec<&str> = field.wire_path().collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut node = request;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.to_string(), value);
    }
}
