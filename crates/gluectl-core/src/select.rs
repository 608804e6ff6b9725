//! Result selection
//!
//! A selector decides which part of each response page is handed back to
//! the caller: one named response field, the whole response (`*`) or one of
//! the bound inputs echoed back (`^Name`).

use std::fmt;

use serde_json::Value;

use crate::binding::InvocationContext;
use crate::descriptor::OperationDescriptor;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A top-level member of the response
    Field(String),
    /// The entire response object
    WholeResponse,
    /// A bound input, by local name
    EchoInput(String),
}

impl Selector {
    /// Parse a `--select` expression against the operation it will be used with
    pub fn parse(expression: &str, operation: &OperationDescriptor) -> Result<Self> {
        let expr = expression.trim();
        let invalid = |reason: String| CoreError::InvalidSelect {
            expression: expression.to_string(),
            reason,
        };

        if expr == "*" {
            return Ok(Selector::WholeResponse);
        }

        if let Some(name) = expr.strip_prefix('^') {
            if name.is_empty() {
                return Err(invalid("'^' must be followed by a parameter name".to_string()));
            }
            let field = operation.field(name).ok_or_else(|| {
                invalid(format!(
                    "{} has no parameter named '{}'",
                    operation.command, name
                ))
            })?;
            return Ok(Selector::EchoInput(field.local.to_string()));
        }

        if expr.is_empty() {
            return Err(invalid("expression is empty".to_string()));
        }
        if !expr.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid(
                "expected '*', '^ParameterName' or a response field name".to_string(),
            ));
        }
        Ok(Selector::Field(expr.to_string()))
    }

    /// Evaluate against one response; `None` when nothing is selected
    pub fn apply(&self, response: &Value, context: &InvocationContext) -> Option<Value> {
        let selected = match self {
            Selector::WholeResponse => Some(response.clone()),
            Selector::Field(name) => response.get(name).cloned(),
            Selector::EchoInput(name) => context.value(name).map(|v| v.to_json()),
        };
        selected.filter(|v| !v.is_null())
    }

    /// Evaluate and unroll: arrays contribute one item per element
    pub fn items(&self, response: &Value, context: &InvocationContext) -> Vec<Value> {
        unroll(self.apply(response, context))
    }
}

/// Flatten a selected value into items
pub fn unroll(selected: Option<Value>) -> Vec<Value> {
    match selected {
        Some(Value::Array(items)) => items,
        Some(value) => vec![value],
        None => Vec::new(),
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Field(name) => write!(f, "{}", name),
            Selector::WholeResponse => write!(f, "*"),
            Selector::EchoInput(name) => write!(f, "^{}", name),
        }
    }
}
