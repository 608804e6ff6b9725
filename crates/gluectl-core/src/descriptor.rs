//! Operation descriptors
//!
//! A descriptor names one remote operation, the inputs it accepts and the
//! part of its response callers usually care about. Descriptors are plain
//! `'static` data built with `const fn` helpers so the whole table in
//! [`crate::operations`] is evaluated at compile time.

use heck::ToKebabCase;

use crate::select::Selector;

/// Semantic type of an input field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Boolean,
    Integer,
    StringList,
    StringMap,
    /// Arbitrary JSON: nested filter/update objects or lists of structures
    Structure,
}

impl FieldType {
    /// Short name used in help output and `operations describe`
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::StringList => "string list",
            FieldType::StringMap => "key=value map",
            FieldType::Structure => "json",
        }
    }

    /// Whether the CLI should accept the flag more than once
    pub fn is_repeatable(&self) -> bool {
        matches!(self, FieldType::StringList | FieldType::StringMap)
    }
}

/// One input field of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Caller-facing name, e.g. `MaxResult`
    pub local: &'static str,
    /// Dot-separated path into the request object, e.g. `MaxResults` or
    /// `IntegrationConfig.RefreshInterval`
    pub wire: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

impl FieldSpec {
    pub const fn new(local: &'static str, wire: &'static str, ty: FieldType) -> Self {
        Self {
            local,
            wire,
            ty,
            required: false,
        }
    }

    pub const fn string(local: &'static str, wire: &'static str) -> Self {
        Self::new(local, wire, FieldType::String)
    }

    pub const fn boolean(local: &'static str, wire: &'static str) -> Self {
        Self::new(local, wire, FieldType::Boolean)
    }

    pub const fn integer(local: &'static str, wire: &'static str) -> Self {
        Self::new(local, wire, FieldType::Integer)
    }

    pub const fn list(local: &'static str, wire: &'static str) -> Self {
        Self::new(local, wire, FieldType::StringList)
    }

    pub const fn map(local: &'static str, wire: &'static str) -> Self {
        Self::new(local, wire, FieldType::StringMap)
    }

    pub const fn structure(local: &'static str, wire: &'static str) -> Self {
        Self::new(local, wire, FieldType::Structure)
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Segments of the wire path
    pub fn wire_path(&self) -> impl Iterator<Item = &'static str> {
        self.wire.split('.')
    }

    /// Command-line flag name without the leading dashes
    pub fn flag(&self) -> String {
        self.local.to_kebab_case()
    }
}

/// Continuation-token wiring for paginated operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    /// Local name of the input field carrying the cursor (`NextToken`, `Marker`)
    pub input: &'static str,
    /// Response field holding the cursor for the next page
    pub output: &'static str,
}

impl Paging {
    pub const NEXT_TOKEN: Paging = Paging {
        input: "NextToken",
        output: "NextToken",
    };

    pub const MARKER: Paging = Paging {
        input: "Marker",
        output: "Marker",
    };
}

/// Shape of the output callers receive by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// A single structured member of the response
    Field(&'static str),
    /// A collection member; items are emitted individually
    Collection(&'static str),
    /// The entire response object
    Whole,
}

/// How disruptive an operation is; `High` operations require confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfirmImpact {
    Low,
    Medium,
    High,
}

/// Static description of one remote operation
#[derive(Debug, Clone, Copy)]
pub struct OperationDescriptor {
    /// Wire operation name, e.g. `GetBlueprint`
    pub name: &'static str,
    /// Verb-noun command name, e.g. `Get-Blueprint`
    pub command: &'static str,
    pub summary: &'static str,
    pub fields: &'static [FieldSpec],
    pub output: Output,
    pub paging: Option<Paging>,
    pub impact: ConfirmImpact,
}

impl OperationDescriptor {
    /// Look up a field by local name (case-insensitive)
    pub fn field(&self, local: &str) -> Option<&'static FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.local.eq_ignore_ascii_case(local))
    }

    pub fn is_paginated(&self) -> bool {
        self.paging.is_some()
    }

    /// The input field that carries the page cursor, if paginated
    pub fn cursor_field(&self) -> Option<&'static FieldSpec> {
        self.paging.and_then(|p| self.field(p.input))
    }

    /// Selector used when the caller does not pass one
    pub fn default_selector(&self) -> Selector {
        match self.output {
            Output::Field(name) | Output::Collection(name) => Selector::Field(name.to_string()),
            Output::Whole => Selector::WholeResponse,
        }
    }

    pub fn returns_collection(&self) -> bool {
        matches!(self.output, Output::Collection(_))
    }

    /// Kebab-case subcommand name, e.g. `get-blueprint`
    pub fn cli_name(&self) -> String {
        self.command.to_kebab_case()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}
