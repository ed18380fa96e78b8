//! GraphQL structural inspection.
//!
//! # Responsibilities
//! - Reject bodies that are not JSON
//! - Reject introspection probes (`__schema`, `__type`)
//! - Compute selection-set depth and enforce the ceiling
//!
//! # Design Decisions
//! - Introspection is rejected before parsing, regardless of depth
//! - A lexical bracket scan bounds nesting before the recursive parser runs
//! - Depth is computed with an explicit stack, never recursion
//! - Parser messages are truncated before they reach responses or logs

use graphql_parser::query::{parse_query, Definition, OperationDefinition, Selection, SelectionSet};
use serde_json::Value;
use std::fmt;

/// Maximum length of a parser message carried in a reason code.
pub const MAX_ERROR_CHARS: usize = 50;

/// A structural GraphQL violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphqlViolation {
    InvalidJson,
    Introspection,
    DepthExceeded { depth: usize, limit: usize },
    Parse(String),
}

impl GraphqlViolation {
    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            GraphqlViolation::InvalidJson => "graphql_invalid_json",
            GraphqlViolation::Introspection => "graphql_introspection",
            GraphqlViolation::DepthExceeded { .. } => "graphql_depth",
            GraphqlViolation::Parse(_) => "graphql_parse",
        }
    }

    fn parse_error(message: impl fmt::Display) -> Self {
        let message: String = message.to_string().chars().take(MAX_ERROR_CHARS).collect();
        GraphqlViolation::Parse(message)
    }
}

impl fmt::Display for GraphqlViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphqlViolation::InvalidJson => f.write_str("Invalid JSON in GraphQL request"),
            GraphqlViolation::Introspection => f.write_str("GraphQL Introspection Blocked"),
            GraphqlViolation::DepthExceeded { depth, limit } => {
                write!(f, "Query depth {depth} exceeds limit {limit}")
            }
            GraphqlViolation::Parse(message) => write!(f, "GraphQL parsing error: {message}"),
        }
    }
}

/// Inspects GraphQL request bodies.
#[derive(Debug, Clone)]
pub struct GraphqlInspector {
    max_depth: usize,
    max_nesting: usize,
}

impl GraphqlInspector {
    pub fn new(max_depth: usize, max_nesting: usize) -> Self {
        Self {
            max_depth,
            max_nesting,
        }
    }

    /// Inspect a request body. `Ok(())` means clean.
    ///
    /// The body must be a single JSON object; arrays are parse errors.
    pub fn inspect(&self, body: &str) -> Result<(), GraphqlViolation> {
        if body.trim().is_empty() {
            return Ok(());
        }

        let payload: Value =
            serde_json::from_str(body).map_err(|_| GraphqlViolation::InvalidJson)?;
        self.inspect_envelope(&payload)
    }

    fn inspect_envelope(&self, envelope: &Value) -> Result<(), GraphqlViolation> {
        let envelope = envelope
            .as_object()
            .ok_or_else(|| GraphqlViolation::parse_error("request body must be a JSON object"))?;
        let query = match envelope.get("query") {
            None => "",
            Some(Value::String(query)) => query.as_str(),
            Some(_) => return Err(GraphqlViolation::parse_error("query must be a string")),
        };
        self.inspect_query(query)
    }

    /// Inspect a bare query document.
    pub fn inspect_query(&self, query: &str) -> Result<(), GraphqlViolation> {
        if query.contains("__schema") || query.contains("__type") {
            return Err(GraphqlViolation::Introspection);
        }

        let nesting = bracket_nesting(query);
        if nesting > self.max_nesting {
            tracing::debug!(nesting, "GraphQL query rejected before parsing");
            return Err(GraphqlViolation::DepthExceeded {
                depth: nesting,
                limit: self.max_depth,
            });
        }

        let depth = query_depth(query)?;
        if depth > self.max_depth {
            return Err(GraphqlViolation::DepthExceeded {
                depth,
                limit: self.max_depth,
            });
        }
        Ok(())
    }
}

/// Maximum selection-set depth over every top-level definition.
///
/// A field without children has its own depth; a field with children is one
/// plus the deepest child. `{ a { b { c } } }` has depth 3.
pub fn query_depth(query: &str) -> Result<usize, GraphqlViolation> {
    let document = parse_query::<&str>(query).map_err(GraphqlViolation::parse_error)?;
    if document.definitions.is_empty() {
        return Err(GraphqlViolation::parse_error("document has no definitions"));
    }

    let mut stack: Vec<_> = document
        .definitions
        .iter()
        .map(|definition| (root_selection_set(definition), 1))
        .collect();

    let mut max_depth = 0;
    while let Some((set, depth)) = stack.pop() {
        for item in &set.items {
            max_depth = max_depth.max(depth);
            let children = match item {
                Selection::Field(field) => &field.selection_set,
                Selection::InlineFragment(fragment) => &fragment.selection_set,
                Selection::FragmentSpread(_) => continue,
            };
            if !children.items.is_empty() {
                stack.push((children, depth + 1));
            }
        }
    }
    Ok(max_depth)
}

fn root_selection_set<'d, 'a>(definition: &'d Definition<'a, &'a str>) -> &'d SelectionSet<'a, &'a str> {
    match definition {
        Definition::Operation(OperationDefinition::SelectionSet(set)) => set,
        Definition::Operation(OperationDefinition::Query(query)) => &query.selection_set,
        Definition::Operation(OperationDefinition::Mutation(mutation)) => &mutation.selection_set,
        Definition::Operation(OperationDefinition::Subscription(subscription)) => {
            &subscription.selection_set
        }
        Definition::Fragment(fragment) => &fragment.selection_set,
    }
}

/// Deepest `{`/`[` nesting in a query, ignoring strings and comments.
pub fn bracket_nesting(query: &str) -> usize {
    let bytes = query.as_bytes();
    let mut depth = 0usize;
    let mut max_depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'"' if bytes[i..].starts_with(b"\"\"\"") => {
                i += 3;
                while i < bytes.len() && !bytes[i..].starts_with(b"\"\"\"") {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i += 2;
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' && bytes[i] != b'\n' {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
            }
            b'{' | b'[' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
    max_depth
}
