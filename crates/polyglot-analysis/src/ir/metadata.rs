//! Extended attributes carried by every node.

use serde::{Deserialize, Serialize};

/// Language-specific detail that has no first-class field.
///
/// Advisory only: clearing it never changes what a tree means structurally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Generic type parameters, e.g. `["T extends Comparable<T>"]`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,
    /// Raw annotation text, e.g. `["@Override"]`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
    /// Modifier keywords in source order, e.g. `["public", "static"]`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    /// Declared exception types.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub throws: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_annotation: Option<String>,
    /// `(imported, local)` pairs for renamed imports.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<(String, String)>,
    /// Number of `for` clauses in a desugared comprehension.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_count: Option<usize>,
    /// Native construct a node was rewritten from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desugared_from: Option<String>,
    /// Finer shape than the node kind tells, e.g. `"tuple"` on a `List`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind_hint: Option<String>,
    /// Enclosing package of a module, e.g. a Java `package` declaration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        *self == Metadata::default()
    }

    pub fn desugared(from: &str) -> Self {
        Self {
            desugared_from: Some(from.to_string()),
            ..Default::default()
        }
    }

    pub fn hint(kind_hint: &str) -> Self {
        Self {
            kind_hint: Some(kind_hint.to_string()),
            ..Default::default()
        }
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}
