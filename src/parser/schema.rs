// src/parser/schema.rs

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use super::options::ParseOptions;
use super::reference::{ref_target, resolve_ref, Result, SchemaError};

const REF_KEY: &str = "$ref";

/// The shapes a schema fragment can take, as far as expansion cares
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaNode<'a> {
    /// `{"$ref": "#/..."}`
    Reference(&'a str),
    /// `type: object` with a `properties` mapping
    Object(&'a Map<String, Value>),
    /// `type: array` with an `items` fragment
    Array(&'a Value),
    /// Any other declared type, including objects without properties
    Scalar(&'a str),
    /// No usable `type` at all
    Unknown,
}

impl<'a> SchemaNode<'a> {
    pub fn classify(fragment: &'a Value) -> Self {
        if let Some(reference) = ref_target(fragment) {
            return SchemaNode::Reference(reference);
        }

        match fragment.get("type").and_then(Value::as_str) {
            Some("object") => match fragment.get("properties").and_then(Value::as_object) {
                Some(properties) => SchemaNode::Object(properties),
                None => SchemaNode::Scalar("object"),
            },
            Some("array") => match fragment.get("items") {
                Some(items) => SchemaNode::Array(items),
                None => SchemaNode::Scalar("array"),
            },
            Some(other) => SchemaNode::Scalar(other),
            None => SchemaNode::Unknown,
        }
    }
}

/// A property of an expanded schema: a type name or a nested expansion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaValue {
    Primitive(String),
    Nested(ExpandedSchema),
}

impl SchemaValue {
    pub fn as_primitive(&self) -> Option<&str> {
        match self {
            SchemaValue::Primitive(name) => Some(name),
            SchemaValue::Nested(_) => None,
        }
    }

    pub fn as_nested(&self) -> Option<&ExpandedSchema> {
        match self {
            SchemaValue::Nested(schema) => Some(schema),
            SchemaValue::Primitive(_) => None,
        }
    }
}

impl From<&SchemaValue> for Value {
    fn from(value: &SchemaValue) -> Self {
        match value {
            SchemaValue::Primitive(name) => Value::String(name.clone()),
            SchemaValue::Nested(schema) => Value::from(schema),
        }
    }
}

/// Property name to type mapping with every `$ref` replaced by its expansion.
///
/// Object properties keep their nesting; array item types are stored under
/// the `items` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExpandedSchema {
    fields: IndexMap<String, SchemaValue>,
}

impl ExpandedSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: SchemaValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&SchemaValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemaValue)> {
        self.fields.iter()
    }

    /// True if a `$ref` key survives anywhere in the expansion
    pub fn contains_reference(&self) -> bool {
        self.fields.iter().any(|(name, value)| {
            name == REF_KEY || value.as_nested().map_or(false, ExpandedSchema::contains_reference)
        })
    }
}

impl<K: Into<String>> FromIterator<(K, SchemaValue)> for ExpandedSchema {
    fn from_iter<I: IntoIterator<Item = (K, SchemaValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl From<&ExpandedSchema> for Value {
    fn from(schema: &ExpandedSchema) -> Self {
        Value::Object(
            schema
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), Value::from(value)))
                .collect(),
        )
    }
}

/// Expands schema fragments against a document, following `$ref`s.
///
/// The walker keeps the chain of references currently being expanded. A
/// reference that is already on the chain fails with
/// [`SchemaError::CyclicReference`]; a chain longer than
/// `max_ref_depth` fails with [`SchemaError::DepthExceeded`]. The same
/// definition may still be used by sibling properties.
pub struct SchemaWalker<'a> {
    document: &'a Value,
    options: &'a ParseOptions,
}

impl<'a> SchemaWalker<'a> {
    pub fn new(document: &'a Value, options: &'a ParseOptions) -> Self {
        Self { document, options }
    }

    pub fn expand(&self, fragment: &Value) -> Result<ExpandedSchema> {
        let mut chain = Vec::new();
        self.expand_fragment(fragment, &mut chain)
    }

    fn expand_fragment(&self, fragment: &Value, chain: &mut Vec<String>) -> Result<ExpandedSchema> {
        match SchemaNode::classify(fragment) {
            SchemaNode::Reference(reference) => self.follow(reference, chain),
            SchemaNode::Object(properties) => {
                let mut expanded = ExpandedSchema::new();
                for (name, property) in properties {
                    if name == REF_KEY {
                        return Err(SchemaError::ReservedPropertyName(name.clone()));
                    }
                    expanded.insert(name.as_str(), self.expand_member(property, chain)?);
                }
                Ok(expanded)
            }
            SchemaNode::Array(items) => {
                let mut expanded = ExpandedSchema::new();
                expanded.insert("items", self.expand_member(items, chain)?);
                Ok(expanded)
            }
            SchemaNode::Scalar(_) | SchemaNode::Unknown => Ok(ExpandedSchema::new()),
        }
    }

    // Properties and array items only descend through references; inline
    // fragments contribute their declared type.
    fn expand_member(&self, member: &Value, chain: &mut Vec<String>) -> Result<SchemaValue> {
        match ref_target(member) {
            Some(reference) => Ok(SchemaValue::Nested(self.follow(reference, chain)?)),
            None => Ok(SchemaValue::Primitive(
                member
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or(self.options.unknown_type.as_str())
                    .to_string(),
            )),
        }
    }

    fn follow(&self, reference: &str, chain: &mut Vec<String>) -> Result<ExpandedSchema> {
        if chain.iter().any(|seen| seen == reference) {
            let mut cycle = chain.clone();
            cycle.push(reference.to_string());
            return Err(SchemaError::CyclicReference {
                reference: reference.to_string(),
                chain: cycle,
            });
        }
        if chain.len() >= self.options.max_ref_depth {
            return Err(SchemaError::DepthExceeded {
                reference: reference.to_string(),
                limit: self.options.max_ref_depth,
            });
        }

        let target = resolve_ref(reference, self.document)?;
        tracing::debug!(reference, depth = chain.len(), "expanding reference");

        chain.push(reference.to_string());
        let expanded = self.expand_fragment(target, chain);
        chain.pop();
        expanded
    }
}
