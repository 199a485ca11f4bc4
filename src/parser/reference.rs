// src/parser/reference.rs

use serde_json::Value;
use thiserror::Error;

/// Failures raised while resolving or expanding schema fragments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Reference '{0}' not found in schema document")]
    ReferenceNotFound(String),

    #[error("Reference '{0}' is not a local '#/' pointer")]
    InvalidReference(String),

    #[error("Cyclic reference '{reference}' (chain: {})", .chain.join(" -> "))]
    CyclicReference {
        reference: String,
        chain: Vec<String>,
    },

    #[error("Reference '{reference}' exceeds the maximum expansion depth of {limit}")]
    DepthExceeded {
        reference: String,
        limit: usize,
    },

    #[error("Body parameter has no schema")]
    MissingSchema,

    #[error("Property name '{0}' is reserved for references")]
    ReservedPropertyName(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

const LOCAL_PREFIX: &str = "#/";

/// Resolve a `#/a/b/c` reference against the document root.
///
/// Each segment indexes into the current subtree: mapping keys by name
/// (with `~1` and `~0` unescaped to `/` and `~`), sequences by position.
/// Resolution is all-or-nothing; a missing segment fails with
/// [`SchemaError::ReferenceNotFound`] carrying the original reference.
pub fn resolve_ref<'a>(reference: &str, document: &'a Value) -> Result<&'a Value> {
    let pointer = reference
        .strip_prefix(LOCAL_PREFIX)
        .ok_or_else(|| SchemaError::InvalidReference(reference.to_string()))?;

    let mut current = document;
    for segment in pointer.split('/') {
        let key = segment.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            _ => None,
        }
        .ok_or_else(|| SchemaError::ReferenceNotFound(reference.to_string()))?;
    }

    tracing::trace!(reference, "resolved reference");
    Ok(current)
}

/// The `$ref` target of a fragment, if the fragment is a reference
pub fn ref_target(fragment: &Value) -> Option<&str> {
    fragment.get("$ref").and_then(Value::as_str)
}
