// Defaults applied while extracting endpoints from a schema document.

/// Section used for operations that declare no tags.
pub const DEFAULT_TAG: &str = "default";

/// Type given to parameters that do not declare one.
pub const DEFAULT_PARAM_TYPE: &str = "string";

/// Type given to schema properties and array items that do not declare one.
pub const UNKNOWN_SCHEMA_TYPE: &str = "unknown";

/// Whether a parameter is required when the document does not say.
pub const DEFAULT_REQUIRED: bool = false;

/// Longest `$ref` chain followed before expansion gives up.
pub const DEFAULT_MAX_REF_DEPTH: usize = 32;

/// Key and value of the body used when a body schema cannot be expanded.
pub const FALLBACK_BODY_KEY: &str = "body";
pub const FALLBACK_BODY_VALUE: &str = "data";

/// HTTP verbs a Swagger path item may declare.
pub const HTTP_METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

/// Which keys of a path item are treated as operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodFilter {
    /// Only the standard HTTP verbs; `parameters` and vendor keys are skipped
    #[default]
    Standard,
    /// Every mapping-valued key is an operation
    Any,
}

impl MethodFilter {
    pub fn accepts(&self, key: &str) -> bool {
        match self {
            MethodFilter::Standard => HTTP_METHODS.contains(&key.to_ascii_lowercase().as_str()),
            MethodFilter::Any => true,
        }
    }
}

/// Options controlling how a schema document is turned into sections
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    pub default_tag: String,
    pub default_param_type: String,
    pub unknown_type: String,
    pub default_required: bool,
    pub max_ref_depth: usize,
    pub method_filter: MethodFilter,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_tag: DEFAULT_TAG.to_string(),
            default_param_type: DEFAULT_PARAM_TYPE.to_string(),
            unknown_type: UNKNOWN_SCHEMA_TYPE.to_string(),
            default_required: DEFAULT_REQUIRED,
            max_ref_depth: DEFAULT_MAX_REF_DEPTH,
            method_filter: MethodFilter::default(),
        }
    }
}

impl ParseOptions {
    pub fn with_default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = tag.into();
        self
    }

    pub fn with_max_ref_depth(mut self, depth: usize) -> Self {
        self.max_ref_depth = depth;
        self
    }

    pub fn with_method_filter(mut self, filter: MethodFilter) -> Self {
        self.method_filter = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_filter_skips_path_level_keys() {
        let filter = MethodFilter::Standard;
        assert!(filter.accepts("get"));
        assert!(filter.accepts("PATCH"));
        assert!(!filter.accepts("parameters"));
        assert!(!filter.accepts("x-swagger-router-controller"));
        assert!(MethodFilter::Any.accepts("parameters"));
    }

    #[test]
    fn builders_override_defaults() {
        let options = ParseOptions::default()
            .with_default_tag("misc")
            .with_max_ref_depth(4);
        assert_eq!(options.default_tag, "misc");
        assert_eq!(options.max_ref_depth, 4);
        assert_eq!(options.default_param_type, DEFAULT_PARAM_TYPE);
    }
}
