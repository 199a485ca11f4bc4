// src/parser/endpoints.rs

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::options::{ParseOptions, FALLBACK_BODY_KEY, FALLBACK_BODY_VALUE};
use super::reference::{ref_target, resolve_ref, SchemaError};
use super::schema::{ExpandedSchema, SchemaValue, SchemaWalker};
use super::swagger::{ParserError, Result};
use crate::utils::{capitalize, sanitize_identifier};

/// Where a parameter is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamLocation {
    Query,
    Path,
    Body,
    FormData,
    Header,
    /// Any other `in` value; the parameter is only kept in the sequence
    Other(String),
}

impl ParamLocation {
    pub fn parse(location: &str) -> Self {
        match location {
            "query" => ParamLocation::Query,
            "path" => ParamLocation::Path,
            "body" => ParamLocation::Body,
            "formData" => ParamLocation::FormData,
            "header" => ParamLocation::Header,
            other => ParamLocation::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ParamLocation::Query => "query",
            ParamLocation::Path => "path",
            ParamLocation::Body => "body",
            ParamLocation::FormData => "formData",
            ParamLocation::Header => "header",
            ParamLocation::Other(other) => other,
        }
    }
}

impl Serialize for ParamLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A declared parameter of an operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParamLocation,
    pub required: bool,
    #[serde(rename = "type")]
    pub declared_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// How the body of an endpoint was obtained
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum BodyStatus {
    /// No body parameter declared
    Empty,
    Expanded,
    /// Expansion failed and the sentinel body was used instead
    Fallback(String),
}

/// Result of expanding a body parameter's schema
#[derive(Debug, Clone, PartialEq)]
pub enum BodyOutcome {
    Expanded(ExpandedSchema),
    Fallback(SchemaError),
}

impl BodyOutcome {
    /// The body to render and its status
    pub fn into_parts(self) -> (ExpandedSchema, BodyStatus) {
        match self {
            BodyOutcome::Expanded(body) => (body, BodyStatus::Expanded),
            BodyOutcome::Fallback(cause) => (fallback_body(), BodyStatus::Fallback(cause.to_string())),
        }
    }
}

/// The `{"body": "data"}` placeholder used for bodies that cannot be expanded
pub fn fallback_body() -> ExpandedSchema {
    std::iter::once((
        FALLBACK_BODY_KEY,
        SchemaValue::Primitive(FALLBACK_BODY_VALUE.to_string()),
    ))
    .collect()
}

/// One operation of the document, normalised for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointDescriptor {
    pub endpoint: String,
    pub method: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub deprecated: bool,
    pub params: Vec<ParameterDescriptor>,
    pub query_params: IndexMap<String, String>,
    pub body: ExpandedSchema,
    pub body_status: BodyStatus,
    pub formdata: IndexMap<String, String>,
    pub header: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl EndpointDescriptor {
    pub fn path_params(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.params
            .iter()
            .filter(|param| param.location == ParamLocation::Path)
    }
}

/// Endpoints grouped by tag, in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SectionedEndpoints {
    sections: IndexMap<String, Vec<EndpointDescriptor>>,
}

impl SectionedEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: &str, endpoint: EndpointDescriptor) {
        self.sections.entry(tag.to_string()).or_default().push(endpoint);
    }

    pub fn get(&self, tag: &str) -> Option<&[EndpointDescriptor]> {
        self.sections.get(tag).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, tag: &str) -> Option<&mut Vec<EndpointDescriptor>> {
        self.sections.get_mut(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EndpointDescriptor])> {
        self.sections
            .iter()
            .map(|(tag, endpoints)| (tag.as_str(), endpoints.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of descriptors across all sections
    pub fn endpoint_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    /// Class name used for a section, e.g. `pet` -> `PetAPI`
    pub fn class_name(tag: &str) -> String {
        format!("{}API", capitalize(tag))
    }
}

/// Walks the `paths` of a schema document and builds the sectioned endpoints
pub struct EndpointExtractor<'a> {
    document: &'a Value,
    options: &'a ParseOptions,
    walker: SchemaWalker<'a>,
}

impl<'a> EndpointExtractor<'a> {
    pub fn new(document: &'a Value, options: &'a ParseOptions) -> Self {
        Self {
            document,
            options,
            walker: SchemaWalker::new(document, options),
        }
    }

    pub fn extract(&self) -> Result<SectionedEndpoints> {
        let root = self
            .document
            .as_object()
            .ok_or_else(|| ParserError::InvalidDocument("document root is not a mapping".into()))?;

        let mut sections = SectionedEndpoints::new();

        let paths = match root.get("paths").and_then(Value::as_object) {
            Some(paths) => paths,
            None => {
                tracing::warn!("document has no paths; nothing to extract");
                return Ok(sections);
            }
        };

        for (path, path_item) in paths {
            let Some(path_obj) = path_item.as_object() else {
                tracing::warn!(path = %path, "path item is not a mapping, skipping");
                continue;
            };
            let shared = path_obj.get("parameters").and_then(Value::as_array);

            for (method, details) in path_obj {
                if !self.options.method_filter.accepts(method) {
                    continue;
                }
                let Some(details) = details.as_object() else {
                    continue;
                };

                let endpoint = self.build_endpoint(path, method, details, shared);
                tracing::debug!(
                    endpoint = %endpoint.endpoint,
                    method = %endpoint.method,
                    name = %endpoint.name,
                    "extracted endpoint"
                );

                for tag in self.tags(details) {
                    sections.push(&tag, endpoint.clone());
                }
            }
        }

        tracing::info!(
            sections = sections.len(),
            endpoints = sections.endpoint_count(),
            "extracted endpoints"
        );
        Ok(sections)
    }

    fn tags(&self, details: &Map<String, Value>) -> Vec<String> {
        let tags: Vec<String> = details
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        if tags.is_empty() {
            vec![self.options.default_tag.clone()]
        } else {
            tags
        }
    }

    fn build_endpoint(
        &self,
        path: &str,
        method: &str,
        details: &'a Map<String, Value>,
        shared: Option<&'a Vec<Value>>,
    ) -> EndpointDescriptor {
        let name = details
            .get("operationId")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| operation_name(method, path));

        let schema = details
            .get("responses")
            .and_then(|responses| responses.get("200"))
            .and_then(|ok| ok.get("schema"))
            .cloned();

        let mut endpoint = EndpointDescriptor {
            endpoint: path.to_string(),
            method: method.to_uppercase(),
            name,
            description: details
                .get("summary")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            notes: details
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            deprecated: details
                .get("deprecated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            params: Vec::new(),
            query_params: IndexMap::new(),
            body: ExpandedSchema::new(),
            body_status: BodyStatus::Empty,
            formdata: IndexMap::new(),
            header: IndexMap::new(),
            schema,
        };

        let declared = details.get("parameters").and_then(Value::as_array);
        for param in self.merged_parameters(shared, declared) {
            let descriptor = self.parameter(param);

            match &descriptor.location {
                ParamLocation::Query => {
                    endpoint
                        .query_params
                        .insert(descriptor.name.clone(), descriptor.declared_type.clone());
                }
                ParamLocation::Body => {
                    let outcome = self.expand_body(&descriptor);
                    if let BodyOutcome::Fallback(cause) = &outcome {
                        tracing::warn!(
                            endpoint = %path,
                            method = %endpoint.method,
                            error = %cause,
                            "body schema could not be expanded, using placeholder body"
                        );
                    }
                    let (body, status) = outcome.into_parts();
                    endpoint.body = body;
                    endpoint.body_status = status;
                }
                ParamLocation::FormData => {
                    endpoint
                        .formdata
                        .insert(descriptor.name.clone(), descriptor.declared_type.clone());
                }
                ParamLocation::Header => {
                    endpoint
                        .header
                        .insert(descriptor.name.clone(), descriptor.declared_type.clone());
                }
                ParamLocation::Path | ParamLocation::Other(_) => {}
            }

            endpoint.params.push(descriptor);
        }

        endpoint
    }

    /// Expand a body parameter's schema, falling back on any failure
    pub fn expand_body(&self, param: &ParameterDescriptor) -> BodyOutcome {
        let result = match &param.schema {
            Some(schema) => self.walker.expand(schema),
            None => Err(SchemaError::MissingSchema),
        };

        match result {
            Ok(body) => BodyOutcome::Expanded(body),
            Err(cause) => BodyOutcome::Fallback(cause),
        }
    }

    // Path-level parameters first; an operation parameter with the same
    // name and location replaces the shared one in place.
    fn merged_parameters(
        &self,
        shared: Option<&'a Vec<Value>>,
        declared: Option<&'a Vec<Value>>,
    ) -> Vec<&'a Value> {
        let mut merged: Vec<&'a Value> = Vec::new();

        for param in shared.into_iter().flatten().chain(declared.into_iter().flatten()) {
            let Some(param) = self.dereference(param) else {
                continue;
            };

            let key = parameter_key(param);
            match merged.iter().position(|existing| parameter_key(existing) == key) {
                Some(idx) if key.0.is_some() => merged[idx] = param,
                _ => merged.push(param),
            }
        }

        merged
    }

    fn dereference(&self, param: &'a Value) -> Option<&'a Value> {
        match ref_target(param) {
            Some(reference) => match resolve_ref(reference, self.document) {
                Ok(resolved) => Some(resolved),
                Err(err) => {
                    tracing::warn!(error = %err, "dropping unresolvable parameter");
                    None
                }
            },
            None => Some(param),
        }
    }

    fn parameter(&self, param: &Value) -> ParameterDescriptor {
        ParameterDescriptor {
            name: param
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            location: ParamLocation::parse(param.get("in").and_then(Value::as_str).unwrap_or("")),
            required: param
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(self.options.default_required),
            declared_type: param
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or(self.options.default_param_type.as_str())
                .to_string(),
            schema: param.get("schema").cloned(),
        }
    }
}

fn parameter_key(param: &Value) -> (Option<&str>, Option<&str>) {
    (
        param.get("name").and_then(Value::as_str),
        param.get("in").and_then(Value::as_str),
    )
}

/// Name used for operations without an `operationId`, e.g.
/// `get` + `/pets/{id}` -> `get_pets_id`
pub fn operation_name(method: &str, path: &str) -> String {
    sanitize_identifier(&format!("{}_{}", method, path))
}

/// Extract the sectioned endpoints of a document with default options
pub fn extract_endpoints(document: &Value) -> Result<SectionedEndpoints> {
    let options = ParseOptions::default();
    EndpointExtractor::new(document, &options).extract()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::options::MethodFilter;
    use serde_json::json;

    fn extract(document: &Value) -> SectionedEndpoints {
        extract_endpoints(document).unwrap()
    }

    #[test]
    fn tagged_get_without_parameters() {
        let doc = json!({
            "paths": {
                "/pets": {
                    "get": { "tags": ["pet"], "operationId": "listPets", "summary": "List pets" }
                }
            }
        });

        let sections = extract(&doc);
        let pets = sections.get("pet").unwrap();
        assert_eq!(pets.len(), 1);
        assert_eq!(pets[0].method, "GET");
        assert_eq!(pets[0].name, "listPets");
        assert_eq!(pets[0].description, "List pets");
        assert!(pets[0].query_params.is_empty());
        assert!(pets[0].body.is_empty());
        assert_eq!(pets[0].body_status, BodyStatus::Empty);
    }

    #[test]
    fn body_parameter_is_expanded() {
        let doc = json!({
            "paths": {
                "/pets": {
                    "post": {
                        "tags": ["pet"],
                        "parameters": [
                            { "name": "pet", "in": "body", "required": true,
                              "schema": { "$ref": "#/definitions/Pet" } }
                        ]
                    }
                }
            },
            "definitions": {
                "Pet": {
                    "type": "object",
                    "properties": { "name": { "type": "string" }, "tag": { "type": "string" } }
                }
            }
        });

        let sections = extract(&doc);
        let post = &sections.get("pet").unwrap()[0];
        assert_eq!(Value::from(&post.body), json!({ "name": "string", "tag": "string" }));
        assert_eq!(post.body_status, BodyStatus::Expanded);
        assert!(post.params[0].required);
        assert_eq!(post.params[0].location, ParamLocation::Body);
    }

    #[test]
    fn parameters_are_classified_by_location() {
        let doc = json!({
            "paths": {
                "/pets/{id}": {
                    "put": {
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "type": "integer" },
                            { "name": "limit", "in": "query", "type": "integer" },
                            { "name": "verbose", "in": "query" },
                            { "name": "api_key", "in": "header" },
                            { "name": "file", "in": "formData", "type": "file" },
                            { "name": "odd", "in": "cookie" }
                        ]
                    }
                }
            }
        });

        let sections = extract(&doc);
        let put = &sections.get("default").unwrap()[0];
        assert_eq!(put.params.len(), 6);
        assert_eq!(put.query_params.get("limit").map(String::as_str), Some("integer"));
        assert_eq!(put.query_params.get("verbose").map(String::as_str), Some("string"));
        assert_eq!(put.header.get("api_key").map(String::as_str), Some("string"));
        assert_eq!(put.formdata.get("file").map(String::as_str), Some("file"));
        assert!(!put.params[1].required);
        assert_eq!(put.params[5].location, ParamLocation::Other("cookie".into()));
        assert_eq!(put.path_params().count(), 1);
    }

    #[test]
    fn untagged_endpoint_goes_to_default_only() {
        let doc = json!({ "paths": { "/health": { "get": {} } } });
        let sections = extract(&doc);
        assert_eq!(sections.tags().collect::<Vec<_>>(), vec!["default"]);

        let doc = json!({ "paths": { "/health": { "get": { "tags": [] } } } });
        assert!(extract(&doc).get("default").is_some());
    }

    #[test]
    fn multi_tag_endpoint_is_copied_per_section() {
        let doc = json!({
            "paths": {
                "/shared": {
                    "get": {
                        "tags": ["a", "b"],
                        "parameters": [ { "name": "q", "in": "query" } ]
                    }
                }
            }
        });

        let mut sections = extract(&doc);
        assert_eq!(sections.get("a").unwrap().len(), 1);
        assert_eq!(sections.get("b").unwrap().len(), 1);

        sections.get_mut("a").unwrap()[0]
            .query_params
            .insert("extra".into(), "integer".into());

        assert_eq!(sections.get("a").unwrap()[0].query_params.len(), 2);
        assert_eq!(sections.get("b").unwrap()[0].query_params.len(), 1);
    }

    #[test]
    fn unresolvable_body_falls_back_without_aborting_siblings() {
        let doc = json!({
            "paths": {
                "/broken": {
                    "post": {
                        "parameters": [
                            { "name": "body", "in": "body", "schema": { "$ref": "#/definitions/Missing" } }
                        ]
                    }
                },
                "/fine": { "get": { "operationId": "fine" } }
            }
        });

        let sections = extract(&doc);
        let endpoints = sections.get("default").unwrap();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(Value::from(&endpoints[0].body), json!({ "body": "data" }));
        assert!(matches!(endpoints[0].body_status, BodyStatus::Fallback(_)));
        assert_eq!(endpoints[1].name, "fine");
    }

    #[test]
    fn cyclic_body_falls_back_with_reason() {
        let doc = json!({
            "paths": {
                "/loop": {
                    "post": {
                        "parameters": [
                            { "name": "body", "in": "body", "schema": { "$ref": "#/definitions/A" } }
                        ]
                    }
                }
            },
            "definitions": {
                "A": { "$ref": "#/definitions/B" },
                "B": { "$ref": "#/definitions/A" }
            }
        });

        let sections = extract(&doc);
        let endpoint = &sections.get("default").unwrap()[0];
        match &endpoint.body_status {
            BodyStatus::Fallback(reason) => assert!(reason.contains("Cyclic reference")),
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn ref_named_property_never_reaches_the_body() {
        let doc = json!({
            "paths": {
                "/odd": {
                    "post": {
                        "parameters": [
                            { "name": "body", "in": "body",
                              "schema": { "type": "object", "properties": { "$ref": { "type": "string" } } } }
                        ]
                    }
                }
            }
        });

        let sections = extract(&doc);
        let endpoint = &sections.get("default").unwrap()[0];
        assert!(!endpoint.body.contains_reference());
        assert_eq!(endpoint.body, fallback_body());
        assert!(matches!(endpoint.body_status, BodyStatus::Fallback(_)));
    }

    #[test]
    fn body_without_schema_uses_placeholder() {
        let doc = json!({
            "paths": { "/x": { "post": { "parameters": [ { "name": "b", "in": "body" } ] } } }
        });

        let sections = extract(&doc);
        let endpoint = &sections.get("default").unwrap()[0];
        assert_eq!(endpoint.body, fallback_body());
        assert_eq!(
            endpoint.body_status,
            BodyStatus::Fallback(SchemaError::MissingSchema.to_string())
        );
    }

    #[test]
    fn synthesizes_operation_name() {
        assert_eq!(operation_name("get", "/pets/{id}"), "get_pets_id");
        assert_eq!(operation_name("delete", "/store/order/{orderId}/"), "delete_store_order_orderId");

        let doc = json!({ "paths": { "/pets/{id}": { "get": {} } } });
        assert_eq!(extract(&doc).get("default").unwrap()[0].name, "get_pets_id");
    }

    #[test]
    fn success_response_schema_is_kept() {
        let doc = json!({
            "paths": {
                "/pets": {
                    "get": {
                        "responses": {
                            "200": { "description": "ok", "schema": { "type": "array" } },
                            "404": { "description": "missing" }
                        }
                    },
                    "delete": { "responses": { "200": { "description": "no schema" } } }
                }
            }
        });

        let sections = extract(&doc);
        let endpoints = sections.get("default").unwrap();
        assert_eq!(endpoints[0].schema, Some(json!({ "type": "array" })));
        assert_eq!(endpoints[1].schema, None);
    }

    #[test]
    fn shared_and_referenced_parameters_are_merged() {
        let doc = json!({
            "parameters": {
                "limit": { "name": "limit", "in": "query", "type": "integer" }
            },
            "paths": {
                "/pets/{id}": {
                    "parameters": [
                        { "name": "id", "in": "path", "type": "string" },
                        { "name": "trace", "in": "header" }
                    ],
                    "get": {
                        "parameters": [
                            { "name": "id", "in": "path", "type": "integer" },
                            { "$ref": "#/parameters/limit" },
                            { "$ref": "#/parameters/missing" }
                        ]
                    }
                }
            }
        });

        let sections = extract(&doc);
        let get = &sections.get("default").unwrap()[0];
        let names: Vec<&str> = get.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "trace", "limit"]);
        assert_eq!(get.params[0].declared_type, "integer");
        assert_eq!(get.query_params.get("limit").map(String::as_str), Some("integer"));
        assert_eq!(sections.endpoint_count(), 1);
    }

    #[test]
    fn method_filter_controls_path_item_keys() {
        let doc = json!({
            "paths": {
                "/pets": {
                    "x-handler": { "tags": ["vendor"] },
                    "get": { "tags": ["pet"] }
                }
            }
        });

        assert_eq!(extract(&doc).tags().collect::<Vec<_>>(), vec!["pet"]);

        let options = ParseOptions::default().with_method_filter(MethodFilter::Any);
        let sections = EndpointExtractor::new(&doc, &options).extract().unwrap();
        assert_eq!(sections.tags().collect::<Vec<_>>(), vec!["vendor", "pet"]);
    }

    #[test]
    fn missing_paths_and_non_mapping_documents() {
        assert!(extract(&json!({ "swagger": "2.0" })).is_empty());

        let err = extract_endpoints(&json!(["not", "a", "mapping"])).unwrap_err();
        assert!(matches!(err, ParserError::InvalidDocument(_)));
    }

    #[test]
    fn custom_default_tag_and_class_names() {
        let doc = json!({ "paths": { "/x": { "get": {} } } });
        let options = ParseOptions::default().with_default_tag("misc");
        let sections = EndpointExtractor::new(&doc, &options).extract().unwrap();
        assert!(sections.get("misc").is_some());

        assert_eq!(SectionedEndpoints::class_name("pet"), "PetAPI");
        assert_eq!(SectionedEndpoints::class_name("STORE"), "StoreAPI");
    }

    #[test]
    fn serializes_with_renderer_field_names() {
        let doc = json!({
            "paths": {
                "/pets": { "get": { "tags": ["pet"], "parameters": [ { "name": "q", "in": "query" } ] } }
            }
        });

        let value = serde_json::to_value(extract(&doc)).unwrap();
        let endpoint = &value["pet"][0];
        assert_eq!(endpoint["method"], "GET");
        assert_eq!(endpoint["name"], "get_pets");
        assert_eq!(endpoint["params"][0]["in"], "query");
        assert_eq!(endpoint["params"][0]["type"], "string");
        assert_eq!(endpoint["query_params"], json!({ "q": "string" }));
        assert_eq!(endpoint["body_status"], json!({ "status": "empty" }));
    }
}
