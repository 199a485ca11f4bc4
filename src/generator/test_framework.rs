use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::args::TestFramework;
use crate::parser::{EndpointDescriptor, ExpandedSchema, SectionedEndpoints};
use crate::utils::{camel_to_snake, capitalize, sanitize_identifier, write_to_file};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Values baked into every generated client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub base_url: String,
    pub api_key: Option<String>,
    pub bearer: Option<String>,
}

impl GeneratorOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            bearer: None,
        }
    }
}

/// Base trait for all section generators
pub trait TestGenerator {
    /// Generate sources for every section and return the files written
    fn generate_tests(
        &self,
        sections: &SectionedEndpoints,
        output_dir: &Path,
        options: &GeneratorOptions,
    ) -> Result<Vec<PathBuf>>;
}

/// Factory function to create a generator based on the framework
pub fn create_generator(framework: TestFramework) -> Box<dyn TestGenerator> {
    match framework {
        TestFramework::Pytest => Box::new(PytestGenerator::new()),
        TestFramework::Reqwest => Box::new(ReqwestGenerator::new()),
    }
}

const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield", "self",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "type", "unsafe", "use", "where",
    "while", "body", "query", "form", "headers", "request",
];

/// snake_case identifier for a parameter or operation name, avoiding `reserved`
fn identifier(name: &str, reserved: &[&str]) -> String {
    let mut ident = camel_to_snake(&sanitize_identifier(name)).to_lowercase();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if reserved.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// Names between `{` and `}` in a path template, in order of appearance
fn path_placeholders(path: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let len = match rest[start + 1..].find('}') {
            Some(len) => len,
            None => break,
        };
        let name = &rest[start + 1..start + 1 + len];
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
        rest = &rest[start + len + 2..];
    }
    names
}

/// Positional path arguments as `(name, type)`: declared path parameters first,
/// then any template placeholder nothing declares, typed as a string.
fn path_arguments(endpoint: &EndpointDescriptor) -> Vec<(&str, &str)> {
    let mut arguments: Vec<(&str, &str)> = endpoint
        .path_params()
        .map(|param| (param.name.as_str(), param.declared_type.as_str()))
        .collect();
    for placeholder in path_placeholders(&endpoint.endpoint) {
        if !arguments.iter().any(|(name, _)| *name == placeholder) {
            tracing::warn!(
                endpoint = %endpoint.endpoint,
                placeholder,
                "path placeholder has no declared parameter"
            );
            arguments.push((placeholder, "string"));
        }
    }
    arguments
}

/// Replace `{petId}` segments with `{pet_id}` so the path can be interpolated
fn interpolated_path(endpoint: &EndpointDescriptor, reserved: &[&str]) -> String {
    path_arguments(endpoint)
        .into_iter()
        .fold(endpoint.endpoint.clone(), |path, (name, _)| {
            path.replace(&format!("{{{name}}}"), &format!("{{{}}}", identifier(name, reserved)))
        })
}

fn sample_body(body: &ExpandedSchema) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Value::from(body))?)
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// Python API classes plus pytest-bdd steps, one pair of files per section
struct PytestGenerator;

impl PytestGenerator {
    pub fn new() -> Self {
        PytestGenerator
    }

    fn python_literal(type_name: &str) -> &'static str {
        match type_name {
            "integer" => "1",
            "number" => "1.0",
            "boolean" => "True",
            "array" => "[]",
            _ => "\"string\"",
        }
    }

    fn python_string(value: Option<&str>) -> String {
        match value {
            Some(value) => format!("{:?}", value),
            None => "None".to_string(),
        }
    }

    /// Triple-quoted docstring with backslashes and quotes escaped
    fn python_docstring(doc: &str) -> String {
        let escaped = doc.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"\"\"{escaped}\"\"\"")
    }

    fn class_name(tag: &str) -> String {
        sanitize_identifier(&SectionedEndpoints::class_name(tag))
    }

    fn body_constant(endpoint: &EndpointDescriptor) -> String {
        format!("{}_BODY", identifier(&endpoint.name, &[]).to_uppercase())
    }

    fn generate_api_instance(&self, options: &GeneratorOptions) -> String {
        format!(
            r#"import requests


class ApiInstance:
    """Shared HTTP session used by every generated API class."""

    def __init__(self, base_url={base_url:?}, apikey={apikey}, bearer={bearer}):
        self.base_url = base_url.rstrip("/")
        self.session = requests.Session()
        if apikey:
            self.session.headers["api_key"] = apikey
        if bearer:
            self.session.headers["Authorization"] = f"Bearer {{bearer}}"

    def request(self, method, endpoint, params=None, json=None, data=None, headers=None):
        return self.session.request(
            method,
            self.base_url + endpoint,
            params=params,
            json=json,
            data=data,
            headers=headers,
        )
"#,
            base_url = options.base_url,
            apikey = Self::python_string(options.api_key.as_deref()),
            bearer = Self::python_string(options.bearer.as_deref()),
        )
    }

    fn generate_method(&self, endpoint: &EndpointDescriptor) -> String {
        let method_name = identifier(&endpoint.name, PYTHON_KEYWORDS);

        let mut args = vec!["self".to_string()];
        args.extend(path_arguments(endpoint).into_iter().map(|(name, _)| identifier(name, PYTHON_KEYWORDS)));
        let keyword_params = endpoint
            .query_params
            .keys()
            .chain(endpoint.header.keys())
            .chain(endpoint.formdata.keys());
        args.extend(keyword_params.map(|name| format!("{}=None", identifier(name, PYTHON_KEYWORDS))));
        let has_body = !endpoint.body.is_empty();
        if has_body {
            args.push("body=None".to_string());
        }

        let dict = |entries: Vec<&String>| -> String {
            if entries.is_empty() {
                return "None".to_string();
            }
            let pairs = entries
                .iter()
                .map(|name| format!("{:?}: {}", name, identifier(name, PYTHON_KEYWORDS)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{pairs}}}")
        };

        let params = dict(endpoint.query_params.keys().collect());
        let headers = dict(endpoint.header.keys().collect());
        let data = dict(endpoint.formdata.keys().collect());
        let json = if has_body { "body".to_string() } else { "None".to_string() };

        let mut doc = endpoint.description.trim().to_string();
        if endpoint.deprecated {
            doc.push_str(" (deprecated)");
        }

        format!(
            r#"
    def {method_name}({args}):
        {doc}
        return self.request(
            {method:?},
            f"{path}",
            params={params},
            json={json},
            data={data},
            headers={headers},
        )
"#,
            args = args.join(", "),
            doc = Self::python_docstring(&doc),
            method = endpoint.method,
            path = interpolated_path(endpoint, PYTHON_KEYWORDS),
        )
    }

    fn generate_methods_file(&self, tag: &str, endpoints: &[EndpointDescriptor]) -> Result<String> {
        let class_name = Self::class_name(tag);
        let mut code = String::from("from .api_instance import ApiInstance\n\n");

        for endpoint in endpoints.iter().filter(|e| !e.body.is_empty()) {
            code.push_str(&format!(
                "\n{} = {}\n",
                Self::body_constant(endpoint),
                sample_body(&endpoint.body)?
            ));
        }

        code.push_str(&format!(
            "\n\nclass {class_name}(ApiInstance):\n    \"\"\"Endpoints tagged '{tag}'.\"\"\"\n"
        ));
        for endpoint in endpoints {
            code.push_str(&self.generate_method(endpoint));
        }

        Ok(code)
    }

    fn generate_steps_file(&self, tag: &str, endpoints: &[EndpointDescriptor]) -> String {
        let class_name = Self::class_name(tag);
        let module = identifier(tag, &[]);

        let constants = endpoints
            .iter()
            .filter(|e| !e.body.is_empty())
            .map(Self::body_constant)
            .collect::<Vec<_>>();
        let mut imports = vec![class_name.clone()];
        imports.extend(constants);

        let mut code = format!(
            r#"from pytest_bdd import given, parsers, then, when

from methods.{module}_api import {imports}


@given("the {class_name} client", target_fixture="api")
def api():
    return {class_name}()
"#,
            imports = imports.join(", "),
        );

        for endpoint in endpoints {
            let method_name = identifier(&endpoint.name, PYTHON_KEYWORDS);
            let mut args: Vec<String> = path_arguments(endpoint)
                .into_iter()
                .map(|(_, declared_type)| Self::python_literal(declared_type).to_string())
                .collect();
            if !endpoint.body.is_empty() {
                args.push(format!("body={}", Self::body_constant(endpoint)));
            }

            code.push_str(&format!(
                r#"

@when("I call {method_name}", target_fixture="response")
def call_{method_name}(api):
    return api.{method_name}({args})
"#,
                args = args.join(", "),
            ));
        }

        code.push_str(
            r#"

@then(parsers.parse("the response status is {status:d}"))
def response_status(response, status):
    assert response.status_code == status
"#,
        );

        code
    }
}

impl TestGenerator for PytestGenerator {
    fn generate_tests(
        &self,
        sections: &SectionedEndpoints,
        output_dir: &Path,
        options: &GeneratorOptions,
    ) -> Result<Vec<PathBuf>> {
        let methods_dir = output_dir.join("methods");
        let steps_dir = output_dir.join("steps");
        fs::create_dir_all(&methods_dir)?;
        fs::create_dir_all(&steps_dir)?;
        fs::create_dir_all(output_dir.join("scenarii"))?;

        let mut written = Vec::new();

        let instance_path = methods_dir.join("api_instance.py");
        write_to_file(&instance_path, self.generate_api_instance(options))?;
        written.push(instance_path);

        for (tag, endpoints) in sections.iter() {
            let module = identifier(tag, &[]);

            let methods_path = methods_dir.join(format!("{module}_api.py"));
            write_to_file(&methods_path, self.generate_methods_file(tag, endpoints)?)?;
            tracing::info!(section = tag, path = %methods_path.display(), "generated methods file");
            written.push(methods_path);

            let steps_path = steps_dir.join(format!("{module}_steps_api.py"));
            write_to_file(&steps_path, self.generate_steps_file(tag, endpoints))?;
            tracing::info!(section = tag, path = %steps_path.display(), "generated steps file");
            written.push(steps_path);
        }

        Ok(written)
    }
}

const GENERATED_CARGO_TOML: &str = r#"[package]
name = "generated_api_client"
version = "0.1.0"
edition = "2021"

[dependencies]
reqwest = { version = "0.11", features = ["json", "blocking"] }
serde_json = "1.0"
"#;

// Rust blocking reqwest clients, one module per section
struct ReqwestGenerator;

impl ReqwestGenerator {
    pub fn new() -> Self {
        ReqwestGenerator
    }

    fn rust_type(type_name: &str) -> &'static str {
        match type_name {
            "integer" => "i64",
            "number" => "f64",
            "boolean" => "bool",
            _ => "&str",
        }
    }

    fn struct_name(tag: &str) -> String {
        let words = identifier(tag, &[]);
        format!("{}Api", words.split('_').map(capitalize).collect::<String>())
    }

    fn generate_lib(&self, sections: &SectionedEndpoints, options: &GeneratorOptions) -> String {
        let modules = sections
            .tags()
            .map(|tag| format!("pub mod {}_api;\n", identifier(tag, RUST_KEYWORDS)))
            .collect::<String>();

        let rust_option = |value: Option<&str>| match value {
            Some(value) => format!("Some({:?}.to_string())", value),
            None => "None".to_string(),
        };

        format!(
            r#"{modules}
use reqwest::blocking::{{Client, RequestBuilder}};

pub const DEFAULT_BASE_URL: &str = {base_url:?};

/// Shared HTTP client used by every generated API struct
#[derive(Debug, Clone)]
pub struct ApiInstance {{
    pub base_url: String,
    pub api_key: Option<String>,
    pub bearer: Option<String>,
    client: Client,
}}

impl Default for ApiInstance {{
    fn default() -> Self {{
        Self::new(DEFAULT_BASE_URL)
    }}
}}

impl ApiInstance {{
    pub fn new(base_url: &str) -> Self {{
        Self {{
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: {api_key},
            bearer: {bearer},
            client: Client::new(),
        }}
    }}

    pub fn request(&self, method: reqwest::Method, endpoint: &str) -> RequestBuilder {{
        let mut request = self.client.request(method, format!("{{}}{{}}", self.base_url, endpoint));
        if let Some(key) = &self.api_key {{
            request = request.header("api_key", key);
        }}
        if let Some(token) = &self.bearer {{
            request = request.bearer_auth(token);
        }}
        request
    }}
}}
"#,
            base_url = options.base_url,
            api_key = rust_option(options.api_key.as_deref()),
            bearer = rust_option(options.bearer.as_deref()),
        )
    }

    fn generate_method(&self, endpoint: &EndpointDescriptor) -> Result<String> {
        let method_name = identifier(&endpoint.name, RUST_KEYWORDS);

        let mut args = vec!["&self".to_string()];
        args.extend(path_arguments(endpoint).into_iter().map(|(name, declared_type)| {
            format!("{}: {}", identifier(name, RUST_KEYWORDS), Self::rust_type(declared_type))
        }));
        let optional = endpoint
            .query_params
            .iter()
            .chain(endpoint.header.iter())
            .chain(endpoint.formdata.iter());
        args.extend(optional.map(|(name, ty)| {
            format!("{}: Option<{}>", identifier(name, RUST_KEYWORDS), Self::rust_type(ty))
        }));
        let has_body = !endpoint.body.is_empty();
        if has_body {
            args.push("body: &serde_json::Value".to_string());
        }

        let collect = |target: &str, entries: &indexmap::IndexMap<String, String>| -> String {
            entries
                .keys()
                .map(|name| {
                    format!(
                        "        if let Some(value) = {ident} {{\n            {target}.push(({name:?}, value.to_string()));\n        }}\n",
                        ident = identifier(name, RUST_KEYWORDS),
                    )
                })
                .collect()
        };

        let mut code = String::new();
        if has_body {
            code.push_str(&format!(
                "    /// Sample body for `{method_name}`\n    pub fn {method_name}_sample_body() -> serde_json::Value {{\n        serde_json::json!({})\n    }}\n\n",
                indent(&sample_body(&endpoint.body)?, "        ").trim_start(),
            ));
        }

        let doc = if endpoint.description.is_empty() {
            format!("{} {}", endpoint.method, endpoint.endpoint)
        } else {
            endpoint.description.replace('\n', " ")
        };
        code.push_str(&format!(
            "    /// {doc}\n{deprecated}    pub fn {method_name}({args}) -> reqwest::Result<reqwest::blocking::Response> {{\n",
            deprecated = if endpoint.deprecated { "    #[deprecated]\n" } else { "" },
            args = args.join(", "),
        ));

        code.push_str("        let mut query: Vec<(&str, String)> = Vec::new();\n");
        code.push_str(&collect("query", &endpoint.query_params));
        code.push_str("        let mut headers: Vec<(&str, String)> = Vec::new();\n");
        code.push_str(&collect("headers", &endpoint.header));
        code.push_str("        let mut form: Vec<(&str, String)> = Vec::new();\n");
        code.push_str(&collect("form", &endpoint.formdata));

        code.push_str(&format!(
            r#"
        let mut request = self
            .api
            .request(reqwest::Method::{method}, &format!("{path}"))
            .query(&query);
        for (name, value) in headers {{
            request = request.header(name, value);
        }}
        if !form.is_empty() {{
            request = request.form(&form);
        }}
"#,
            method = endpoint.method,
            path = interpolated_path(endpoint, RUST_KEYWORDS),
        ));
        if has_body {
            code.push_str("        request = request.json(body);\n");
        }
        code.push_str("        request.send()\n    }\n");

        Ok(code)
    }

    fn generate_section(&self, tag: &str, endpoints: &[EndpointDescriptor]) -> Result<String> {
        let struct_name = Self::struct_name(tag);
        let mut code = format!(
            r#"use crate::ApiInstance;

/// Endpoints tagged `{tag}`
#[derive(Debug, Clone, Default)]
pub struct {struct_name} {{
    pub api: ApiInstance,
}}

impl {struct_name} {{
    pub fn new(api: ApiInstance) -> Self {{
        Self {{ api }}
    }}
"#
        );

        for endpoint in endpoints {
            code.push('\n');
            code.push_str(&self.generate_method(endpoint)?);
        }
        code.push_str("}\n");

        Ok(code)
    }
}

impl TestGenerator for ReqwestGenerator {
    fn generate_tests(
        &self,
        sections: &SectionedEndpoints,
        output_dir: &Path,
        options: &GeneratorOptions,
    ) -> Result<Vec<PathBuf>> {
        let src_dir = output_dir.join("src");
        fs::create_dir_all(&src_dir)?;

        let mut written = Vec::new();

        for (tag, endpoints) in sections.iter() {
            let section_path = src_dir.join(format!("{}_api.rs", identifier(tag, RUST_KEYWORDS)));
            write_to_file(&section_path, self.generate_section(tag, endpoints)?)?;
            tracing::info!(section = tag, path = %section_path.display(), "generated client module");
            written.push(section_path);
        }

        let lib_path = src_dir.join("lib.rs");
        write_to_file(&lib_path, self.generate_lib(sections, options))?;
        written.push(lib_path);

        let cargo_path = output_dir.join("Cargo.toml");
        write_to_file(&cargo_path, GENERATED_CARGO_TOML)?;
        written.push(cargo_path);

        Ok(written)
    }
}
