// src/parser/swagger.rs

use serde_json::{Value, Error as JsonError};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::endpoints::{EndpointExtractor, SectionedEndpoints};
use super::options::ParseOptions;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] JsonError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid Swagger document: {0}")]
    InvalidDocument(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

/// Default timeout for fetching a remote document
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a Swagger document is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    File(PathBuf),
    Url(String),
}

impl SchemaSource {
    /// Interpret a CLI argument: `http://` and `https://` are URLs, anything else a path
    pub fn parse(input: &str) -> Self {
        if input.starts_with("http://") || input.starts_with("https://") {
            SchemaSource::Url(input.to_string())
        } else {
            SchemaSource::File(PathBuf::from(input))
        }
    }

    /// Read and deserialize the document
    pub fn load(&self, timeout: Duration) -> Result<Value> {
        match self {
            SchemaSource::File(path) => read_swagger_file(path),
            SchemaSource::Url(url) => fetch_swagger(url, timeout),
        }
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSource::File(path) => write!(f, "{}", path.display()),
            SchemaSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Read a Swagger document from a JSON file
pub fn read_swagger_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    let mut file = File::open(path.as_ref())?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;

    tracing::debug!(path = %path.as_ref().display(), bytes = content.len(), "read swagger file");
    Ok(serde_json::from_str(&content)?)
}

/// Fetch a Swagger document over HTTP
pub fn fetch_swagger(url: &str, timeout: Duration) -> Result<Value> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;

    tracing::info!(url, "fetching swagger document");
    let response = client.get(url).send()?.error_for_status()?;
    Ok(response.json()?)
}

/// Parse a Swagger document held in a string into sectioned endpoints
pub fn parse_swagger_string(content: &str, options: &ParseOptions) -> Result<SectionedEndpoints> {
    let document: Value = serde_json::from_str(content)?;
    parse_swagger_value(&document, options)
}

/// Parse a Swagger document file into sectioned endpoints
pub fn parse_swagger_file<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<SectionedEndpoints> {
    let document = read_swagger_file(path)?;
    parse_swagger_value(&document, options)
}

/// Parse an already deserialized document
pub fn parse_swagger_value(document: &Value, options: &ParseOptions) -> Result<SectionedEndpoints> {
    if let Some(version) = document.get("swagger").and_then(Value::as_str) {
        if version != "2.0" {
            tracing::warn!(version, "document is not Swagger 2.0, extraction may be incomplete");
        }
    } else if let Some(version) = document.get("openapi").and_then(Value::as_str) {
        tracing::warn!(version, "OpenAPI 3 documents are read with Swagger 2.0 rules");
    }

    EndpointExtractor::new(document, options).extract()
}
