use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::parser::options::{DEFAULT_MAX_REF_DEPTH, DEFAULT_TAG};
use crate::parser::ParseOptions;

#[derive(Debug, Parser)]
#[clap(
    name = "swagger-section-generator",
    about = "Generate per-section API clients and test steps from Swagger specifications",
    version
)]
pub struct Args {
    /// Path or http(s) URL of the Swagger JSON document
    #[clap(short, long, value_name = "FILE|URL")]
    pub input: String,

    /// Output directory for generated sources
    #[clap(short, long, value_name = "DIRECTORY")]
    pub output_dir: PathBuf,

    /// Target to generate sources for
    #[clap(short, long, value_enum, default_value = "pytest")]
    pub framework: TestFramework,

    /// Base URL for the API
    #[clap(long, value_name = "URL", default_value = "http://localhost:3000")]
    pub base_url: String,

    /// API key sent with every request
    #[clap(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Bearer token sent with every request
    #[clap(long, value_name = "TOKEN")]
    pub bearer: Option<String>,

    /// Longest `$ref` chain followed while expanding body schemas
    #[clap(
        long,
        value_name = "DEPTH",
        value_parser = parse_ref_depth,
        default_value_t = DEFAULT_MAX_REF_DEPTH
    )]
    pub max_ref_depth: usize,

    /// Section for operations without tags
    #[clap(long, value_name = "TAG", default_value = DEFAULT_TAG)]
    pub default_tag: String,

    /// Timeout when fetching the document over HTTP
    #[clap(long, value_name = "SECONDS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Also write the parsed sections to sections.json
    #[clap(long)]
    pub dump_json: bool,

    /// Enable debug logging
    #[clap(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::default()
            .with_default_tag(self.default_tag.clone())
            .with_max_ref_depth(self.max_ref_depth)
    }
}

/// `--max-ref-depth` must be at least 1
fn parse_ref_depth(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(depth) => Ok(depth),
        Err(err) => Err(err.to_string()),
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum TestFramework {
    /// Python API classes and pytest-bdd steps
    Pytest,
    /// Rust blocking reqwest clients
    Reqwest,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["swagger-section-generator", "-i", "api.json", "-o", "out"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn ref_depth_defaults_and_accepts_positive_values() {
        assert_eq!(parse(&[]).unwrap().max_ref_depth, DEFAULT_MAX_REF_DEPTH);
        let args = parse(&["--max-ref-depth", "1"]).unwrap();
        assert_eq!(args.parse_options().max_ref_depth, 1);
    }

    #[test]
    fn ref_depth_rejects_zero_and_garbage() {
        assert!(parse(&["--max-ref-depth", "0"]).is_err());
        assert!(parse(&["--max-ref-depth", "-3"]).is_err());
        assert!(parse(&["--max-ref-depth", "deep"]).is_err());
    }
}
