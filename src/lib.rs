pub mod cli;
pub mod parser;
pub mod generator;
pub mod utils;

// Re-export frequently used items for easier access
pub use cli::args::TestFramework;
pub use parser::{parse_swagger_file, ParseOptions, SchemaSource, SectionedEndpoints};
pub use generator::{create_generator, GeneratorOptions, TestGenerator};

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Parser error: {0}")]
    ParserError(#[from] parser::ParserError),

    #[error("Generator error: {0}")]
    GeneratorError(#[from] generator::GeneratorError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Load a Swagger document from a file or URL and group its endpoints by section
pub fn load_sections(source: &SchemaSource, options: &ParseOptions, timeout: Duration) -> Result<SectionedEndpoints> {
    let document = source.load(timeout)?;
    tracing::info!(source = %source, "loaded swagger document");

    Ok(parser::parse_swagger_value(&document, options)?)
}

/// Generate sources for every section and return the paths written
pub fn generate_from_sections<P: AsRef<Path>>(
    sections: &SectionedEndpoints,
    output_dir: P,
    framework: TestFramework,
    options: &GeneratorOptions,
    dump_json: bool,
) -> Result<Vec<PathBuf>> {
    let generator = generator::create_generator(framework);
    let mut written = generator.generate_tests(sections, output_dir.as_ref(), options)?;

    if dump_json {
        written.push(generator::write_sections_manifest(sections, output_dir.as_ref())?);
    }

    Ok(written)
}
