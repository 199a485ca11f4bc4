// Renders sectioned endpoints into client and test sources.

pub mod manifest;
pub mod test_framework;

pub use manifest::{write_sections_manifest, MANIFEST_FILE};
pub use test_framework::{
    create_generator,
    GeneratorError,
    GeneratorOptions,
    TestGenerator,
};
