pub mod helpers;

pub use helpers::{
    camel_to_snake,
    capitalize,
    ensure_directory_exists,
    sanitize_identifier,
    write_to_file,
};
