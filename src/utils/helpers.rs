// Small string and filesystem helpers shared by the parser and the generators.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Creates a directory if it doesn't exist
pub fn ensure_directory_exists<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Writes content to a file, creating parent directories if needed
pub fn write_to_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C) -> io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        ensure_directory_exists(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(content.as_ref())?;
    Ok(())
}

/// Turns an arbitrary string into an identifier-safe token.
///
/// Every run of characters that is not ASCII alphanumeric becomes a single
/// `_`, and leading/trailing `_` are dropped: `get_/pets/{id}` -> `get_pets_id`.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Upper-cases the first character and lower-cases the rest
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Converts camelCase to snake_case
pub fn camel_to_snake(camel: &str) -> String {
    let mut snake = String::new();

    for c in camel.chars() {
        if c.is_uppercase() {
            if !snake.is_empty() && !snake.ends_with('_') {
                snake.push('_');
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }

    snake
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_paths_into_identifiers() {
        assert_eq!(sanitize_identifier("get_/pets/{id}"), "get_pets_id");
        assert_eq!(sanitize_identifier("post_/user/createWithList"), "post_user_createWithList");
        assert_eq!(sanitize_identifier("/a--b//c/"), "a_b_c");
        assert_eq!(sanitize_identifier("///"), "");
    }

    #[test]
    fn capitalizes_like_section_class_names() {
        assert_eq!(capitalize("pet"), "Pet");
        assert_eq!(capitalize("STORE"), "Store");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn converts_camel_case() {
        assert_eq!(camel_to_snake("getPetById"), "get_pet_by_id");
        assert_eq!(camel_to_snake("already_snake"), "already_snake");
        assert_eq!(camel_to_snake("Pet_Id"), "pet_id");
    }
}
