//! Stable document identity.

use std::path::Path;

use crate::types::DocId;

/// BLAKE3 digest of the path string, as 64 lowercase hex characters.
///
/// Only the path participates; file content never changes the id.
pub fn identify(path: &str) -> DocId {
    digest(path.as_bytes())
}

/// Like [`identify`], hashing the platform path bytes so non-UTF-8 paths
/// still get distinct ids.
pub fn identify_path(path: &Path) -> DocId {
    digest(path.as_os_str().as_encoded_bytes())
}

fn digest(bytes: &[u8]) -> DocId {
    blake3::hash(bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_lowercase_hex_of_fixed_width() {
        let id = identify("/home/u/notes/a.txt");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn utf8_paths_agree_with_path_variant() {
        let p = "/tmp/docs/résumé.md";
        assert_eq!(identify(p), identify_path(Path::new(p)));
    }
}
