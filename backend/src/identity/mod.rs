//! Storage keys for uploaded and derived files.
//!
//! Every file the server holds is addressed by a [`StorageKey`] built from
//! the caller id and the original filename. The encoding is
//! `<caller byte length>_<caller>_<filename>`, so two different
//! `(caller, filename)` pairs can never produce the same key, even when
//! either part contains underscores.
//!
//! Derived files add a [`Stage`] prefix in front of the key.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::IdentityError;
use crate::models::Stage;

/// Characters that would let a key escape its storage directory.
const FORBIDDEN: [char; 3] = ['/', '\\', '\0'];

/// Composite key identifying one caller's copy of one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StorageKey {
    caller: String,
    filename: String,
    encoded: String,
}

impl StorageKey {
    pub fn caller(&self) -> &str {
        &self.caller
    }

    /// Filename as supplied by the caller.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// On-disk name of the uploaded file.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// On-disk name of a derived file.
    pub fn staged(&self, stage: Stage) -> String {
        format!("{}{}", stage.prefix(), self.encoded)
    }

    /// Name shown to the client for a derived file. The caller id is left out.
    pub fn display_name(&self, stage: Stage) -> String {
        format!("{}{}", stage.prefix(), self.filename)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

/// A file held by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// Location on disk.
    pub path: PathBuf,
    /// Name given to the file when it is sent back to the client.
    pub display_name: String,
}

/// Build the storage key for a caller's file.
///
/// # Example
/// ```ignore
/// let key = build_key("alice", "lipids.xlsx")?;
/// assert_eq!(key.as_str(), "5_alice_lipids.xlsx");
/// ```
pub fn build_key(caller_id: &str, filename: &str) -> Result<StorageKey, IdentityError> {
    check_component("caller id", caller_id)?;
    check_component("filename", filename)?;

    Ok(StorageKey {
        caller: caller_id.to_string(),
        filename: filename.to_string(),
        encoded: format!("{}_{}_{}", caller_id.len(), caller_id, filename),
    })
}

fn check_component(what: &str, value: &str) -> Result<(), IdentityError> {
    if value.is_empty() {
        return Err(IdentityError::Invalid(format!("{} is empty", what)));
    }
    if value.contains(FORBIDDEN) {
        return Err(IdentityError::Invalid(format!(
            "{} '{}' contains a path separator",
            what, value
        )));
    }
    Ok(())
}

/// Path of the file named `name` directly inside `directory`.
///
/// Subdirectories are not searched and only regular files match.
pub fn resolve(name: &str, directory: &Path) -> Result<PathBuf, IdentityError> {
    let path = directory.join(name);
    if !name.contains(FORBIDDEN) && path.is_file() {
        Ok(path)
    } else {
        Err(IdentityError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_key_format() {
        let key = build_key("alice", "lipids.xlsx").unwrap();
        assert_eq!(key.as_str(), "5_alice_lipids.xlsx");
        assert_eq!(key.staged(Stage::Pc), "PC_5_alice_lipids.xlsx");
        assert_eq!(key.display_name(Stage::MeanDataFrame), "mean_dataFrame_lipids.xlsx");
    }

    #[test]
    fn test_underscore_pairs_do_not_collide() {
        // ("a_b", "c") and ("a", "b_c") used to share the name "a_b_c"
        let first = build_key("a_b", "c.xlsx").unwrap();
        let second = build_key("a", "b_c.xlsx").unwrap();
        assert_ne!(first.as_str(), second.as_str());

        let third = build_key("1_a", "x.xlsx").unwrap();
        let fourth = build_key("1", "a_x.xlsx").unwrap();
        assert_ne!(third.as_str(), fourth.as_str());
    }

    #[test]
    fn test_rejects_path_components() {
        assert!(matches!(build_key("../etc", "passwd"), Err(IdentityError::Invalid(_))));
        assert!(matches!(build_key("bob", "dir\\file.xlsx"), Err(IdentityError::Invalid(_))));
        assert!(matches!(build_key("", "file.xlsx"), Err(IdentityError::Invalid(_))));
        assert!(matches!(build_key("bob", ""), Err(IdentityError::Invalid(_))));
    }

    #[test]
    fn test_resolve_only_direct_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("3_bob_a.xlsx"), b"x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("3_bob_b.xlsx"), b"x").unwrap();

        assert_eq!(
            resolve("3_bob_a.xlsx", dir.path()).unwrap(),
            dir.path().join("3_bob_a.xlsx")
        );
        assert_eq!(
            resolve("3_bob_b.xlsx", dir.path()),
            Err(IdentityError::NotFound("3_bob_b.xlsx".into()))
        );
        assert!(resolve("nested", dir.path()).is_err());
        assert!(resolve("nested/3_bob_b.xlsx", dir.path()).is_err());
    }
}
