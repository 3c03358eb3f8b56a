//! Server configuration, resolved once at startup and injected into the
//! workflow and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default upload size limit (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// The two storage roots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Original uploads (`uploads/`).
    pub upload_dir: PathBuf,
    /// Files produced by the transform steps (`download_folder/`).
    pub download_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(upload_dir: impl AsRef<Path>, download_dir: impl AsRef<Path>) -> Self {
        Self {
            upload_dir: upload_dir.as_ref().to_path_buf(),
            download_dir: download_dir.as_ref().to_path_buf(),
        }
    }

    /// Both roots under a common directory.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(root.join("uploads"), root.join("download_folder"))
    }

    /// Create both directories if needed.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.download_dir)?;
        Ok(())
    }
}

impl Default for StorageConfig {
    /// Relative to the process working directory.
    fn default() -> Self {
        Self::new("uploads", "download_folder")
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server port.
    pub port: u16,
    /// Storage roots.
    pub storage: StorageConfig,
    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            storage: StorageConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
