//! Zip bundling of step outputs for download.

use std::fs;
use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::BundleError;
use crate::identity::StoredFile;

/// File name suggested to the client for every bundle.
pub const BUNDLE_NAME: &str = "result.zip";

/// Zip `files` in memory, one deflated entry per file named by its display name.
pub fn zip_files(files: &[StoredFile]) -> Result<Vec<u8>, BundleError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for file in files {
        let bytes = fs::read(&file.path)?;
        let options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(file.display_name.as_str(), options)?;
        zip.write_all(&bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}
