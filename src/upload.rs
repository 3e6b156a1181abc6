//! Local-file detection and upload payloads for remote sessions.
//!
//! A remote session runs on another machine, so a file input fed a
//! client-local path would go looking on the wrong filesystem. The
//! interceptor installed on remote handles closes that gap: when an input
//! string names an existing local file, the file is packed into a
//! single-entry zip, base64-encoded, and pushed to the remote end through
//! the `se/file` endpoint; the remote-side path comes back and substitutes
//! the local one. Anything that does not name a local file passes through
//! untouched.

// ============================================================================
// Imports
// ============================================================================

use std::io::{Cursor, Write};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use tracing::debug;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::error::{Error, Result};

// ============================================================================
// UploadPayload - Wire body for the se/file endpoint
// ============================================================================

/// A staged file upload: single-entry zip, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    /// The entry name inside the archive (the file's own name).
    pub file_name: String,
    /// The archive, base64-encoded, ready for the `se/file` body.
    pub zip_base64: String,
}

// ============================================================================
// FileUploader - LocalFileDetector semantics
// ============================================================================

/// Detects client-local files and stages them for remote upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileUploader;

impl FileUploader {
    /// Creates an uploader.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Whether the input string names an existing local file.
    ///
    /// Directories and plain strings that merely look like paths do not
    /// count; only a readable regular file triggers interception.
    #[must_use]
    pub fn detect(&self, input: &str) -> bool {
        let trimmed = input.trim();
        !trimmed.is_empty() && Path::new(trimmed).is_file()
    }

    /// Packs a local file into an upload payload.
    ///
    /// # Errors
    ///
    /// [`Error::Session`] when the path has no file name or cannot be
    /// archived; [`Error::Io`] when reading the file fails.
    pub fn stage(&self, path: &Path) -> Result<UploadPayload> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::session(format!("Upload path has no file name: {}", path.display()))
            })?;

        let bytes = std::fs::read(path)?;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(&file_name, options).map_err(|e| {
            Error::session(format!(
                "Could not stage {} for upload: {}",
                path.display(),
                e
            ))
        })?;
        writer.write_all(&bytes)?;
        let cursor = writer.finish().map_err(|e| {
            Error::session(format!(
                "Could not finish upload archive for {}: {}",
                path.display(),
                e
            ))
        })?;

        let zip_base64 = Base64Standard.encode(cursor.into_inner());
        debug!(
            file = %path.display(),
            raw_len = bytes.len(),
            encoded_len = zip_base64.len(),
            "Staged local file for remote upload"
        );

        Ok(UploadPayload {
            file_name,
            zip_base64,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
