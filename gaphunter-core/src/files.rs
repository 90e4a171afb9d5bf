//! File loading and encoding.
//!
//! Selected files are read into memory when the user adds them and encoded to
//! base64 only when a request is built. A selection is all-or-nothing: if any
//! file fails to read, nothing from that selection is kept.

use crate::error::FileError;
use crate::types::{EncodedFilePart, UploadedFile};
use base64::Engine;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Media type used when the extension is unknown.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Infer a media type from a file extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "xml" => "text/xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => DEFAULT_MEDIA_TYPE,
    }
}

/// Whether `path` matches one of the advisory accepted extensions (e.g. `.pdf`).
pub fn is_accepted(path: &Path, accepted: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    accepted
        .iter()
        .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// Read a single file into an [`UploadedFile`].
pub async fn load_file(path: &Path) -> Result<UploadedFile, FileError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = media_type_for(path);
    debug!(name = name.as_str(), media_type, size = bytes.len(), "Loaded file");
    Ok(UploadedFile::new(name, media_type, bytes))
}

/// Read every file of one selection concurrently, preserving selection order.
///
/// Fails on the first unreadable file; no partial selection is returned.
/// Files outside `accepted` are still loaded, with a warning.
pub async fn load_files(
    paths: &[PathBuf],
    accepted: &[String],
) -> Result<Vec<UploadedFile>, FileError> {
    for path in paths {
        if !accepted.is_empty() && !is_accepted(path, accepted) {
            warn!(
                path = %path.display(),
                accepted = ?accepted,
                "File extension is outside the accepted list; loading anyway"
            );
        }
    }
    futures::future::try_join_all(paths.iter().map(|p| load_file(p))).await
}

/// Encode one file for transmission.
pub fn encode(file: &UploadedFile) -> EncodedFilePart {
    EncodedFilePart {
        data: base64::engine::general_purpose::STANDARD.encode(&file.bytes),
        media_type: file.media_type.clone(),
    }
}

/// Encode every file, keeping list order.
pub fn encode_all(files: &[UploadedFile]) -> Vec<EncodedFilePart> {
    files.iter().map(encode).collect()
}

/// Ordered in-memory list of uploaded files.
///
/// Appends keep arrival order and never deduplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    files: Vec<UploadedFile>,
}

impl FileList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of files in the order given.
    pub fn extend(&mut self, files: impl IntoIterator<Item = UploadedFile>) {
        self.files.extend(files);
    }

    /// Remove the file at `index`, keeping the relative order of the rest.
    pub fn remove(&mut self, index: usize) -> Result<UploadedFile, FileError> {
        if index >= self.files.len() {
            return Err(FileError::IndexOutOfRange {
                index,
                len: self.files.len(),
            });
        }
        Ok(self.files.remove(index))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedFile> {
        self.files.iter()
    }

    pub fn as_slice(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }
}
