//! Text acquisition for admitted files.
//!
//! OCR and PDF parsing live outside this workspace. `.txt` files are read
//! directly; any other allowed format needs a transcript next to it named
//! `<file>.txt` (for example `scan.png.txt`).

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use certitude_ai::classifier::is_allowed_file_type;
use certitude_core::document::file_type_for;
use certitude_core::{GuardError, SecurityGuard};
use thiserror::Error;
use tracing::debug;

/// Formats whose text would have come from OCR.
const IMAGE_TYPES: &[&str] = &["jpg", "jpeg", "png", "tiff", "bmp", "gif"];

#[derive(Debug, Error)]
pub enum TextError {
    #[error("cannot extract text from {path}: {detail}")]
    Unsupported { path: PathBuf, detail: String },

    #[error("transcript rejected: {0}")]
    Transcript(#[from] GuardError),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Text pulled from a document, and whether OCR produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredText {
    pub text: String,
    pub used_ocr: bool,
}

/// Turns an admitted file into plain text.
pub trait TextSource: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<AcquiredText, TextError>;
}

/// Reads `.txt` files and `<file>.txt` transcripts from disk.
///
/// Transcripts pass through the same [`SecurityGuard`] as the documents
/// they describe.
#[derive(Debug, Clone)]
pub struct FsTextSource {
    guard: SecurityGuard,
}

impl FsTextSource {
    pub fn new(guard: SecurityGuard) -> Self {
        Self { guard }
    }
}

impl TextSource for FsTextSource {
    fn extract_text(&self, path: &Path) -> Result<AcquiredText, TextError> {
        let file_type = file_type_for(path);
        if file_type == "txt" {
            return read_text(path).map(|text| AcquiredText {
                text,
                used_ocr: false,
            });
        }

        if !is_allowed_file_type(&file_type) {
            return Err(TextError::Unsupported {
                path: path.to_path_buf(),
                detail: format!("file type {file_type:?} is not supported"),
            });
        }

        let transcript = transcript_path(path);
        if !transcript.exists() {
            return Err(TextError::Unsupported {
                path: path.to_path_buf(),
                detail: format!("no transcript at {}", transcript.display()),
            });
        }
        let transcript = self.guard.admit(&transcript)?;
        debug!(path = %path.display(), transcript = %transcript.display(), "using transcript");

        Ok(AcquiredText {
            text: read_text(&transcript)?,
            used_ocr: IMAGE_TYPES.contains(&file_type.as_str()),
        })
    }
}

fn transcript_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".txt");
    PathBuf::from(name)
}

fn read_text(path: &Path) -> Result<String, TextError> {
    std::fs::read_to_string(path).map_err(|source| TextError::Io {
        path: path.to_path_buf(),
        source,
    })
}
