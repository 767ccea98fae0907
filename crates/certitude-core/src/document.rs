//! An ingested document, immutable for the length of one pipeline run.

use std::path::Path;

/// Fallback id for files whose name has no `.` or an empty stem.
pub const FALLBACK_DOC_ID: &str = "DOC_001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Derived from the file name; not guaranteed unique across a batch.
    pub doc_id: String,
    /// Lower-cased extension without the dot.
    pub file_type: String,
    pub text_content: String,
    pub used_ocr: bool,
}

impl Document {
    /// Build a document for a file whose text has already been acquired.
    pub fn from_path(path: &Path, text_content: String, used_ocr: bool) -> Self {
        Self {
            doc_id: doc_id_for(path),
            file_type: file_type_for(path),
            text_content,
            used_ocr,
        }
    }
}

/// Derive a document id: the file name up to its first `.`.
///
/// `cert.v2.pdf` → `cert`; `README` and `.pdf` → [`FALLBACK_DOC_ID`].
pub fn doc_id_for(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => FALLBACK_DOC_ID.to_string(),
    }
}

/// Lower-cased extension of the last path segment, empty if none.
pub fn file_type_for(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_stops_at_first_dot() {
        assert_eq!(doc_id_for(Path::new("/data/cert.v2.pdf")), "cert");
        assert_eq!(doc_id_for(Path::new("scan.PNG")), "scan");
    }

    #[test]
    fn doc_id_without_extension_falls_back() {
        assert_eq!(doc_id_for(Path::new("/data/README")), FALLBACK_DOC_ID);
    }

    #[test]
    fn doc_id_falls_back_for_empty_stem() {
        assert_eq!(doc_id_for(Path::new("/data/.pdf")), FALLBACK_DOC_ID);
    }

    #[test]
    fn file_type_is_lowercased() {
        assert_eq!(file_type_for(Path::new("a/B.JPEG")), "jpeg");
        assert_eq!(file_type_for(Path::new("a/noext")), "");
    }

    #[test]
    fn from_path_fills_identity() {
        let doc = Document::from_path(Path::new("/data/iso.txt"), "text".into(), false);
        assert_eq!(doc.doc_id, "iso");
        assert_eq!(doc.file_type, "txt");
        assert!(!doc.used_ocr);
    }
}
