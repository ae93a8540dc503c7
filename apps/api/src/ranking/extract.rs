//! Text extraction for uploaded resume files.
//!
//! Supported: `.pdf` (via `pdf-extract`) and `.txt` (UTF-8). Anything else,
//! including `.doc`/`.docx`, is reported as unsupported. A failure here is
//! scoped to one file; the resume still enters the batch with empty text.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file type '{0}' (expected .pdf or .txt)")]
    UnsupportedFileType(String),

    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("file is not valid UTF-8 text")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("text extraction crashed: {0}")]
    Crashed(String),
}

/// Per-file extraction failure surfaced next to the ranking report.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionIssue {
    pub filename: String,
    pub reason: String,
}

/// Extracts plain text from an uploaded resume, dispatching on file extension.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractionError::Pdf(e.to_string())),
        "txt" => Ok(String::from_utf8(bytes.to_vec())?),
        "" => Err(ExtractionError::UnsupportedFileType("(none)".to_string())),
        other => Err(ExtractionError::UnsupportedFileType(format!(".{other}"))),
    }
}

/// Runs `extract_text` on the blocking pool. PDF parsing is CPU-bound and the
/// parser can panic on hostile input; a panic becomes a per-file `Crashed` error.
pub async fn extract_text_blocking(
    filename: String,
    bytes: bytes::Bytes,
) -> Result<String, ExtractionError> {
    run_blocking(move || extract_text(&filename, &bytes)).await
}

async fn run_blocking<F>(extract: F) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, ExtractionError> + Send + 'static,
{
    tokio::task::spawn_blocking(extract)
        .await
        .unwrap_or_else(|e| Err(ExtractionError::Crashed(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_is_decoded() {
        let text = extract_text("alice.txt", "Rust, Kafka, 6 years".as_bytes()).unwrap();
        assert_eq!(text, "Rust, Kafka, 6 years");
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        assert!(extract_text("ALICE.TXT", b"hello").is_ok());
    }

    #[test]
    fn test_empty_txt_is_empty_text() {
        assert_eq!(extract_text("blank.txt", b"").unwrap(), "");
    }

    #[test]
    fn test_invalid_utf8_txt_fails() {
        let err = extract_text("latin1.txt", &[0x66, 0x6f, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidUtf8(_)));
    }

    #[test]
    fn test_word_documents_are_unsupported() {
        let err = extract_text("bob.docx", b"PK\x03\x04").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFileType(ref ext) if ext == ".docx"));
        assert!(extract_text("bob.doc", b"").is_err());
    }

    #[test]
    fn test_missing_extension_is_unsupported() {
        let err = extract_text("README", b"text").unwrap_err();
        assert!(err.to_string().contains("(none)"));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_per_file_error() {
        let err = extract_text_blocking(
            "broken.pdf".to_string(),
            bytes::Bytes::from_static(b"this is not a pdf"),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Pdf(_) | ExtractionError::Crashed(_)
        ));
    }

    #[tokio::test]
    async fn test_panicking_extractor_is_crashed_not_pdf() {
        let err = run_blocking(|| panic!("decoder blew up on carol.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Crashed(_)));
        assert!(err.to_string().starts_with("text extraction crashed"));
    }

    #[tokio::test]
    async fn test_blocking_wrapper_passes_text_through() {
        let text = extract_text_blocking(
            "carol.txt".to_string(),
            bytes::Bytes::from_static(b"Go and Python"),
        )
        .await
        .unwrap();
        assert_eq!(text, "Go and Python");
    }
}
