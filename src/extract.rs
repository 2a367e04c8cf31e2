//! PDF text extraction.
//!
//! A flat text stream is all the tools need: page boundaries collapse and
//! reading order is whatever `pdf-extract` produces.

use crate::error::DecodeError;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Extracts plain text from PDF bytes.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, DecodeError> {
    if !looks_like_pdf(bytes) {
        return Err(DecodeError::NotPdf);
    }
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| DecodeError::Pdf(e.to_string()))
}

/// Runs [`extract_pdf_text`] on the blocking pool.
///
/// The decoder is CPU-bound and can panic on hostile input; a panic is
/// reported as [`DecodeError::Pdf`].
pub async fn extract_pdf_text_blocking(bytes: Vec<u8>) -> Result<String, DecodeError> {
    tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
        .await
        .map_err(|e| DecodeError::Pdf(format!("decoder aborted: {}", e)))?
}

/// Some servers prepend whitespace or a BOM before the header.
fn looks_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_error_page_is_not_pdf() {
        let err = extract_pdf_text(b"<html>Not found</html>").unwrap_err();
        assert!(matches!(err, DecodeError::NotPdf));
    }

    #[test]
    fn empty_body_is_not_pdf() {
        assert!(matches!(extract_pdf_text(b""), Err(DecodeError::NotPdf)));
    }

    #[tokio::test]
    async fn truncated_pdf_returns_error() {
        let err = extract_pdf_text_blocking(b"%PDF-1.4\ngarbage".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Pdf(_)));
    }

    #[tokio::test]
    async fn blocking_variant_reports_errors() {
        let err = extract_pdf_text_blocking(b"nope".to_vec()).await.unwrap_err();
        assert!(matches!(err, DecodeError::NotPdf));
    }
}
