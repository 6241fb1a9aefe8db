//! Ingest helpers — job description normalization and resume packaging.
//!
//! A job description that starts with `http` is fetched; anything else is used
//! verbatim. Resume content is base64 (optionally a data URL) holding a PDF.
//! A resume that cannot be decoded becomes an item-level `error` entry.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use tracing::{info, warn};

use crate::errors::BackendError;
use crate::screening::models::{IngestedResume, ResumeFile};

/// True when the job description should be fetched rather than used as text.
pub fn looks_like_url(job_description: &str) -> bool {
    job_description.trim_start().starts_with("http")
}

/// Returns the job description text, fetching it first when given a URL.
pub async fn normalize_job_description(
    job_description: &str,
    http: &Client,
) -> Result<String, BackendError> {
    if !looks_like_url(job_description) {
        return Ok(job_description.to_string());
    }

    let url = job_description.trim();
    info!("Fetching job description from {url}");

    let response = http.get(url).send().await.map_err(|e| {
        BackendError::Transport(format!("Failed to fetch the job description URL: {e}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::Transport(format!(
            "Failed to fetch the job description URL: status {}",
            status.as_u16()
        )));
    }

    let text = response.text().await.map_err(|e| {
        BackendError::MalformedResponse(format!("Job description URL returned unreadable body: {e}"))
    })?;

    if text.trim().is_empty() {
        return Err(BackendError::MalformedResponse(
            "Job description URL returned an empty page".to_string(),
        ));
    }

    Ok(text)
}

/// Strips a `data:<mime>;base64,` prefix if present.
pub fn strip_data_url(content: &str) -> &str {
    let content = content.trim();
    if content.starts_with("data:") {
        content
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or("")
    } else {
        content
    }
}

/// Decodes a resume's base64 payload to raw bytes.
pub fn decode_resume_bytes(file: &ResumeFile) -> Result<Vec<u8>, String> {
    STANDARD
        .decode(strip_data_url(&file.content))
        .map_err(|e| format!("Base64 decoding error: {e}"))
}

/// Encodes raw file bytes as they travel inside `ResumeFile::content`.
pub fn encode_resume_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes and text-extracts one resume.
///
/// Decoding failures become an `error` entry. PDF extraction failures keep the
/// entry but carry the extraction error as its text, so the parse stage can
/// still report on it.
pub async fn package_resume(file: &ResumeFile) -> IngestedResume {
    let bytes = match decode_resume_bytes(file) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Resume '{}' could not be decoded: {e}", file.filename);
            return IngestedResume::failed(&file.filename, e);
        }
    };

    // pdf-extract is synchronous and CPU-bound.
    let extracted = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
    })
    .await;

    let text = match extracted {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Resume '{}' PDF extraction failed: {e}", file.filename);
            format!("Error processing PDF: {e}")
        }
        Err(e) => format!("Error processing PDF: {e}"),
    };

    IngestedResume::text(&file.filename, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(content: &str) -> ResumeFile {
        ResumeFile {
            filename: "resume.pdf".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_looks_like_url() {
        assert!(looks_like_url("https://jobs.example.com/123"));
        assert!(looks_like_url("  http://example.com"));
        assert!(!looks_like_url("Looking for a backend engineer"));
    }

    #[test]
    fn test_strip_data_url_prefix() {
        assert_eq!(strip_data_url("data:application/pdf;base64,SGVsbG8="), "SGVsbG8=");
        assert_eq!(strip_data_url("SGVsbG8="), "SGVsbG8=");
        assert_eq!(strip_data_url("data:broken"), "");
    }

    #[test]
    fn test_decode_resume_bytes_handles_data_url() {
        let bytes = decode_resume_bytes(&file("data:application/pdf;base64,SGVsbG8=")).unwrap();
        assert_eq!(bytes, b"Hello");
    }

    #[test]
    fn test_decode_resume_bytes_rejects_garbage() {
        let err = decode_resume_bytes(&file("!!! not base64 !!!")).unwrap_err();
        assert!(err.starts_with("Base64 decoding error"));
    }

    #[tokio::test]
    async fn test_package_resume_records_decode_error_inline() {
        let packaged = package_resume(&file("%%%")).await;
        assert_eq!(packaged.filename, "resume.pdf");
        assert!(packaged.text.is_none());
        assert!(packaged.error.unwrap().contains("Base64"));
    }

    #[tokio::test]
    async fn test_package_resume_non_pdf_keeps_entry_with_error_text() {
        let packaged = package_resume(&file(&encode_resume_bytes(b"plain text, not a pdf"))).await;
        assert!(packaged.error.is_none());
        assert!(packaged.text.unwrap().starts_with("Error processing PDF"));
    }

    #[tokio::test]
    async fn test_plain_text_job_description_is_returned_verbatim() {
        let http = Client::new();
        let text = normalize_job_description("Looking for a backend engineer", &http)
            .await
            .unwrap();
        assert_eq!(text, "Looking for a backend engineer");
    }
}
