//! PDF text extraction.
//!
//! `pdf-extract` is CPU-bound and synchronous, so extraction runs on a
//! blocking thread to keep the request tasks responsive.

use tracing::info;

/// Extracts the text content of a PDF from raw bytes.
pub async fn extract_pdf_text(pdf_data: &[u8]) -> Result<String, anyhow::Error> {
    info!(pdf_size = pdf_data.len(), "pdf text extraction");

    let bytes = pdf_data.to_vec();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| anyhow::anyhow!("PDF extraction task failed: {}", e))?
        .map_err(|e| anyhow::anyhow!("PDF extraction error: {}", e))?;

    info!(chars = text.len(), "pdf extracted");
    Ok(text)
}
