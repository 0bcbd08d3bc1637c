use std::panic;
use std::path::Path;
use tracing::warn;

use crate::error::{QuizError, QuizResult};

/// Extract text content from a PDF file
pub fn extract(path: &Path) -> QuizResult<String> {
    let bytes = std::fs::read(path)?;

    // pdf_extract can panic on complex PDFs
    let extract_result = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes));

    let text = match extract_result {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(error = %e, "pdf_extract failed, trying lopdf");
            extract_with_lopdf(&bytes)?
        }
        Err(_) => {
            warn!("pdf_extract crashed, trying lopdf");
            extract_with_lopdf(&bytes)?
        }
    };

    let cleaned = text
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.is_empty() {
        return Err(QuizError::Extraction(format!(
            "no text could be extracted from PDF {:?}",
            path
        )));
    }

    Ok(cleaned)
}

/// Fallback PDF text extraction using lopdf
fn extract_with_lopdf(bytes: &[u8]) -> QuizResult<String> {
    use lopdf::Document;

    let doc = Document::load_mem(bytes)
        .map_err(|e| QuizError::Extraction(format!("failed to load PDF: {}", e)))?;

    let mut text = String::new();
    for (page_num, _) in doc.get_pages() {
        if let Ok(page_text) = doc.extract_text(&[page_num]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }

    if text.trim().is_empty() {
        return Err(QuizError::Extraction(
            "could not extract any text from PDF (may be scanned/image-based)".to_string(),
        ));
    }

    Ok(text)
}
