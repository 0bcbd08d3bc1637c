use std::path::Path;

use crate::error::QuizResult;

/// Extract text content from a plain text file, replacing invalid UTF-8
pub fn extract(path: &Path) -> QuizResult<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
