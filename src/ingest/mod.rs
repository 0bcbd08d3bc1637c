pub mod docx;
pub mod pdf;
pub mod splitter;
pub mod text;

pub use splitter::CharacterTextSplitter;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{QuizError, QuizResult};

/// File extensions accepted for upload
pub const ACCEPTED_TYPES: &[&str] = &["pdf", "docx", "txt"];

/// A chunk of extracted text with display metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    #[allow(dead_code)]
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").map(String::as_str)
    }
}

/// A file handed to the app, as bytes plus its original name
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    #[allow(dead_code)]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its file name
    pub fn from_path(path: &Path) -> QuizResult<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| QuizError::UnsupportedFile(path.display().to_string()))?;
        Ok(Self { name, bytes })
    }

    /// Final path component of the name, so it cannot escape the scratch dir
    pub fn safe_name(&self) -> String {
        Path::new(&self.name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty() && n != "." && n != "..")
            .unwrap_or_else(|| "upload".to_string())
    }
}

/// Supported upload types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Pdf,
    Docx,
    Text,
}

impl ContentType {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            Some("pdf") => Some(ContentType::Pdf),
            Some("docx") => Some(ContentType::Docx),
            Some("txt") => Some(ContentType::Text),
            _ => None,
        }
    }
}

/// Write the upload to `<scratch_dir>/<file name>` and return the path
pub fn persist_upload(file: &UploadedFile, scratch_dir: &Path) -> QuizResult<PathBuf> {
    std::fs::create_dir_all(scratch_dir)?;
    let path = scratch_dir.join(file.safe_name());
    std::fs::write(&path, &file.bytes)?;
    Ok(path)
}

/// Extract the full text of a scratch file based on its extension
pub fn load_text(path: &Path) -> QuizResult<String> {
    let content_type = ContentType::from_path(path)
        .ok_or_else(|| QuizError::UnsupportedFile(path.display().to_string()))?;

    match content_type {
        ContentType::Pdf => pdf::extract(path),
        ContentType::Docx => docx::extract(path),
        ContentType::Text => text::extract(path),
    }
}

/// Load a scratch file and split it into chunks tagged with `source`
pub fn load_and_split(
    path: &Path,
    source: &str,
    splitter: &CharacterTextSplitter,
) -> QuizResult<Vec<Document>> {
    let text = load_text(path)?;
    Ok(splitter
        .split_text(&text)
        .into_iter()
        .map(|chunk| Document::new(chunk).with_metadata("source", source))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(ContentType::from_path(Path::new("a.PDF")), Some(ContentType::Pdf));
        assert_eq!(ContentType::from_path(Path::new("notes.docx")), Some(ContentType::Docx));
        assert_eq!(ContentType::from_path(Path::new("notes.txt")), Some(ContentType::Text));
        assert_eq!(ContentType::from_path(Path::new("song.mp3")), None);
        assert_eq!(ContentType::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_safe_name_strips_directories() {
        let file = UploadedFile::new("../../etc/passwd.txt", Vec::new());
        assert_eq!(file.safe_name(), "passwd.txt");

        let file = UploadedFile::new("..", Vec::new());
        assert_eq!(file.safe_name(), "upload");
    }

    #[test]
    fn test_persist_and_split_text_upload() {
        let dir = PathBuf::from(format!("/tmp/quizgpt_ingest_{}", std::process::id()));
        let file = UploadedFile::new("notes.txt", b"line one\nline two\n".to_vec());

        let path = persist_upload(&file, &dir).unwrap();
        assert_eq!(path, dir.join("notes.txt"));

        let docs = load_and_split(&path, "notes.txt", &CharacterTextSplitter::default()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].page_content, "line one\nline two");
        assert_eq!(docs[0].source(), Some("notes.txt"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_text_rejects_unknown_type() {
        let err = load_text(Path::new("/tmp/whatever.mp3")).unwrap_err();
        assert!(matches!(err, QuizError::UnsupportedFile(_)));
    }
}
