use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild, read_docx};
use std::path::Path;

use crate::error::{QuizError, QuizResult};

/// Extract paragraph text from a .docx file, one paragraph per line
pub fn extract(path: &Path) -> QuizResult<String> {
    let bytes = std::fs::read(path)?;

    let docx = read_docx(&bytes).map_err(|e| {
        QuizError::Extraction(format!("failed to parse {}: {:?}", path.display(), e))
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    if paragraphs.is_empty() {
        return Err(QuizError::Extraction(format!(
            "no text found in {}",
            path.display()
        )));
    }

    Ok(paragraphs.join("\n"))
}

/// Runs in a paragraph belong to the same sentence, so they join without a separator
fn paragraph_text(para: &Paragraph) -> String {
    let mut text = String::new();
    for child in &para.children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                if let RunChild::Text(t) = rc {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Run};
    use std::path::PathBuf;

    fn write_docx(path: &Path, paragraphs: Vec<Paragraph>) {
        let mut docx = Docx::new();
        for para in paragraphs {
            docx = docx.add_paragraph(para);
        }
        let file = std::fs::File::create(path).unwrap();
        docx.build().pack(file).unwrap();
    }

    #[test]
    fn test_extract_one_line_per_paragraph() {
        let path = PathBuf::from(format!("/tmp/quizgpt_docx_{}.docx", std::process::id()));
        write_docx(
            &path,
            vec![
                Paragraph::new().add_run(Run::new().add_text("Paris is the capital of France.")),
                Paragraph::new(),
                Paragraph::new()
                    .add_run(Run::new().add_text("The Seine "))
                    .add_run(Run::new().add_text("flows through it.")),
            ],
        );

        let text = extract(&path).unwrap();
        assert_eq!(
            text,
            "Paris is the capital of France.\nThe Seine flows through it."
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_extract_rejects_empty_document() {
        let path = PathBuf::from(format!(
            "/tmp/quizgpt_docx_empty_{}.docx",
            std::process::id()
        ));
        write_docx(&path, vec![Paragraph::new()]);

        let err = extract(&path).unwrap_err();
        assert!(matches!(err, QuizError::Extraction(_)));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_extract_rejects_non_docx_bytes() {
        let path = PathBuf::from(format!(
            "/tmp/quizgpt_docx_garbage_{}.docx",
            std::process::id()
        ));
        std::fs::write(&path, b"plain text, not a zip archive").unwrap();

        let err = extract(&path).unwrap_err();
        assert!(matches!(err, QuizError::Extraction(_)));

        let _ = std::fs::remove_file(&path);
    }
}
