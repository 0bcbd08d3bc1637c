//! Fixed-size character splitting.
//!
//! Text is cut on a separator, then the pieces are merged back into chunks of
//! at most `chunk_size` length units. Consecutive chunks share up to `overlap`
//! units of trailing pieces for context continuity. Length is measured in
//! characters, or in `cl100k_base` tokens for the splitter the pipeline uses.

use std::fmt;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tracing::warn;

use crate::error::{QuizError, QuizResult};

/// Configuration for splitting
#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub separator: String,
    /// Target size for each chunk
    pub chunk_size: usize,
    /// Overlap between chunks
    pub overlap: usize,
}

/// How piece length is measured
#[derive(Clone, Default)]
pub enum Length {
    #[default]
    Chars,
    Tokens(Arc<CoreBPE>),
}

impl Length {
    fn of(&self, text: &str) -> usize {
        match self {
            Length::Chars => text.chars().count(),
            Length::Tokens(bpe) => bpe.encode_with_special_tokens(text).len(),
        }
    }
}

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Chars => f.write_str("Chars"),
            Length::Tokens(_) => f.write_str("Tokens(cl100k_base)"),
        }
    }
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            separator: "\n".to_string(),
            chunk_size: 600,
            overlap: 100,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CharacterTextSplitter {
    config: SplitterConfig,
    length: Length,
}

impl CharacterTextSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        Self {
            config,
            length: Length::Chars,
        }
    }

    /// Measure chunk size and overlap in `cl100k_base` tokens
    pub fn from_tiktoken_encoder(config: SplitterConfig) -> QuizResult<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| QuizError::Extraction(format!("failed to load tokenizer: {}", e)))?;
        Ok(Self {
            config,
            length: Length::Tokens(Arc::new(bpe)),
        })
    }

    /// Split text into trimmed, non-empty chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let splits: Vec<&str> = if self.config.separator.is_empty() {
            vec![text]
        } else {
            text.split(self.config.separator.as_str()).collect()
        };

        let splits: Vec<&str> = splits.into_iter().filter(|s| !s.is_empty()).collect();
        self.merge_splits(&splits)
    }

    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let sep = self.config.separator.as_str();
        let sep_len = self.length.of(sep);
        let chunk_size = self.config.chunk_size;
        let overlap = self.config.overlap;

        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        // Length of `current` joined with the separator
        let mut total = 0usize;
        // Separator cost of adding one more piece to a run of `n` pieces
        let sep_cost = |n: usize| if n == 0 { 0 } else { sep_len };

        for split in splits {
            let len = self.length.of(split);

            if total + len + sep_cost(current.len()) > chunk_size {
                if total > chunk_size {
                    warn!(
                        size = total,
                        chunk_size, "created a chunk longer than the configured size"
                    );
                }

                if !current.is_empty() {
                    if let Some(chunk) = join(&current, sep) {
                        chunks.push(chunk);
                    }

                    // Drop leading pieces until the carried tail fits the overlap
                    // and leaves room for the incoming split
                    while total > overlap
                        || (total > 0 && total + len + sep_cost(current.len()) > chunk_size)
                    {
                        let head = self.length.of(current.remove(0));
                        total -= head + sep_cost(current.len());
                    }
                }
            }

            total += len + sep_cost(current.len());
            current.push(split);
        }

        if let Some(chunk) = join(&current, sep) {
            chunks.push(chunk);
        }

        chunks
    }
}

fn join(pieces: &[&str], sep: &str) -> Option<String> {
    let text = pieces.join(sep);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
