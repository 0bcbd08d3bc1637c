pub mod wikipedia;

pub use wikipedia::WikipediaRetriever;

use async_trait::async_trait;

use crate::error::QuizResult;
use crate::ingest::Document;

/// Returns reference documents relevant to a query
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn get_relevant_documents(&self, query: &str) -> QuizResult<Vec<Document>>;
}
