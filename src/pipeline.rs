//! Cached quiz pipeline: extraction, retrieval and model invocation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{CacheStore, Memo, digest};
use crate::error::{QuizError, QuizResult};
use crate::ingest::{self, CharacterTextSplitter, ContentType, Document, UploadedFile};
use crate::llm::{ModelProvider, QuizModel};
use crate::quiz::{Difficulty, Quiz, build_prompt};
use crate::retriever::Retriever;
use crate::session::SessionContext;

/// Everything that identifies a generated quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    pub docs: Vec<Document>,
    /// Topic or file name
    pub source: String,
    pub difficulty: Difficulty,
}

pub fn file_key(file: &UploadedFile) -> String {
    digest([file.name.as_bytes(), file.bytes.as_slice()])
}

pub fn topic_key(topic: &str) -> String {
    topic.to_string()
}

pub fn quiz_key(request: &QuizRequest) -> String {
    let mut parts: Vec<&[u8]> = request
        .docs
        .iter()
        .map(|d| d.page_content.as_bytes())
        .collect();
    parts.push(request.source.as_bytes());
    parts.push(request.difficulty.as_str().as_bytes());
    digest(parts)
}

pub struct QuizPipeline {
    scratch_dir: PathBuf,
    splitter: CharacterTextSplitter,
    retriever: Box<dyn Retriever>,
    models: Box<dyn ModelProvider>,
    files: Memo<UploadedFile>,
    topics: Memo<str>,
    quizzes: Memo<QuizRequest>,
}

impl QuizPipeline {
    /// `cache_dir` holds the `quiz_files` scratch directory
    pub fn new(
        store: Arc<dyn CacheStore>,
        cache_dir: PathBuf,
        retriever: Box<dyn Retriever>,
        models: Box<dyn ModelProvider>,
    ) -> Self {
        Self {
            scratch_dir: cache_dir.join("quiz_files"),
            splitter: CharacterTextSplitter::default(),
            retriever,
            models,
            files: Memo::new("split_file", store.clone(), file_key),
            topics: Memo::new("wikipedia", store.clone(), topic_key),
            quizzes: Memo::new("quiz", store, quiz_key),
        }
    }

    /// Replace the default character-counting splitter
    pub fn with_splitter(mut self, splitter: CharacterTextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    #[allow(dead_code)]
    pub fn scratch_dir(&self) -> &PathBuf {
        &self.scratch_dir
    }

    /// Persist an upload and split it into chunks, once per file identity
    pub async fn split_file(&self, file: &UploadedFile) -> QuizResult<Vec<Document>> {
        let name = file.safe_name();
        if ContentType::from_path(Path::new(&name)).is_none() {
            return Err(QuizError::UnsupportedFile(name));
        }

        self.files
            .get_or_try_insert_with(file, || async {
                info!(file = %name, bytes = file.bytes.len(), "loading file");
                let path = ingest::persist_upload(file, &self.scratch_dir)?;
                ingest::load_and_split(&path, &name, &self.splitter)
            })
            .await
    }

    /// Top reference documents for a topic, once per topic
    pub async fn wikipedia_search(&self, topic: &str) -> QuizResult<Vec<Document>> {
        self.topics
            .get_or_try_insert_with(topic, || self.retriever.get_relevant_documents(topic))
            .await
    }

    /// A model bound to the session credential, if there is one
    pub fn llm(&self, ctx: &SessionContext) -> Option<Box<dyn QuizModel>> {
        ctx.credential().map(|key| self.models.connect(key))
    }

    /// Generate a quiz, once per request.
    ///
    /// Answers are shuffled before caching, so a cached quiz keeps its order.
    /// A rejected key is cleared from the session.
    pub async fn run_quiz_chain(
        &self,
        ctx: &mut SessionContext,
        request: &QuizRequest,
    ) -> QuizResult<Quiz> {
        let model = self.llm(ctx).ok_or(QuizError::NoLlm)?;

        let result = self
            .quizzes
            .get_or_try_insert_with(request, || async {
                let prompt = build_prompt(&request.docs, request.difficulty);
                let arguments = model.create_quiz(&prompt).await?;
                let mut quiz = Quiz::from_arguments(&arguments)?;
                quiz.shuffle_answers();
                Ok(quiz)
            })
            .await;

        if let Err(QuizError::Credential(reason)) = &result {
            warn!(%reason, "API key rejected, clearing it");
            ctx.clear_credential();
        }

        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub const TWO_QUESTIONS: &str = r#"{"questions": [
        {"question": "What is the capital of France?", "answers": [
            {"answer": "Paris", "correct": true},
            {"answer": "Marseille", "correct": false},
            {"answer": "Lyon", "correct": false}]},
        {"question": "Which river runs through Paris?", "answers": [
            {"answer": "Seine", "correct": true},
            {"answer": "Danube", "correct": false}]}
    ]}"#;

    /// Counts retrievals and returns two documents per query
    #[derive(Default)]
    pub struct MockRetriever {
        pub calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Retriever for MockRetriever {
        async fn get_relevant_documents(&self, query: &str) -> QuizResult<Vec<Document>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                Document::new(format!("{} is the capital of France.", query))
                    .with_metadata("title", query),
                Document::new(format!("The Seine flows through {}.", query))
                    .with_metadata("title", format!("{} (river)", query)),
            ])
        }
    }

    /// Records every key it connects with
    #[derive(Clone, Default)]
    pub struct MockProvider {
        pub calls: Arc<AtomicUsize>,
        pub keys: Arc<Mutex<Vec<String>>>,
        pub reject: bool,
    }

    struct MockModel {
        calls: Arc<AtomicUsize>,
        reject: bool,
    }

    #[async_trait]
    impl QuizModel for MockModel {
        async fn create_quiz(&self, _prompt: &str) -> QuizResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(QuizError::Credential("401 Unauthorized".to_string()));
            }
            Ok(TWO_QUESTIONS.to_string())
        }
    }

    impl ModelProvider for MockProvider {
        fn connect(&self, api_key: &str) -> Box<dyn QuizModel> {
            self.keys.lock().unwrap().push(api_key.to_string());
            Box::new(MockModel {
                calls: self.calls.clone(),
                reject: self.reject,
            })
        }
    }

    pub fn test_pipeline(
        name: &str,
        retriever: MockRetriever,
        provider: MockProvider,
    ) -> QuizPipeline {
        let cache_dir = PathBuf::from(format!(
            "/tmp/quizgpt_pipeline_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&cache_dir);
        QuizPipeline::new(
            Arc::new(MemoryStore::new()),
            cache_dir,
            Box::new(retriever),
            Box::new(provider),
        )
    }

    fn request(docs: Vec<Document>, difficulty: Difficulty) -> QuizRequest {
        QuizRequest {
            docs,
            source: "Paris".to_string(),
            difficulty,
        }
    }

    #[tokio::test]
    async fn test_split_file_is_cached_by_identity() {
        let pipeline = test_pipeline("split", MockRetriever::default(), MockProvider::default());
        let file = UploadedFile::new("notes.txt", b"first line\nsecond line".to_vec());

        let first = pipeline.split_file(&file).await.unwrap();
        let scratch = pipeline.scratch_dir().join("notes.txt");
        assert!(scratch.exists());

        // A cache hit must not touch the scratch copy again
        std::fs::remove_file(&scratch).unwrap();
        let second = pipeline.split_file(&file).await.unwrap();
        assert_eq!(first, second);
        assert!(!scratch.exists());

        // Same name, new bytes is a different file
        let edited = UploadedFile::new("notes.txt", b"other text".to_vec());
        let third = pipeline.split_file(&edited).await.unwrap();
        assert_eq!(third[0].page_content, "other text");

        let _ = std::fs::remove_dir_all(pipeline.scratch_dir());
    }

    #[tokio::test]
    async fn test_split_file_rejects_unsupported_type() {
        let pipeline = test_pipeline("reject", MockRetriever::default(), MockProvider::default());
        let file = UploadedFile::new("song.mp3", vec![0, 1, 2]);
        let err = pipeline.split_file(&file).await.unwrap_err();
        assert!(matches!(err, QuizError::UnsupportedFile(_)));
    }

    #[tokio::test]
    async fn test_wikipedia_search_is_cached_by_topic() {
        let retriever = MockRetriever::default();
        let calls = retriever.calls.clone();
        let pipeline = test_pipeline("wiki", retriever, MockProvider::default());

        let first = pipeline.wikipedia_search("Paris").await.unwrap();
        let second = pipeline.wikipedia_search("Paris").await.unwrap();
        pipeline.wikipedia_search("Rome").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_quiz_chain_calls_model_once_per_key() {
        let provider = MockProvider::default();
        let calls = provider.calls.clone();
        let pipeline = test_pipeline("chain", MockRetriever::default(), provider);
        let mut ctx = SessionContext::with_credential("sk-test");
        let docs = vec![Document::new("Paris is the capital of France.")];

        let first = pipeline
            .run_quiz_chain(&mut ctx, &request(docs.clone(), Difficulty::Easy))
            .await
            .unwrap();
        let second = pipeline
            .run_quiz_chain(&mut ctx, &request(docs.clone(), Difficulty::Easy))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second, "cached quiz keeps its shuffled order");
        assert_eq!(first.len(), 2);

        pipeline
            .run_quiz_chain(&mut ctx, &request(docs, Difficulty::Hard))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cleared_credential_skips_remote_call() {
        let provider = MockProvider::default();
        let calls = provider.calls.clone();
        let keys = provider.keys.clone();
        let pipeline = test_pipeline("nokey", MockRetriever::default(), provider);

        let mut ctx = SessionContext::with_credential("sk-test");
        ctx.set_credential("");

        let err = pipeline
            .run_quiz_chain(&mut ctx, &request(vec![Document::new("x")], Difficulty::Easy))
            .await
            .unwrap_err();

        assert!(matches!(err, QuizError::NoLlm));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_credential_is_cleared() {
        let provider = MockProvider {
            reject: true,
            ..MockProvider::default()
        };
        let pipeline = test_pipeline("badkey", MockRetriever::default(), provider);
        let mut ctx = SessionContext::with_credential("sk-bad");

        let err = pipeline
            .run_quiz_chain(&mut ctx, &request(vec![Document::new("x")], Difficulty::Easy))
            .await
            .unwrap_err();

        assert!(err.is_credential());
        assert!(!ctx.has_credential());
    }

    #[test]
    fn test_quiz_key_depends_on_every_part() {
        let docs = vec![Document::new("a"), Document::new("b")];
        let base = quiz_key(&request(docs.clone(), Difficulty::Easy));

        assert_eq!(base, quiz_key(&request(docs.clone(), Difficulty::Easy)));
        assert_ne!(base, quiz_key(&request(docs.clone(), Difficulty::Hard)));
        assert_ne!(
            base,
            quiz_key(&request(vec![Document::new("ab")], Difficulty::Easy))
        );

        let mut other_source = request(docs, Difficulty::Easy);
        other_source.source = "Rome".to_string();
        assert_ne!(base, quiz_key(&other_source));
    }
}
