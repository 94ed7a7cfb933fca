//! External collaborator handles.
//!
//! The chat model and vector index are consumed as opaque external services.
//! They sit behind object-safe traits and are injected as shared handles with
//! their own lifecycle, never reached through process-global state. This
//! crate ships no concrete network implementation; hosts provide one, tests
//! use in-memory doubles.

use crate::documents::RetrievalDocument;
use crate::error::AnnotatorResult;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// A chat-completion service: accepts a prompt, returns a text completion.
#[async_trait]
pub trait ChatProvider: Send + Sync + Debug {
    async fn complete(&self, prompt: &str) -> AnnotatorResult<String>;
}

/// A similarity-search index that accepts retrieval documents for storage.
/// Returns the number of documents accepted.
#[async_trait]
pub trait VectorIndex: Send + Sync + Debug {
    async fn add_documents(&self, documents: Vec<RetrievalDocument>) -> AnnotatorResult<usize>;
}

/// Injected service handles for the question-answering layer.
#[derive(Debug, Clone)]
pub struct ServiceHandles {
    pub chat: Arc<dyn ChatProvider>,
    pub index: Arc<dyn VectorIndex>,
}

impl ServiceHandles {
    /// Bundle a chat provider and a vector index.
    pub fn new(chat: Arc<dyn ChatProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { chat, index }
    }

    /// Push documents into the index.
    pub async fn index_documents(
        &self,
        documents: Vec<RetrievalDocument>,
    ) -> AnnotatorResult<usize> {
        self.index.add_documents(documents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DocumentMetadata;
    use crate::error::AnnotatorError;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct EchoChat;

    #[async_trait]
    impl ChatProvider for EchoChat {
        async fn complete(&self, prompt: &str) -> AnnotatorResult<String> {
            Ok(format!("echo: {prompt}"))
        }
    }

    #[derive(Debug, Default)]
    struct RecordingIndex {
        stored: Mutex<Vec<RetrievalDocument>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn add_documents(
            &self,
            documents: Vec<RetrievalDocument>,
        ) -> AnnotatorResult<usize> {
            let mut stored = self
                .stored
                .lock()
                .map_err(|_| AnnotatorError::service("index lock poisoned"))?;
            let count = documents.len();
            stored.extend(documents);
            Ok(count)
        }
    }

    fn sample_document(table: &str) -> RetrievalDocument {
        RetrievalDocument {
            content: format!("Table: {table}\n"),
            metadata: DocumentMetadata {
                table_name: table.to_string(),
                table_description: String::new(),
                columns: Vec::new(),
                relationships: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn test_chat_provider_completes() {
        let handles = ServiceHandles::new(Arc::new(EchoChat), Arc::new(RecordingIndex::default()));
        let answer = handles.chat.complete("What does orders store?").await.unwrap();
        assert!(answer.contains("orders"));
    }

    #[tokio::test]
    async fn test_index_documents_counts_accepted() {
        let index = Arc::new(RecordingIndex::default());
        let handles = ServiceHandles::new(Arc::new(EchoChat), index.clone());

        let accepted = handles
            .index_documents(vec![sample_document("orders"), sample_document("customers")])
            .await
            .unwrap();
        assert_eq!(accepted, 2);
        assert_eq!(index.stored.lock().unwrap().len(), 2);
    }
}
