//! Open-document state shared by every editor feature.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::lsp_types::Url;

use crate::inject::{Dependencies, InjectError, Injectable, ServiceKey};
use crate::language::{Model, ParseError, Parser};
use crate::line_index::LineIndex;

/// State for a single document.
///
/// Holds the source text and its parse result so hover, completion and
/// navigation do not re-parse on every request.
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// The full text content of the document
    pub text: String,
    /// The LSP document version number
    pub version: i32,
    /// Content hash of `text`; unchanged across edits that restore the same text
    pub digest: blake3::Hash,
    /// Precomputed line index for fast position↔offset conversion
    pub line_index: LineIndex,
    /// The parse result for `text`
    pub parsed: Result<Model, ParseError>,
    /// The most recent model that parsed, kept while the user is mid-edit
    pub last_valid: Option<Model>,
}

impl DocumentState {
    /// The model of the current text. Its ranges line up with `text`.
    pub fn current_model(&self) -> Option<&Model> {
        self.parsed.as_ref().ok()
    }

    /// The current model, or the last one that parsed.
    ///
    /// A fallback model's ranges refer to older text; use it for name
    /// lookups only, never to map offsets.
    pub fn model(&self) -> Option<&Model> {
        self.current_model().or(self.last_valid.as_ref())
    }
}

/// In-memory storage of open documents, keyed by URI.
pub struct DocumentStore {
    parser: Arc<dyn Parser>,
    documents: RwLock<HashMap<Url, DocumentState>>,
}

impl DocumentStore {
    pub fn new(parser: Arc<dyn Parser>) -> Self {
        Self {
            parser,
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Stores new text for `uri` (opening it if needed) and returns the
    /// refreshed state.
    pub async fn upsert(&self, uri: Url, text: String, version: i32) -> DocumentState {
        let parsed = self.parser.parse(&text);
        let mut documents = self.documents.write().await;

        let last_valid = match &parsed {
            Ok(model) => Some(model.clone()),
            Err(error) => {
                log::debug!("Parse error in {}: {}", uri, error);
                documents.get(&uri).and_then(|doc| doc.model().cloned())
            }
        };

        let state = DocumentState {
            line_index: LineIndex::new(&text),
            digest: blake3::hash(text.as_bytes()),
            text,
            version,
            parsed,
            last_valid,
        };
        documents.insert(uri, state.clone());
        state
    }

    pub async fn get(&self, uri: &Url) -> Option<DocumentState> {
        self.documents.read().await.get(uri).cloned()
    }

    pub async fn remove(&self, uri: &Url) -> Option<DocumentState> {
        self.documents.write().await.remove(uri)
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

impl Injectable for DocumentStore {
    fn dependencies() -> Vec<ServiceKey> {
        vec![ServiceKey::of::<dyn Parser>()]
    }

    fn construct(dependencies: &Dependencies) -> Result<Self, InjectError> {
        Ok(Self::new(dependencies.get::<dyn Parser>()?))
    }
}
