//! Backend struct for the FSM Language Server.
//!
//! The Backend holds server state and implements the `LanguageServer` trait
//! from tower-lsp. Every language service it uses is resolved from the
//! injector built at startup; the backend itself owns no language logic.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::diagnostics::{issue_to_diagnostic, parse_error_to_diagnostic};
use crate::formatting::{extract_format_options, format_document};
use crate::generate::{generate_document, GenerateParams, GenerateResponse};
use crate::ide::{CompletionProvider, DocumentState, DocumentStore, HoverProvider};
use crate::inject::{InjectError, Injector};
use crate::language::{Formatter, Generator, LanguageInfo, Severity, Validator};
use crate::navigation;

/// Server-side configuration, synced from the client's `fsm` settings section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default)]
    pub formatting: FormattingConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattingConfig {
    /// Indent declarations under `machine` (default: true)
    #[serde(default = "default_true")]
    pub indent_body: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    /// Publish advisory warnings alongside errors (default: true)
    #[serde(default = "default_true")]
    pub warnings: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self { indent_body: true }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { warnings: true }
    }
}

/// The services the backend needs, resolved once from the injector.
///
/// Transient services (the generator) are resolved per request through
/// `injector` instead.
#[derive(Clone)]
pub struct LanguageServices {
    pub injector: Injector,
    pub info: Arc<LanguageInfo>,
    pub documents: Arc<DocumentStore>,
    pub validator: Arc<dyn Validator>,
    pub formatter: Arc<dyn Formatter>,
    pub completion: Arc<dyn CompletionProvider>,
    pub hover: Arc<dyn HoverProvider>,
}

impl LanguageServices {
    pub fn resolve(injector: &Injector) -> std::result::Result<Self, InjectError> {
        Ok(Self {
            injector: injector.clone(),
            info: injector.resolve::<LanguageInfo>()?,
            documents: injector.resolve::<DocumentStore>()?,
            validator: injector.resolve::<dyn Validator>()?,
            formatter: injector.resolve::<dyn Formatter>()?,
            completion: injector.resolve::<dyn CompletionProvider>()?,
            hover: injector.resolve::<dyn HoverProvider>()?,
        })
    }
}

/// Hover reads only the model parsed from the current text, so the text
/// digest fully determines the cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HoverCacheKey {
    uri: String,
    digest: blake3::Hash,
    line: u32,
    character: u32,
}

impl HoverCacheKey {
    fn new(uri: &Url, state: &DocumentState, position: Position) -> Self {
        Self {
            uri: uri.to_string(),
            digest: state.digest,
            line: position.line,
            character: position.character,
        }
    }
}

const HOVER_CACHE_SIZE: usize = 256;

/// The Backend struct holds server state.
///
/// # State
/// - `client`: The LSP client handle for sending notifications
/// - `services`: Language services resolved from the injector
/// - `config`: Server configuration synced from the client
pub struct Backend {
    client: Client,
    services: LanguageServices,
    config: RwLock<ServerConfig>,
    hover_cache: Mutex<LruCache<HoverCacheKey, Option<Hover>>>,
}

impl Backend {
    pub fn new(client: Client, services: LanguageServices) -> Self {
        let capacity = NonZeroUsize::new(HOVER_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            client,
            services,
            config: RwLock::new(ServerConfig::default()),
            hover_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    async fn document(&self, uri: &Url) -> Option<DocumentState> {
        self.services.documents.get(uri).await
    }

    async fn diagnostics_for(&self, state: &DocumentState) -> Vec<Diagnostic> {
        let model = match &state.parsed {
            Ok(model) => model,
            Err(parse_error) => return vec![parse_error_to_diagnostic(parse_error)],
        };
        let warnings = self.config.read().await.validation.warnings;
        self.services
            .validator
            .validate(model)
            .iter()
            .filter(|issue| warnings || issue.severity == Severity::Error)
            .map(|issue| issue_to_diagnostic(issue, &state.line_index))
            .collect()
    }

    /// Validate a document and publish diagnostics.
    async fn validate_document(&self, uri: Url, state: &DocumentState) {
        let diagnostics = self.diagnostics_for(state).await;
        log::debug!("Publishing {} diagnostic(s) for {}", diagnostics.len(), uri);
        self.client
            .publish_diagnostics(uri, diagnostics, Some(state.version))
            .await;
    }

    /// Handles the custom `fsm/generate` request.
    pub async fn generate(&self, params: GenerateParams) -> Result<Option<GenerateResponse>> {
        let Some(state) = self.document(&params.uri).await else {
            return Ok(None);
        };
        let generator = match self.services.injector.resolve::<dyn Generator>() {
            Ok(generator) => generator,
            Err(e) => {
                log::error!("Generator unavailable: {}", e);
                return Err(tower_lsp::jsonrpc::Error::internal_error());
            }
        };
        Ok(Some(generate_document(
            generator.as_ref(),
            &state,
            params.pretty,
        )))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "fsm-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: crate::capabilities::server_capabilities(),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("{} language server initialized", self.services.info.name);
    }

    async fn shutdown(&self) -> Result<()> {
        self.services.injector.shutdown();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        log::info!("Document opened: {}", uri);

        let state = self
            .services
            .documents
            .upsert(uri.clone(), params.text_document.text, params.text_document.version)
            .await;
        self.validate_document(uri, &state).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // We use full document sync, so there's exactly one change with the full content
        if let Some(change) = params.content_changes.into_iter().next() {
            log::debug!("Document changed: {}", uri);
            let state = self
                .services
                .documents
                .upsert(uri.clone(), change.text, version)
                .await;
            self.validate_document(uri, &state).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        log::info!("Document closed: {}", uri);

        self.services.documents.remove(&uri).await;
        // Clear diagnostics for the closed document
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        log::info!("Document saved: {}", uri);

        match self.document(&uri).await {
            Some(state) => self.validate_document(uri, &state).await,
            None => log::warn!("Document not found in storage: {}", uri),
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        log::info!("Configuration changed");

        let Some(section) = params
            .settings
            .as_object()
            .and_then(|settings| settings.get(self.services.info.language_id))
        else {
            return;
        };
        match serde_json::from_value::<ServerConfig>(section.clone()) {
            Ok(new_config) => {
                log::debug!("Updated configuration: {:?}", new_config);
                *self.config.write().await = new_config;
            }
            Err(e) => log::warn!("Failed to parse configuration: {}", e),
        }
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let uri = params.text_document.uri;
        log::info!("Format document: {}", uri);

        let Some(state) = self.document(&uri).await else {
            log::warn!("Document not found for formatting: {}", uri);
            return Ok(None);
        };

        // Indentation comes from the editor request, layout from server config.
        let indent_body = self.config.read().await.formatting.indent_body;
        let options = extract_format_options(&params.options, indent_body);
        let edits = format_document(self.services.formatter.as_ref(), &state.text, &options);

        log::debug!("Returning {} format edit(s) for: {}", edits.len(), uri);
        Ok(Some(edits))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some(state) = self.document(&uri).await else {
            return Ok(None);
        };
        let Some(offset) = state.line_index.offset_of(position) else {
            return Ok(None);
        };

        let items = self
            .services
            .completion
            .complete(&state.text, offset, state.model());
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some(state) = self.document(&uri).await else {
            return Ok(None);
        };

        let key = HoverCacheKey::new(&uri, &state, position);
        if let Some(cached) = self.hover_cache.lock().await.get(&key).cloned() {
            return Ok(cached);
        }

        let hover = state.current_model().and_then(|model| {
            let offset = state.line_index.offset_of(position)?;
            let info = self.services.hover.hover(model, offset)?;
            Some(Hover {
                contents: HoverContents::Markup(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: info.markdown,
                }),
                range: Some(state.line_index.range_of(info.range)),
            })
        });

        self.hover_cache.lock().await.put(key, hover.clone());
        Ok(hover)
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some(state) = self.document(&uri).await else {
            return Ok(None);
        };
        let Some(model) = state.current_model() else {
            return Ok(None);
        };

        let location = navigation::goto_definition(&uri, &state.line_index, position, model);
        Ok(location.map(GotoDefinitionResponse::Scalar))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;

        let Some(state) = self.document(&uri).await else {
            return Ok(None);
        };
        let Some(model) = state.current_model() else {
            return Ok(None);
        };

        let locations = navigation::find_references(
            &uri,
            &state.line_index,
            position,
            model,
            include_declaration,
        );
        Ok(Some(locations))
    }
}
