//! LSP server implementation using tower-lsp.
//!
//! The server owns the open-document store and a [`BuildScheduler`]; change
//! notifications update the store and queue a debounced rebuild, while query
//! requests route through the cached [`BuildResult`] without ever waiting on
//! compilation. Diagnostics are pushed by a [`BuildListener`] each time a
//! pass publishes.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::warn;

use islet_core::build::{BuildResult, CompiledFragment};
use islet_core::compiler::{CompileError, Compiler};
use islet_core::document::{Document, DocumentStore};
use islet_core::line_index::LineIndex;
use islet_core::resolver::OsFileSystem;
use islet_core::scan::Scanner;
use islet_core::scheduler::{BuildListener, BuildScheduler};
use islet_core::types::{Location as CoreLocation, Position as CorePosition};

use crate::capabilities::server_capabilities;
use crate::convert;
use crate::options::IsletOptions;

/// The islet language server.
pub struct IsletLanguageServer {
    /// The LSP client for sending notifications.
    client: Client,
    /// Document store shared with the build scheduler.
    documents: Arc<RwLock<DocumentStore>>,
    /// Created during `initialize`, once client options are known.
    scheduler: OnceCell<BuildScheduler>,
    /// The fragment compiler, parked here until `initialize` hands it to the
    /// scheduler.
    compiler: Mutex<Option<Box<dyn Compiler>>>,
    /// Options the embedder passed to [`run_server`].
    default_options: IsletOptions,
}

impl IsletLanguageServer {
    /// Create a new language server instance.
    pub fn new(client: Client, compiler: Box<dyn Compiler>, options: IsletOptions) -> Self {
        Self {
            client,
            documents: Arc::new(RwLock::new(DocumentStore::new())),
            scheduler: OnceCell::new(),
            compiler: Mutex::new(Some(compiler)),
            default_options: options,
        }
    }

    /// Queue a debounced rebuild, if `initialize` has run.
    async fn schedule_rebuild(&self) {
        if let Some(scheduler) = self.scheduler.get() {
            scheduler.schedule().await;
        }
    }

    /// The most recently published build result.
    async fn snapshot(&self) -> Arc<BuildResult> {
        match self.scheduler.get() {
            Some(scheduler) => scheduler.current().await,
            None => Arc::new(BuildResult::empty()),
        }
    }
}

/// Pushes diagnostics to the client after every rebuild pass.
struct DiagnosticsPublisher {
    client: Client,
    documents: Arc<RwLock<DocumentStore>>,
}

#[async_trait::async_trait]
impl BuildListener for DiagnosticsPublisher {
    async fn build_completed(&self, result: Arc<BuildResult>) {
        // The result covers fragmentless documents too, so publishing an
        // empty list here is what clears their stale squiggles.
        for uri in result.uris() {
            let Ok(parsed) = Url::parse(uri) else {
                warn!(uri, "skipping diagnostics for unparseable uri");
                continue;
            };
            let diagnostics = diagnostics_for(&result, uri);
            self.client
                .publish_diagnostics(parsed, diagnostics, None)
                .await;
        }
    }

    async fn build_failed(&self, error: CompileError) {
        // The snapshot was reset to empty; retract diagnostics with it so
        // nothing stale survives the failure.
        let uris: Vec<Url> = {
            let documents = self.documents.read().await;
            documents.uris().filter_map(|u| Url::parse(u).ok()).collect()
        };
        for uri in uris {
            self.client.publish_diagnostics(uri, Vec::new(), None).await;
        }
        self.client
            .show_message(MessageType::ERROR, format!("islet: {error}"))
            .await;
    }
}

/// Collect the LSP diagnostics for one document from a build result:
/// compiler diagnostics first, then unused symbols rendered as tagged hints.
/// Analyses report over their projections; everything published here is in
/// host coordinates.
fn diagnostics_for(result: &BuildResult, uri: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for fragment in result.fragments(uri) {
        for mut diag in fragment.analysis.diagnostics() {
            diag.range = fragment.columns.range_to_host(diag.range);
            diagnostics.push(convert::diagnostic_to_lsp(&diag));
        }
        for mut unused in fragment.analysis.unused_symbols() {
            unused.range = fragment.columns.range_to_host(unused.range);
            diagnostics.push(convert::unused_symbol_to_lsp(&unused));
        }
    }
    diagnostics
}

/// Route a query position to the fragment strictly containing it.
///
/// Positions on a fragment's delimiters belong to the host document and
/// return `None`. The returned position is the query mapped onto the
/// fragment's projection, which is the text its analysis measures.
fn route_query<'a>(
    result: &'a BuildResult,
    document: &Document,
    position: Position,
) -> Option<(&'a CompiledFragment, CorePosition)> {
    let pos = convert::position_from_lsp(&position);
    let text = document.content();
    let index = LineIndex::new(text);
    let offset = index.offset(text, pos)?;
    let fragment = result.fragment_at(document.uri(), offset)?;
    Some((fragment, fragment.columns.to_projection(pos)))
}

/// The document outline across every fragment of a document, in span order.
fn document_outline(result: &BuildResult, uri: &str) -> Vec<DocumentSymbol> {
    result
        .fragments(uri)
        .iter()
        .flat_map(|fragment| {
            fragment
                .analysis
                .document_symbols()
                .into_iter()
                .map(|mut symbol| {
                    symbol.range = fragment.columns.range_to_host(symbol.range);
                    symbol.selection_range = fragment.columns.range_to_host(symbol.selection_range);
                    convert::symbol_to_lsp(&symbol)
                })
        })
        .collect()
}

/// Group rename edits by the document they apply to.
fn rename_edits(
    result: &BuildResult,
    locations: &[CoreLocation],
    new_name: &str,
) -> HashMap<Url, Vec<TextEdit>> {
    let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();
    for location in locations {
        let location = result.location_to_host(location);
        if let Some(target) = convert::location_to_lsp(&location, result) {
            changes.entry(target.uri).or_default().push(TextEdit {
                range: target.range,
                new_text: new_name.to_string(),
            });
        }
    }
    changes
}

#[tower_lsp::async_trait]
impl LanguageServer for IsletLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let options = self
            .default_options
            .clone()
            .overridden_by(params.initialization_options);

        if let Some(compiler) = self.compiler.lock().await.take() {
            let scheduler = BuildScheduler::new(
                Arc::clone(&self.documents),
                Scanner::new(options.scan.clone()),
                compiler,
                Box::new(OsFileSystem),
                Arc::new(DiagnosticsPublisher {
                    client: self.client.clone(),
                    documents: Arc::clone(&self.documents),
                }),
                options.debounce_ms,
            );
            // A second initialize is a protocol violation; keep the first.
            let _ = self.scheduler.set(scheduler);
        }

        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "islet-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "islet language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        if let Some(scheduler) = self.scheduler.get() {
            scheduler.shutdown().await;
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        {
            let mut documents = self.documents.write().await;
            documents.open(doc.uri.as_str(), &doc.language_id, &doc.text, doc.version);
        }
        self.schedule_rebuild().await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // We're using full document sync, so take the last change
        if let Some(change) = params.content_changes.into_iter().last() {
            {
                let mut documents = self.documents.write().await;
                documents.change(uri.as_str(), change.text, version);
            }
            self.schedule_rebuild().await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut documents = self.documents.write().await;
            documents.close(uri.as_str());
        }
        // Clear diagnostics for closed document
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
        self.schedule_rebuild().await;
    }

    async fn did_change_watched_files(&self, _params: DidChangeWatchedFilesParams) {
        // Included files changed on disk; whatever read them needs a pass
        self.schedule_rebuild().await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        let snapshot = self.snapshot().await;
        let documents = self.documents.read().await;
        let Some(doc) = documents.get(position.text_document.uri.as_str()) else {
            return Ok(None);
        };
        let Some((fragment, pos)) = route_query(&snapshot, doc, position.position) else {
            return Ok(None);
        };
        Ok(fragment.analysis.tooltip(&fragment.id, pos).map(|mut tooltip| {
            tooltip.range = tooltip.range.map(|r| fragment.columns.range_to_host(r));
            convert::tooltip_to_hover(&tooltip)
        }))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position;
        let snapshot = self.snapshot().await;
        let documents = self.documents.read().await;
        let Some(doc) = documents.get(position.text_document.uri.as_str()) else {
            return Ok(None);
        };
        let Some((fragment, pos)) = route_query(&snapshot, doc, position.position) else {
            return Ok(None);
        };
        let items: Vec<CompletionItem> = fragment
            .analysis
            .completions(&fragment.id, pos)
            .iter()
            .map(convert::completion_to_lsp)
            .collect();
        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params;
        let snapshot = self.snapshot().await;
        let documents = self.documents.read().await;
        let Some(doc) = documents.get(position.text_document.uri.as_str()) else {
            return Ok(None);
        };
        let Some((fragment, pos)) = route_query(&snapshot, doc, position.position) else {
            return Ok(None);
        };
        Ok(fragment
            .analysis
            .definition(&fragment.id, pos)
            .map(|location| snapshot.location_to_host(&location))
            .and_then(|location| convert::location_to_lsp(&location, &snapshot))
            .map(GotoDefinitionResponse::Scalar))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let position = params.text_document_position;
        let snapshot = self.snapshot().await;
        let documents = self.documents.read().await;
        let Some(doc) = documents.get(position.text_document.uri.as_str()) else {
            return Ok(None);
        };
        let Some((fragment, pos)) = route_query(&snapshot, doc, position.position) else {
            return Ok(None);
        };
        let locations = fragment.analysis.rename_locations(&fragment.id, pos);
        let changes = rename_edits(&snapshot, &locations, &params.new_name);
        if changes.is_empty() {
            Ok(None)
        } else {
            Ok(Some(WorkspaceEdit {
                changes: Some(changes),
                ..Default::default()
            }))
        }
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let position = params.text_document_position_params;
        let snapshot = self.snapshot().await;
        let documents = self.documents.read().await;
        let Some(doc) = documents.get(position.text_document.uri.as_str()) else {
            return Ok(None);
        };
        let Some((fragment, pos)) = route_query(&snapshot, doc, position.position) else {
            return Ok(None);
        };
        Ok(fragment
            .analysis
            .signature_help(&fragment.id, pos)
            .map(|help| convert::signature_help_to_lsp(&help)))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let snapshot = self.snapshot().await;
        let symbols = document_outline(&snapshot, uri.as_str());
        if symbols.is_empty() {
            Ok(None)
        } else {
            Ok(Some(DocumentSymbolResponse::Nested(symbols)))
        }
    }
}

/// Run the LSP server over stdio.
///
/// The embedder supplies the fragment compiler; everything else starts from
/// `options`, which clients can override via `initializationOptions`.
pub async fn run_server(compiler: Box<dyn Compiler>, options: IsletOptions) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::new(move |client| IsletLanguageServer::new(client, compiler, options));
    Server::new(stdin, stdout, socket).serve(service).await;
}
