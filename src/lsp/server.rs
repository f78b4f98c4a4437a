//! LSP server implementation using lsp-server (synchronous).
//!
//! This is a simple synchronous LSP server that handles requests one at a time.
//! Every open document is reindexed as a whole after each change; requests
//! read the current symbol table through [`SymbolIndex`].

use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;

use gibiane::index::{CompletionEntry, OutlineEntry};
use gibiane::{IndexResult, Span, SymbolIndex, SymbolKind};
use lsp_server::{Connection, Message, Notification, Request, RequestId, Response};
use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionList, CompletionOptions, CompletionParams,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DocumentSymbol, DocumentSymbolParams, DocumentSymbolResponse, GotoDefinitionParams,
    GotoDefinitionResponse, Hover, HoverContents, HoverParams, HoverProviderCapability,
    InitializeParams, LanguageString, Location, LocationLink, MarkedString, Position,
    PrepareRenameResponse, ReferenceParams, RenameOptions, RenameParams, SemanticToken,
    SemanticTokenModifier, SemanticTokenType, SemanticTokens, SemanticTokensFullOptions,
    SemanticTokensLegend, SemanticTokensOptions, SemanticTokensParams, SemanticTokensResult,
    SemanticTokensServerCapabilities, ServerCapabilities, TextDocumentPositionParams,
    TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncOptions, TextEdit, Uri,
    WorkspaceEdit,
    notification::{DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument},
    request::{
        Completion, DocumentSymbolRequest, GotoDefinition, HoverRequest, PrepareRenameRequest,
        References, Rename, SemanticTokensFullRequest,
    },
};
use ropey::Rope;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::text::{apply_change, offset_from_position, span_to_range, word_at};
use super::tracing_layer::LspLayer;

/// Text of an open document.
struct Document {
    rope: Rope,
    path: PathBuf,
}

/// Main LSP server state.
struct LspServer {
    connection: Connection,
    index: SymbolIndex,
    documents: HashMap<String, Document>,
}

impl LspServer {
    fn new(connection: Connection) -> Self {
        Self {
            connection,
            index: SymbolIndex::new(),
            documents: HashMap::new(),
        }
    }

    fn run(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        loop {
            let msg = self.connection.receiver.recv()?;
            if self.process_message(msg)? {
                return Ok(());
            }
        }
    }

    /// Process a single message. Returns `Ok(true)` if shutdown was requested.
    fn process_message(&mut self, msg: Message) -> Result<bool, Box<dyn Error + Send + Sync>> {
        match msg {
            Message::Request(req) => {
                if self.connection.handle_shutdown(&req)? {
                    return Ok(true);
                }
                self.handle_request(req)?;
            }
            Message::Response(_) => {
                // We don't send requests, so we shouldn't get responses
            }
            Message::Notification(notif) => {
                self.handle_notification(notif);
            }
        }
        Ok(false)
    }

    fn handle_request(&mut self, req: Request) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(method = %req.method, "Received request");

        let response = if let Some((id, params)) = cast_request::<HoverRequest>(req.clone()) {
            Response::new_ok(id, self.hover(params))
        } else if let Some((id, params)) = cast_request::<GotoDefinition>(req.clone()) {
            Response::new_ok(id, self.goto_definition(params))
        } else if let Some((id, params)) = cast_request::<References>(req.clone()) {
            Response::new_ok(id, self.find_references(params))
        } else if let Some((id, params)) = cast_request::<PrepareRenameRequest>(req.clone()) {
            Response::new_ok(id, self.prepare_rename(params))
        } else if let Some((id, params)) = cast_request::<Rename>(req.clone()) {
            Response::new_ok(id, self.rename(params))
        } else if let Some((id, params)) = cast_request::<Completion>(req.clone()) {
            Response::new_ok(id, self.completion(params))
        } else if let Some((id, params)) = cast_request::<DocumentSymbolRequest>(req.clone()) {
            Response::new_ok(id, self.document_symbols(params))
        } else if let Some((id, params)) = cast_request::<SemanticTokensFullRequest>(req.clone())
        {
            Response::new_ok(id, self.semantic_tokens(params))
        } else {
            tracing::debug!(method = %req.method, "Unhandled request");
            Response::new_err(
                req.id,
                lsp_server::ErrorCode::MethodNotFound as i32,
                format!("unhandled method: {}", req.method),
            )
        };

        self.connection.sender.send(Message::Response(response))?;
        Ok(())
    }

    fn handle_notification(&mut self, notif: Notification) {
        if let Some(params) = cast_notification::<DidOpenTextDocument>(notif.clone()) {
            self.did_open(params);
        } else if let Some(params) = cast_notification::<DidChangeTextDocument>(notif.clone()) {
            self.did_change(params);
        } else if let Some(params) = cast_notification::<DidCloseTextDocument>(notif) {
            self.did_close(params);
        }
    }

    fn did_open(&mut self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!(uri = uri.as_str(), "Document opened");

        let document = Document {
            rope: Rope::from_str(&params.text_document.text),
            path: document_path(&uri),
        };
        self.reindex(&uri, &document);
        self.documents.insert(uri.as_str().to_owned(), document);
    }

    fn did_change(&mut self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(mut document) = self.documents.remove(uri.as_str()) else {
            tracing::warn!(uri = uri.as_str(), "Change for a document that is not open");
            return;
        };

        for change in &params.content_changes {
            if !apply_change(&mut document.rope, change) {
                tracing::warn!(uri = uri.as_str(), "Ignoring change with invalid range");
            }
        }

        self.reindex(&uri, &document);
        self.documents.insert(uri.as_str().to_owned(), document);
    }

    fn did_close(&mut self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!(uri = uri.as_str(), "Document closed");
        self.documents.remove(uri.as_str());
        self.index.remove(uri.as_str());
    }

    fn reindex(&self, uri: &Uri, document: &Document) {
        let text = document.rope.to_string();
        self.index.index_document(uri.as_str(), &document.path, &text);
    }

    /// Log and swallow a query on a document that has no table.
    fn indexed<T>(&self, result: IndexResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(%err, "Query on unindexed document");
                None
            }
        }
    }

    /// The open document and the word under `position`.
    fn word_at_position(&self, uri: &Uri, position: Position) -> Option<(&Document, String, Span)> {
        let document = self.documents.get(uri.as_str())?;
        let offset = offset_from_position(&document.rope, position)?;
        let (word, span) = word_at(&document.rope, offset)?;
        Some((document, word, span))
    }

    fn hover(&self, params: HoverParams) -> Option<Hover> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        tracing::debug!(
            line = position.line,
            character = position.character,
            "Hover request"
        );

        let (document, word, span) = self.word_at_position(uri, position)?;
        let hover = self.indexed(self.index.hover(uri.as_str(), &word))??;

        tracing::debug!(word = %word, "Found hover text");

        Some(Hover {
            contents: HoverContents::Scalar(MarkedString::LanguageString(LanguageString {
                language: hover.language.to_string(),
                value: hover.value,
            })),
            range: Some(span_to_range(&document.rope, span)),
        })
    }

    fn goto_definition(&self, params: GotoDefinitionParams) -> Option<GotoDefinitionResponse> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        tracing::debug!(
            line = position.line,
            character = position.character,
            "Go to Definition request"
        );

        let (document, word, span) = self.word_at_position(uri, position)?;
        let targets = self.indexed(self.index.definition(uri.as_str(), &word))?;
        let origin = span_to_range(&document.rope, span);

        let links: Vec<LocationLink> = targets
            .into_iter()
            .map(|target| {
                // Declarations live in the document that was queried.
                let range = span_to_range(&document.rope, target.span);
                LocationLink {
                    origin_selection_range: Some(origin),
                    target_uri: uri.clone(),
                    target_range: range,
                    target_selection_range: range,
                }
            })
            .collect();

        tracing::debug!(count = links.len(), "Found definitions");

        if links.is_empty() {
            None
        } else {
            Some(GotoDefinitionResponse::Link(links))
        }
    }

    fn find_references(&self, params: ReferenceParams) -> Option<Vec<Location>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;

        tracing::debug!(
            line = position.line,
            character = position.character,
            include_declaration,
            "Find References request"
        );

        let (document, word, _) = self.word_at_position(uri, position)?;
        let spans = self.indexed(self.index.references(
            uri.as_str(),
            &word,
            include_declaration,
        ))?;

        let locations: Vec<Location> = spans
            .into_iter()
            .map(|span| Location {
                uri: uri.clone(),
                range: span_to_range(&document.rope, span),
            })
            .collect();

        tracing::debug!(count = locations.len(), "Found references");

        Some(locations)
    }

    fn prepare_rename(&self, params: TextDocumentPositionParams) -> Option<PrepareRenameResponse> {
        let uri = &params.text_document.uri;
        let position = params.position;

        tracing::debug!(
            line = position.line,
            character = position.character,
            "Prepare rename request"
        );

        let (document, word, span) = self.word_at_position(uri, position)?;
        let placeholder = self.indexed(self.index.prepare_rename(uri.as_str(), &word))??;

        Some(PrepareRenameResponse::RangeWithPlaceholder {
            range: span_to_range(&document.rope, span),
            placeholder,
        })
    }

    #[allow(clippy::mutable_key_type)] // Uri has interior mutability but it's fine for LSP
    fn rename(&self, params: RenameParams) -> Option<WorkspaceEdit> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let new_name = &params.new_name;

        tracing::debug!(
            line = position.line,
            character = position.character,
            new_name = %new_name,
            "Rename request"
        );

        let (document, word, _) = self.word_at_position(uri, position)?;
        let rename = self.indexed(self.index.rename(uri.as_str(), &word, new_name))??;

        let text_edits: Vec<TextEdit> = rename
            .edits
            .into_iter()
            .map(|edit| TextEdit {
                range: span_to_range(&document.rope, edit.span),
                new_text: edit.new_text,
            })
            .collect();

        tracing::debug!(edit_count = text_edits.len(), "Rename edits computed");

        let mut changes = HashMap::new();
        changes.insert(uri.clone(), text_edits);

        Some(WorkspaceEdit {
            changes: Some(changes),
            document_changes: None,
            change_annotations: None,
        })
    }

    fn completion(&self, params: CompletionParams) -> Option<CompletionList> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        tracing::debug!(
            line = position.line,
            character = position.character,
            "Completion request"
        );

        let entries = self.indexed(self.index.completion(uri.as_str()))?;
        let items: Vec<CompletionItem> = entries.into_iter().map(completion_item).collect();

        tracing::debug!(count = items.len(), "Completion items");

        Some(CompletionList {
            is_incomplete: false,
            items,
        })
    }

    fn document_symbols(&self, params: DocumentSymbolParams) -> Option<DocumentSymbolResponse> {
        let uri = &params.text_document.uri;

        tracing::debug!(uri = uri.as_str(), "Document symbols request");

        let document = self.documents.get(uri.as_str())?;
        let outline = self.indexed(self.index.outline(uri.as_str()))?;
        let symbols: Vec<DocumentSymbol> = outline
            .into_iter()
            .map(|entry| create_symbol(entry, &document.rope))
            .collect();

        tracing::debug!(count = symbols.len(), "Found document symbols");

        Some(DocumentSymbolResponse::Nested(symbols))
    }

    fn semantic_tokens(&self, params: SemanticTokensParams) -> Option<SemanticTokensResult> {
        let uri = &params.text_document.uri;

        tracing::debug!(uri = uri.as_str(), "Semantic tokens request");

        let document = self.documents.get(uri.as_str())?;
        let spans = self.indexed(self.index.semantic_tokens(uri.as_str()))?;
        let data = encode_semantic_tokens(&document.rope, spans);

        tracing::debug!(count = data.len(), "Semantic tokens");

        Some(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data,
        }))
    }
}

/// Identifying path of a document, taken from its URI.
fn document_path(uri: &Uri) -> PathBuf {
    PathBuf::from(uri.path().as_str())
}

fn completion_item(entry: CompletionEntry) -> CompletionItem {
    let kind = match entry.kind {
        SymbolKind::Variable => CompletionItemKind::VARIABLE,
        SymbolKind::Function => CompletionItemKind::FUNCTION,
    };
    CompletionItem {
        label: entry.name,
        kind: Some(kind),
        detail: (!entry.detail.is_empty()).then_some(entry.detail),
        ..Default::default()
    }
}

/// Create a DocumentSymbol for an outline entry.
fn create_symbol(entry: OutlineEntry, rope: &Rope) -> DocumentSymbol {
    let range = span_to_range(rope, entry.span);
    let kind = match entry.kind {
        SymbolKind::Variable => lsp_types::SymbolKind::VARIABLE,
        SymbolKind::Function => lsp_types::SymbolKind::FUNCTION,
    };

    DocumentSymbol {
        name: entry.name,
        detail: None,
        kind,
        tags: None,
        range,
        selection_range: range,
        children: None,
        #[allow(deprecated)]
        deprecated: None,
    }
}

const TOKEN_VARIABLE: u32 = 0;
const MODIFIER_DECLARATION: u32 = 1 << 0;

fn semantic_tokens_legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: vec![SemanticTokenType::VARIABLE],
        token_modifiers: vec![SemanticTokenModifier::DECLARATION],
    }
}

/// Relative encoding of the highlighted spans.
///
/// The protocol requires tokens in document order, so the spans are sorted
/// here rather than trusting table order.
fn encode_semantic_tokens(rope: &Rope, mut spans: Vec<Span>) -> Vec<SemanticToken> {
    spans.sort();
    spans.dedup();

    let mut data = Vec::with_capacity(spans.len());
    let mut prev = Position::default();
    for span in spans {
        let range = span_to_range(rope, span);
        if range.start.line != range.end.line {
            continue;
        }
        let delta_line = range.start.line - prev.line;
        let delta_start = if delta_line == 0 {
            range.start.character - prev.character
        } else {
            range.start.character
        };
        data.push(SemanticToken {
            delta_line,
            delta_start,
            length: range.end.character - range.start.character,
            token_type: TOKEN_VARIABLE,
            token_modifiers_bitset: MODIFIER_DECLARATION,
        });
        prev = range.start;
    }
    data
}

/// Get the server capabilities for the Gibiane LSP server.
fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::INCREMENTAL),
                ..Default::default()
            },
        )),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        document_symbol_provider: Some(lsp_types::OneOf::Left(true)),
        definition_provider: Some(lsp_types::OneOf::Left(true)),
        references_provider: Some(lsp_types::OneOf::Left(true)),
        rename_provider: Some(lsp_types::OneOf::Right(RenameOptions {
            prepare_provider: Some(true),
            work_done_progress_options: Default::default(),
        })),
        completion_provider: Some(CompletionOptions {
            resolve_provider: Some(false),
            ..Default::default()
        }),
        semantic_tokens_provider: Some(
            SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
                legend: semantic_tokens_legend(),
                full: Some(SemanticTokensFullOptions::Bool(true)),
                range: None,
                work_done_progress_options: Default::default(),
            }),
        ),
        ..Default::default()
    }
}

/// Initialize the LSP server with the given connection.
///
/// This performs the LSP initialize handshake and returns a ready-to-run server.
fn initialize_server(connection: Connection) -> Result<LspServer, Box<dyn Error + Send + Sync>> {
    let capabilities = server_capabilities();
    let server_capabilities = serde_json::to_value(&capabilities)?;
    let init_params = connection.initialize(server_capabilities)?;
    let params: InitializeParams = serde_json::from_value(init_params)?;
    if let Some(client) = params.client_info {
        tracing::info!(client = %client.name, version = ?client.version, "Initialized");
    }
    Ok(LspServer::new(connection))
}

/// Start the LSP server on stdio.
///
/// `log_level` is an `EnvFilter` directive; `RUST_LOG` takes precedence.
/// Logs go to stderr, and warnings are also forwarded to the client.
pub fn serve(log_level: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (connection, io_threads) = Connection::stdio();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    let (lsp_layer, lsp_handle) = LspLayer::new(&connection, Level::WARN);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(lsp_layer)
        .try_init()?;

    let mut server = initialize_server(connection)?;
    lsp_handle.mark_initialized();
    server.run()?;

    io_threads.join()?;
    Ok(())
}

/// Cast a request to a specific type.
fn cast_request<R: lsp_types::request::Request>(req: Request) -> Option<(RequestId, R::Params)> {
    if req.method == R::METHOD {
        let params = serde_json::from_value(req.params).ok()?;
        Some((req.id, params))
    } else {
        None
    }
}

/// Cast a notification to a specific type.
fn cast_notification<N: lsp_types::notification::Notification>(
    notif: Notification,
) -> Option<N::Params> {
    if notif.method == N::METHOD {
        serde_json::from_value(notif.params).ok()
    } else {
        None
    }
}
