//! LSP protocol handler implementations
//!
//! This module contains the `tower_lsp::LanguageServer` trait implementation
//! for the Triggerfish backend:
//! - Lifecycle handlers (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_close)
//! - Trigger-character completion

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tower_lsp::{LanguageServer, jsonrpc};
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::{
    CompletionList, CompletionOptions, CompletionParams, CompletionResponse,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    InitializeParams, InitializeResult, InitializedParams, MessageType, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind, Url,
};
use tracing::{debug, info, warn};

use crate::lsp::document::utf16_to_char_offset;
use crate::lsp::models::LspDocument;

use super::state::TriggerfishBackend;

/// Workspace root announced by the client: the first workspace folder, else the root URI.
#[allow(deprecated)]
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    let uri = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri)
        .or(params.root_uri.as_ref())?;

    match uri.to_file_path() {
        Ok(path) => Some(path),
        Err(()) => {
            warn!("Workspace root {} is not a file path. Skipping workspace indexing.", uri);
            None
        }
    }
}

fn empty_completion() -> Option<CompletionResponse> {
    Some(CompletionResponse::List(CompletionList {
        is_incomplete: false,
        items: Vec::new(),
    }))
}

impl TriggerfishBackend {
    async fn reindex_uri(&self, uri: &Url) {
        match uri.to_file_path() {
            Ok(path) => self.index_file(&path).await,
            Err(()) => debug!("Not indexing non-file URI {}", uri),
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for TriggerfishBackend {
    /// Handles the LSP initialize request, recording the workspace root and indexing its files.
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!("Received initialize: {:?}", params);

        let root = workspace_root(&params);
        self.set_root_dir(root.clone()).await;
        if let Some(root) = root {
            self.index_workspace(&root).await;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(self.config.trigger_characters()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        let stats = self.index.stats();
        info!("Triggerfish LSP initialized: {}", stats);
        self.client
            .log_message(MessageType::INFO, format!("Triggerfish ready: {}", stats))
            .await;
    }

    /// Handles the LSP shutdown request.
    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");
        Ok(())
    }

    /// Handles opening a text document: stores its text and re-indexes the file.
    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        info!("Opening document: URI={}, version={}", params.text_document.uri, params.text_document.version);
        let uri = params.text_document.uri;
        let document = Arc::new(LspDocument::new(
            self.next_document_id(),
            uri.clone(),
            &params.text_document.text,
            params.text_document.version,
        ));
        self.documents_by_uri.insert(uri.clone(), document);
        self.reindex_uri(&uri).await;
    }

    /// Handles document changes: applies incremental edits and re-indexes the file.
    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        debug!("textDocument/didChange: URI={}, version={}", uri, version);

        // Clone the Arc out so the map shard is not held across awaits
        let document = self.documents_by_uri.get(&uri).map(|entry| Arc::clone(entry.value()));
        match document {
            Some(document) => {
                if let Err(e) = document.apply(params.content_changes, version).await {
                    warn!("Failed to apply changes to document with URI={}: {}", uri, e);
                }
            }
            None => warn!("Failed to find document with URI={}", uri),
        }
        self.reindex_uri(&uri).await;
    }

    /// Handles closing a document. Its symbols stay in the index.
    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some((_, document)) = self.documents_by_uri.remove(&uri) {
            info!("Closed document: {}, id: {}", uri, document.id);
        } else {
            warn!("Failed to find document with URI={}", uri);
        }
    }

    /// Completes the partial query after a trigger character on the cursor's line.
    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let start = Instant::now();
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        if !uri.as_str().ends_with(&self.config.completion_suffix) {
            debug!("Completion not offered for {}", uri);
            return Ok(empty_completion());
        }

        let document = self.documents_by_uri.get(uri).map(|entry| Arc::clone(entry.value()));
        let Some(document) = document else {
            debug!("Document not found for completion: {}", uri);
            return Ok(empty_completion());
        };

        let line = document.line_text(position.line as usize).await.unwrap_or_default();
        let Some(cursor) = utf16_to_char_offset(&line, position.character) else {
            debug!("Cursor {:?} lies past the end of line {:?}", position, line);
            return Ok(empty_completion());
        };

        let items = self.router.complete(&line, cursor);
        debug!(
            "completion for {} at {:?} produced {} items in {:.3}ms",
            uri,
            position,
            items.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Some(CompletionResponse::List(CompletionList {
            is_incomplete: false,
            items,
        })))
    }
}
