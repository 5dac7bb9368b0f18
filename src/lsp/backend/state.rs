//! Backend state management
//!
//! This module defines the TriggerfishBackend struct, which owns all state of the
//! LSP server: open documents, the shared symbol index, the completion router and
//! the symbol extraction adapter.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU32;

use dashmap::DashMap;
use tokio::sync::RwLock;
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::config::TriggerfishConfig;
use crate::ctags::CtagsManager;
use crate::lsp::features::completion::CompletionRouter;
use crate::lsp::models::LspDocument;
use crate::lsp::symbol_index::SymbolIndex;

/// The Triggerfish language server backend, managing state and handling LSP requests.
#[derive(Clone)]
pub struct TriggerfishBackend {
    pub(super) client: Client,
    pub(super) config: Arc<TriggerfishConfig>,
    /// Shared by every completion engine; mutated only through its own operations
    pub(super) index: Arc<SymbolIndex>,
    pub(super) router: Arc<CompletionRouter>,
    pub(super) documents_by_uri: Arc<DashMap<Url, Arc<LspDocument>>>,
    pub(super) serial_document_id: Arc<AtomicU32>,
    /// `None` when ctags is disabled or unavailable
    pub(super) ctags: Option<Arc<CtagsManager>>,
    pub(super) root_dir: Arc<RwLock<Option<PathBuf>>>,
}

// Manual Debug implementation since Client doesn't carry useful state
impl std::fmt::Debug for TriggerfishBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerfishBackend")
            .field("config", &self.config)
            .field("documents_count", &self.documents_by_uri.len())
            .field("ctags", &self.ctags.as_ref().map(|c| c.program().to_path_buf()))
            .finish()
    }
}
