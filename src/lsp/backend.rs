use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use tokio::sync::RwLock;
use tower_lsp::Client;
use tracing::info;

use crate::config::TriggerfishConfig;
use crate::ctags::CtagsManager;
use crate::lsp::features::completion::CompletionRouter;
use crate::lsp::symbol_index::SymbolIndex;

mod handlers;
mod indexing;
mod state;

pub use indexing::{relative_name, walk_project_files};
pub use state::TriggerfishBackend;

impl TriggerfishBackend {
    /// Creates a backend with an empty index and one completion engine per configured trigger.
    ///
    /// When ctags is enabled in `config`, the executable is probed once here; if it is
    /// missing, files are indexed with their FILE symbol only.
    pub fn new(client: Client, config: TriggerfishConfig) -> Self {
        let ctags = if config.ctags_enabled {
            CtagsManager::detect(&config.ctags_path).map(Arc::new)
        } else {
            info!("ctags disabled by configuration");
            None
        };
        Self::with_ctags(client, config, ctags)
    }

    /// Creates a backend with an explicit (possibly absent) symbol extractor.
    pub fn with_ctags(
        client: Client,
        config: TriggerfishConfig,
        ctags: Option<Arc<CtagsManager>>,
    ) -> Self {
        let index = Arc::new(SymbolIndex::new());
        let router = Arc::new(CompletionRouter::from_config(Arc::clone(&index), &config));

        Self {
            client,
            config: Arc::new(config),
            index,
            router,
            documents_by_uri: Arc::new(DashMap::new()),
            serial_document_id: Arc::new(AtomicU32::new(0)),
            ctags,
            root_dir: Arc::new(RwLock::new(None)),
        }
    }

    pub(super) fn next_document_id(&self) -> u32 {
        self.serial_document_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn config(&self) -> &TriggerfishConfig {
        &self.config
    }

    /// The symbol index shared by all completion engines.
    pub fn index(&self) -> &Arc<SymbolIndex> {
        &self.index
    }

    pub async fn root_dir(&self) -> Option<PathBuf> {
        self.root_dir.read().await.clone()
    }

    /// Overrides the workspace root used to name FILE symbols.
    pub async fn set_root_dir(&self, root: Option<PathBuf>) {
        *self.root_dir.write().await = root;
    }
}
