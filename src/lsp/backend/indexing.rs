//! Symbol indexing operations for the LSP backend
//!
//! This module contains the functionality that feeds the shared symbol index:
//! - Single file indexing on open and change (FILE symbol plus code symbols)
//! - Workspace-wide indexing at initialization, parallelized with Rayon
//! - Project file enumeration that skips hidden and tool directories

use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::ctags::CtagsManager;
use crate::lsp::symbol_index::Symbol;

use super::state::TriggerfishBackend;

/// Entry names never descended into (or indexed) during a workspace scan.
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    ".tox",
    ".nox",
    ".venv",
    "venv",
    "env",
    "node_modules",
    "dist",
    "build",
];

fn is_ignored_dir_name(name: &str) -> bool {
    IGNORED_DIRS.contains(&name)
}

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    (entry.file_type().is_dir() && name.starts_with('.')) || is_ignored_dir_name(name)
}

/// Enumerates every regular file under `root`, skipping hidden directories and
/// the tool directories named in `IGNORED_DIRS`. Hidden files are kept.
///
/// Entries are visited in file-name order so repeated scans index identically.
pub fn walk_project_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry))
        .filter_map(|result| match result {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry during scan: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .collect()
}

/// Name of the FILE symbol for `path`: the path relative to `root` with `/`
/// separators, or the bare file name when there is no root or `path` lies outside it.
pub fn relative_name(root: Option<&Path>, path: &Path) -> String {
    if let Some(relative) = root.and_then(|root| path.strip_prefix(root).ok()) {
        let parts: Vec<_> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect();
        if !parts.is_empty() {
            return parts.join("/");
        }
    }
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// FILE symbol plus extracted code symbols for one file. Blocking: may run ctags.
fn file_symbols(ctags: Option<&CtagsManager>, root: Option<&Path>, path: &Path) -> Vec<Symbol> {
    let mut symbols = vec![Symbol::file(relative_name(root, path), path)];
    if let Some(ctags) = ctags {
        symbols.extend(ctags.code_symbols(path));
    }
    symbols
}

impl TriggerfishBackend {
    /// Re-indexes a single file, replacing whatever the index held for it.
    pub async fn index_file(&self, path: &Path) {
        let root = self.root_dir().await;
        let ctags = self.ctags.clone();
        let owned_path = path.to_path_buf();

        let symbols = match tokio::task::spawn_blocking(move || {
            file_symbols(ctags.as_deref(), root.as_deref(), &owned_path)
        })
        .await
        {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!("Symbol extraction task for {:?} failed: {}", path, e);
                return;
            }
        };

        debug!("Indexed {} symbols for {:?}", symbols.len(), path);
        self.index.update_file(path, symbols);
    }

    /// Scans the workspace under `root` and adds every file's symbols to the index.
    ///
    /// Extraction runs on the Rayon pool; symbols are added in scan order.
    pub async fn index_workspace(&self, root: &Path) {
        let start = Instant::now();
        let ctags = self.ctags.clone();
        let owned_root = root.to_path_buf();

        let per_file: Vec<Vec<Symbol>> = match tokio::task::spawn_blocking(move || {
            let paths = walk_project_files(&owned_root);
            info!("Found {} files to index in {:?}", paths.len(), owned_root);
            paths
                .par_iter()
                .map(|path| file_symbols(ctags.as_deref(), Some(owned_root.as_path()), path))
                .collect()
        })
        .await
        {
            Ok(per_file) => per_file,
            Err(e) => {
                warn!("Workspace scan of {:?} failed: {}", root, e);
                return;
            }
        };

        for symbols in per_file {
            self.index.add_symbols(symbols);
        }

        info!(
            "Indexed workspace in {:.3}ms: {}",
            start.elapsed().as_secs_f64() * 1000.0,
            self.index.stats()
        );
    }
}
