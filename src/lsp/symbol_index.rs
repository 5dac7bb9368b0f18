//! Kind-partitioned symbol index with per-file replacement
//!
//! Symbols are stored in insertion order per [`SymbolKind`], which doubles as the
//! deterministic fallback ordering for completion. A per-file membership map records
//! which kinds each path contributed to, so [`SymbolIndex::update_file`] only has to
//! rewrite the partitions that actually hold that file's symbols.
//!
//! All state sits behind a single `parking_lot::RwLock`. Queries take the read lock
//! and may run concurrently; mutations take the write lock and are atomic with respect
//! to every reader. The lock never escapes this module.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tower_lsp::lsp_types::CompletionItemKind;

use crate::lsp::features::completion::fuzzy;

/// Closed classification of indexed symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    File,
    Class,
    Method,
    Function,
    Variable,
}

/// Fixed presentation attached to each [`SymbolKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindPresentation {
    /// Icon/category shown by the editor
    pub completion_kind: CompletionItemKind,
    /// Lowercase name used in detail strings and configuration
    pub label: &'static str,
}

const fn shown_as(completion_kind: CompletionItemKind, label: &'static str) -> KindPresentation {
    KindPresentation { completion_kind, label }
}

const PRESENTATIONS: [(SymbolKind, KindPresentation); 5] = [
    (SymbolKind::File, shown_as(CompletionItemKind::FILE, "file")),
    (SymbolKind::Class, shown_as(CompletionItemKind::CLASS, "class")),
    (SymbolKind::Method, shown_as(CompletionItemKind::METHOD, "method")),
    (SymbolKind::Function, shown_as(CompletionItemKind::FUNCTION, "function")),
    (SymbolKind::Variable, shown_as(CompletionItemKind::VARIABLE, "variable")),
];

impl SymbolKind {
    /// Every kind, in declaration order.
    pub const ALL: [SymbolKind; 5] = [
        SymbolKind::File,
        SymbolKind::Class,
        SymbolKind::Method,
        SymbolKind::Function,
        SymbolKind::Variable,
    ];

    /// Looks up the presentation descriptor for this kind.
    pub fn presentation(self) -> KindPresentation {
        PRESENTATIONS[self as usize].1
    }

    pub fn label(self) -> &'static str {
        self.presentation().label
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PRESENTATIONS
            .iter()
            .find(|(_, presentation)| presentation.label.eq_ignore_ascii_case(wanted))
            .map(|(kind, _)| *kind)
            .ok_or_else(|| format!("unknown symbol kind '{}'", wanted))
    }
}

/// A named, kinded, located completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub file_path: PathBuf,
    /// 1-based source line
    pub line: u32,
    pub scope: Option<String>,
    pub language: Option<String>,
}

impl Symbol {
    /// Creates a symbol without scope or language information.
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        file_path: impl Into<PathBuf>,
        line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            file_path: file_path.into(),
            line,
            scope: None,
            language: None,
        }
    }

    /// Creates the whole-file symbol for `file_path`, displayed as `name`.
    pub fn file(name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self::new(name, SymbolKind::File, file_path, 1)
    }

    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

/// A symbol paired with its match score (higher is better).
#[derive(Debug, Clone)]
pub struct CompletionCandidate {
    pub symbol: Arc<Symbol>,
    pub score: f64,
}

impl CompletionCandidate {
    pub fn unscored(symbol: Arc<Symbol>) -> Self {
        Self { symbol, score: 0.0 }
    }
}

/// Per-kind symbol counts, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files: usize,
    pub by_kind: Vec<(SymbolKind, usize)>,
}

impl IndexStats {
    pub fn count(&self, kind: SymbolKind) -> usize {
        self.by_kind
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.by_kind.iter().map(|(_, count)| count).sum()
    }
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} files", self.files)?;
        for (kind, count) in &self.by_kind {
            write!(f, ", {} {}", count, kind)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct IndexState {
    by_kind: FxHashMap<SymbolKind, Vec<Arc<Symbol>>>,
    /// Kinds each path has contributed symbols to
    files: FxHashMap<PathBuf, FxHashSet<SymbolKind>>,
}

impl IndexState {
    fn insert(&mut self, symbol: Symbol) {
        self.files
            .entry(symbol.file_path.clone())
            .or_default()
            .insert(symbol.kind);
        self.by_kind.entry(symbol.kind).or_default().push(Arc::new(symbol));
    }

    fn remove_file(&mut self, path: &Path) {
        let Some(kinds) = self.files.remove(path) else {
            return;
        };
        for kind in kinds {
            if let Some(symbols) = self.by_kind.get_mut(&kind) {
                symbols.retain(|symbol| symbol.file_path != path);
            }
        }
    }
}

/// In-memory symbol store shared by all completion engines.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    state: RwLock<IndexState>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends symbols, grouped by kind, without removing anything.
    pub fn add_symbols(&self, symbols: impl IntoIterator<Item = Symbol>) {
        let mut state = self.state.write();
        for symbol in symbols {
            state.insert(symbol);
        }
    }

    /// Replaces every symbol attributed to `path` with `symbols`.
    ///
    /// Symbols in `symbols` whose own path differs from `path` are still indexed,
    /// but under their own path.
    pub fn update_file(&self, path: &Path, symbols: impl IntoIterator<Item = Symbol>) {
        let mut state = self.state.write();
        state.remove_file(path);
        for symbol in symbols {
            state.insert(symbol);
        }
    }

    /// Returns all symbols of `kind`, or of every kind, in insertion order.
    pub fn get_symbols(&self, kind: Option<SymbolKind>) -> Vec<Arc<Symbol>> {
        let state = self.state.read();
        match kind {
            Some(kind) => state.by_kind.get(&kind).cloned().unwrap_or_default(),
            None => SymbolKind::ALL
                .iter()
                .filter_map(|kind| state.by_kind.get(kind))
                .flat_map(|symbols| symbols.iter().cloned())
                .collect(),
        }
    }

    /// Returns at most `limit` symbols of `kind` in insertion order, without scoring.
    pub fn first_symbols(&self, kind: SymbolKind, limit: usize) -> Vec<Arc<Symbol>> {
        let state = self.state.read();
        state
            .by_kind
            .get(&kind)
            .map(|symbols| symbols.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Scores every symbol of `kind` against `query`.
    ///
    /// Results are sorted by descending score; equal scores keep insertion order.
    /// Names that are not a case-insensitive subsequence match, or that score below
    /// `min_score`, are left out.
    pub fn fuzzy_search(
        &self,
        query: &str,
        kind: SymbolKind,
        limit: usize,
        min_score: f64,
    ) -> Vec<CompletionCandidate> {
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }
        let pattern = fuzzy::Pattern::new(query);

        let mut matches: Vec<CompletionCandidate> = {
            let state = self.state.read();
            let Some(symbols) = state.by_kind.get(&kind) else {
                return Vec::new();
            };
            symbols
                .iter()
                .filter_map(|symbol| {
                    pattern
                        .score(&symbol.name)
                        .filter(|score| *score >= min_score)
                        .map(|score| CompletionCandidate {
                            symbol: Arc::clone(symbol),
                            score,
                        })
                })
                .collect()
        };

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(limit);
        matches
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        IndexStats {
            files: state.files.len(),
            by_kind: SymbolKind::ALL
                .iter()
                .map(|kind| (*kind, state.by_kind.get(kind).map_or(0, Vec::len)))
                .collect(),
        }
    }
}
