//! Code symbol extraction through Universal Ctags
//!
//! Each file is processed by one `ctags --output-format=json` invocation whose
//! stdout carries one JSON object per line. Tag kinds are free-form strings that
//! vary per language parser; they are mapped onto [`SymbolKind`] through a fixed
//! table and anything the table does not know is dropped.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::lsp::symbol_index::{Symbol, SymbolKind};

#[derive(Debug, Error)]
pub enum CtagsError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ctags exited with {status} for {path}: {stderr}")]
    Failed {
        path: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("unreadable ctags output for {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Ctags kind names and the symbol kind each maps to.
const KIND_TABLE: &[(&str, SymbolKind)] = &[
    ("class", SymbolKind::Class),
    ("interface", SymbolKind::Class),
    ("struct", SymbolKind::Class),
    ("enum", SymbolKind::Class),
    ("type", SymbolKind::Class),
    ("method", SymbolKind::Method),
    ("member", SymbolKind::Method),
    ("function", SymbolKind::Function),
    ("func", SymbolKind::Function),
    ("procedure", SymbolKind::Function),
    ("subroutine", SymbolKind::Function),
    ("variable", SymbolKind::Variable),
    ("var", SymbolKind::Variable),
    ("field", SymbolKind::Variable),
    ("constant", SymbolKind::Variable),
];

/// Maps a ctags kind name (case-insensitive) to a symbol kind; unknown kinds map to `None`.
pub fn map_kind(ctags_kind: &str) -> Option<SymbolKind> {
    KIND_TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(ctags_kind))
        .map(|(_, kind)| *kind)
}

/// One record of ctags JSON output.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTag {
    #[serde(rename = "_type", default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl RawTag {
    /// Converts this tag into a symbol located in `file_path`, if its kind is mapped.
    pub fn into_symbol(self, file_path: &Path) -> Option<Symbol> {
        if self.name.is_empty() {
            return None;
        }
        let kind = map_kind(self.kind.as_deref()?)?;
        Some(
            Symbol::new(self.name, kind, file_path, self.line.unwrap_or(1))
                .with_scope(self.scope)
                .with_language(self.language),
        )
    }
}

/// Parses ctags JSON-lines output, skipping pseudo-tags and blank lines.
pub fn parse_tags(output: &str, path: &Path) -> Result<Vec<RawTag>, CtagsError> {
    let mut tags = Vec::new();
    for line in output.lines().filter(|line| !line.trim().is_empty()) {
        let tag: RawTag = serde_json::from_str(line).map_err(|source| CtagsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if tag.record_type.as_deref().is_none_or(|t| t == "tag") {
            tags.push(tag);
        }
    }
    Ok(tags)
}

/// Runs the ctags executable and converts its tags into symbols.
#[derive(Debug, Clone)]
pub struct CtagsManager {
    program: PathBuf,
}

impl CtagsManager {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// Returns a manager when `program --version` runs successfully.
    pub fn detect(program: impl Into<PathBuf>) -> Option<Self> {
        let manager = Self::new(program);
        match Command::new(&manager.program).arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                debug!("Found ctags: {}", version.lines().next().unwrap_or_default());
                Some(manager)
            }
            Ok(output) => {
                warn!(
                    "{} --version exited with {}; code symbols disabled",
                    manager.program.display(),
                    output.status
                );
                None
            }
            Err(e) => {
                warn!("ctags not available at {} ({}); code symbols disabled", manager.program.display(), e);
                None
            }
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Runs ctags on one file and returns its raw tag records.
    pub fn generate_tags(&self, path: &Path) -> Result<Vec<RawTag>, CtagsError> {
        let output = Command::new(&self.program)
            .arg("--output-format=json")
            .arg("--fields=+nKls")
            .arg("-f")
            .arg("-")
            .arg(path)
            .output()
            .map_err(|source| CtagsError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CtagsError::Failed {
                path: path.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_tags(&String::from_utf8_lossy(&output.stdout), path)
    }

    /// Code symbols of `path`; extraction failures are logged and yield no symbols.
    pub fn code_symbols(&self, path: &Path) -> Vec<Symbol> {
        match self.generate_tags(path) {
            Ok(tags) => {
                let symbols: Vec<Symbol> =
                    tags.into_iter().filter_map(|tag| tag.into_symbol(path)).collect();
                trace!("Extracted {} code symbols from {}", symbols.len(), path.display());
                symbols
            }
            Err(e) => {
                warn!("Symbol extraction failed: {}", e);
                Vec::new()
            }
        }
    }
}
