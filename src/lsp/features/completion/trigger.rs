//! Trigger-character completion engine
//!
//! A [`TriggerCompletion`] watches for one trigger character. When the trigger appears
//! at or before the cursor, the text between its last occurrence and the cursor is the
//! query, which is matched against the engine's eligible symbol kinds in the shared
//! [`SymbolIndex`].
//!
//! Cursor positions are character (not byte) offsets into the line. Every operation is
//! total: malformed input (cursor past the end of the line, no trigger, whitespace in
//! the query) yields "no query" or an empty result.

use std::sync::Arc;

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};
use tracing::trace;

use super::ranking::{rank_candidates, to_completion_items};
use crate::config::{TriggerConfig, TriggerfishConfig};
use crate::lsp::symbol_index::{CompletionCandidate, SymbolIndex, SymbolKind};

/// Byte offset of character `cursor` in `line`, or `None` if the cursor lies past the end.
fn cursor_byte_offset(line: &str, cursor: usize) -> Option<usize> {
    line.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(line.len()))
        .nth(cursor)
}

/// Completion engine for a single trigger character.
#[derive(Debug, Clone)]
pub struct TriggerCompletion {
    index: Arc<SymbolIndex>,
    trigger: char,
    kinds: Vec<SymbolKind>,
    category: CompletionItemKind,
    max_completion_items: usize,
    min_fuzzy_score: f64,
}

impl TriggerCompletion {
    pub fn new(
        index: Arc<SymbolIndex>,
        trigger: char,
        kinds: Vec<SymbolKind>,
        category: CompletionItemKind,
        max_completion_items: usize,
        min_fuzzy_score: f64,
    ) -> Self {
        Self {
            index,
            trigger,
            kinds,
            category,
            max_completion_items,
            min_fuzzy_score,
        }
    }

    /// Builds an engine for `trigger` using the limits from `config`.
    pub fn from_config(
        index: Arc<SymbolIndex>,
        trigger: &TriggerConfig,
        config: &TriggerfishConfig,
    ) -> Self {
        Self::new(
            index,
            trigger.trigger,
            trigger.kinds.clone(),
            trigger.category(),
            config.max_completion_items,
            config.min_fuzzy_score,
        )
    }

    pub fn trigger(&self) -> char {
        self.trigger
    }

    /// True when the trigger character occurs anywhere in `line` before `cursor`.
    pub fn should_trigger(&self, line: &str, cursor: usize) -> bool {
        cursor_byte_offset(line, cursor).is_some_and(|end| line[..end].contains(self.trigger))
    }

    /// Extracts the text between the last trigger before `cursor` and `cursor`.
    ///
    /// Returns `Some("")` when the trigger is the character right before the cursor.
    pub fn parse_query<'a>(&self, line: &'a str, cursor: usize) -> Option<&'a str> {
        let end = cursor_byte_offset(line, cursor)?;
        let head = &line[..end];
        let start = head.rfind(self.trigger)? + self.trigger.len_utf8();
        let query = &head[start..];
        if query.chars().any(char::is_whitespace) {
            return None;
        }
        Some(query)
    }

    /// Ranked candidates for the query at `cursor`, at most `max_completion_items`.
    pub fn get_completions(&self, line: &str, cursor: usize) -> Vec<CompletionCandidate> {
        let Some(query) = self.parse_query(line, cursor) else {
            return Vec::new();
        };

        if query.is_empty() {
            let mut candidates = Vec::new();
            for kind in &self.kinds {
                let remaining = self.max_completion_items - candidates.len();
                if remaining == 0 {
                    break;
                }
                candidates.extend(
                    self.index
                        .first_symbols(*kind, remaining)
                        .into_iter()
                        .map(CompletionCandidate::unscored),
                );
            }
            trace!("Trigger '{}' with empty query: {} candidates", self.trigger, candidates.len());
            return candidates;
        }

        let mut candidates = Vec::new();
        for kind in &self.kinds {
            candidates.extend(self.index.fuzzy_search(
                query,
                *kind,
                self.max_completion_items,
                self.min_fuzzy_score,
            ));
        }
        trace!(
            "Trigger '{}' query {:?}: {} candidates before ranking",
            self.trigger,
            query,
            candidates.len()
        );
        rank_candidates(candidates, self.max_completion_items)
    }

    /// Completion items for the query at `cursor`, in ranked order.
    pub fn complete(&self, line: &str, cursor: usize) -> Vec<CompletionItem> {
        to_completion_items(&self.get_completions(line, cursor), self.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::symbol_index::Symbol;

    fn engine(trigger: char, kinds: Vec<SymbolKind>) -> TriggerCompletion {
        TriggerCompletion::new(
            Arc::new(SymbolIndex::new()),
            trigger,
            kinds,
            CompletionItemKind::FILE,
            50,
            0.0,
        )
    }

    #[test]
    fn test_should_trigger_and_parse() {
        let handler = engine('@', vec![SymbolKind::File]);
        let line = "open @utils";
        let end = line.chars().count();

        assert!(handler.should_trigger(line, end));
        assert_eq!(handler.parse_query(line, end), Some("utils"));
        assert_eq!(handler.parse_query(line, 7), Some("u"));
        assert!(!handler.should_trigger(line, 5));
        assert_eq!(handler.parse_query(line, 5), None);
    }

    #[test]
    fn test_trigger_at_cursor_gives_empty_query() {
        let handler = engine('.', vec![SymbolKind::Class]);
        assert_eq!(handler.parse_query(".", 1), Some(""));
        assert_eq!(handler.parse_query("a.b.", 4), Some(""));
    }

    #[test]
    fn test_last_trigger_wins_within_engine() {
        let handler = engine('.', vec![SymbolKind::Class]);
        assert_eq!(handler.parse_query("a.b.Cla", 7), Some("Cla"));
    }

    #[test]
    fn test_whitespace_in_query_aborts() {
        let handler = engine('@', vec![SymbolKind::File]);
        let line = "see @utils and more";
        let end = line.chars().count();

        assert!(handler.should_trigger(line, end));
        assert_eq!(handler.parse_query(line, end), None);
        assert_eq!(handler.parse_query("@a\tb", 4), None);
    }

    #[test]
    fn test_cursor_past_end_is_rejected() {
        let handler = engine('@', vec![SymbolKind::File]);
        assert!(!handler.should_trigger("@ab", 4));
        assert_eq!(handler.parse_query("@ab", 4), None);
        assert!(handler.get_completions("@ab", 40).is_empty());
    }

    #[test]
    fn test_multibyte_line() {
        let handler = engine('#', vec![SymbolKind::Function]);
        let line = "héllo #fü";
        assert_eq!(handler.parse_query(line, 9), Some("fü"));
        assert_eq!(handler.parse_query(line, 8), Some("f"));
    }

    #[test]
    fn test_empty_query_lists_in_insertion_order_across_kinds() {
        let index = Arc::new(SymbolIndex::new());
        index.add_symbols(vec![
            Symbol::new("get_user", SymbolKind::Function, "/tmp/api.py", 15),
            Symbol::new("save_data", SymbolKind::Method, "/tmp/db.py", 25),
            Symbol::new("calculate_sum", SymbolKind::Function, "/tmp/math.py", 8),
        ]);
        let handler = TriggerCompletion::new(
            index,
            '#',
            vec![SymbolKind::Method, SymbolKind::Function],
            CompletionItemKind::METHOD,
            2,
            0.0,
        );

        let candidates = handler.get_completions("#", 1);
        let names: Vec<&str> = candidates.iter().map(|c| c.symbol.name.as_str()).collect();
        assert_eq!(names, vec!["save_data", "get_user"]);
        assert!(candidates.iter().all(|c| c.score == 0.0));
    }

    #[test]
    fn test_global_ranking_across_kinds() {
        let index = Arc::new(SymbolIndex::new());
        index.add_symbols(vec![
            Symbol::new("restart", SymbolKind::Method, "/tmp/svc.py", 3),
            Symbol::new("start", SymbolKind::Function, "/tmp/svc.py", 9),
        ]);
        let handler = TriggerCompletion::new(
            index,
            '#',
            vec![SymbolKind::Method, SymbolKind::Function],
            CompletionItemKind::METHOD,
            10,
            0.0,
        );

        let items = handler.complete("#start", 6);
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["start", "restart"]);
        assert!(items.iter().all(|i| i.kind == Some(CompletionItemKind::METHOD)));
    }
}
