//! Routing a completion request to exactly one trigger engine
//!
//! Engines are consulted in their configured order and the first one whose trigger
//! occurs before the cursor handles the request. A later engine never fires while an
//! earlier trigger is present on the line, even if the later trigger sits closer to
//! the cursor.

use std::sync::Arc;

use tower_lsp::lsp_types::CompletionItem;
use tracing::debug;

use super::trigger::TriggerCompletion;
use crate::config::TriggerfishConfig;
use crate::lsp::symbol_index::SymbolIndex;

#[derive(Debug, Clone)]
pub struct CompletionRouter {
    engines: Vec<TriggerCompletion>,
}

impl CompletionRouter {
    /// Engines in priority order.
    pub fn new(engines: Vec<TriggerCompletion>) -> Self {
        Self { engines }
    }

    /// One engine per configured trigger, all sharing `index`.
    pub fn from_config(index: Arc<SymbolIndex>, config: &TriggerfishConfig) -> Self {
        Self::new(
            config
                .triggers
                .iter()
                .map(|trigger| TriggerCompletion::from_config(Arc::clone(&index), trigger, config))
                .collect(),
        )
    }

    /// The first engine, in priority order, whose trigger occurs before `cursor`.
    pub fn route(&self, line: &str, cursor: usize) -> Option<&TriggerCompletion> {
        self.engines.iter().find(|engine| engine.should_trigger(line, cursor))
    }

    /// Completion items from the routed engine, or nothing when no trigger is present.
    pub fn complete(&self, line: &str, cursor: usize) -> Vec<CompletionItem> {
        match self.route(line, cursor) {
            Some(engine) => {
                let items = engine.complete(line, cursor);
                debug!("Trigger '{}' produced {} completion items", engine.trigger(), items.len());
                items
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::symbol_index::{Symbol, SymbolKind};

    fn router() -> CompletionRouter {
        let index = Arc::new(SymbolIndex::new());
        index.add_symbols(vec![
            Symbol::file("utils.py", "/tmp/utils.py"),
            Symbol::new("MyClass", SymbolKind::Class, "/tmp/main.py", 10),
        ]);
        CompletionRouter::from_config(index, &TriggerfishConfig::default())
    }

    #[test]
    fn test_routes_by_priority_not_proximity() {
        let router = router();
        let line = "@utils.MyCl";
        let cursor = line.chars().count();

        let engine = router.route(line, cursor).unwrap();
        assert_eq!(engine.trigger(), '@');
        // The '@' engine owns the request; its query "utils.MyCl" matches no file
        assert!(router.complete(line, cursor).is_empty());
    }

    #[test]
    fn test_no_trigger_no_items() {
        let router = router();
        assert!(router.route("plain text", 10).is_none());
        assert!(router.complete("plain text", 10).is_empty());
    }

    #[test]
    fn test_class_trigger_routes_when_first_absent() {
        let router = router();
        let line = "extends .MyClass";
        let items = router.complete(line, line.chars().count());
        assert_eq!(items[0].label, "MyClass");
    }
}
