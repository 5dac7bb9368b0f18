//! Ordering and presentation of completion candidates
//!
//! Candidates gathered from several kinds are merged into one globally ranked list:
//! descending score, with equal scores left in the order they were collected
//! (kind configuration order, then index insertion order). Each item's sort text
//! encodes the inverted score followed by its rank, so an editor that re-sorts by
//! sort text lexically reproduces the same order.

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};

use super::fuzzy::MAX_SCORE;
use crate::lsp::symbol_index::CompletionCandidate;

/// Sorts candidates by descending score (stable) and keeps at most `max_results`.
pub fn rank_candidates(
    mut candidates: Vec<CompletionCandidate>,
    max_results: usize,
) -> Vec<CompletionCandidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(max_results);
    candidates
}

const MIN_RANK_WIDTH: usize = 4;

/// Digits needed to print every rank of a `count`-long list, never fewer than four.
pub fn rank_width(count: usize) -> usize {
    let mut widest = count.saturating_sub(1);
    let mut digits = 1;
    while widest >= 10 {
        widest /= 10;
        digits += 1;
    }
    digits.max(MIN_RANK_WIDTH)
}

/// Builds the sort key for the candidate at `rank` in an already ranked list.
///
/// Ranks are zero-padded to `width` digits; every key of one list must share it.
pub fn sort_text(score: f64, rank: usize, width: usize) -> String {
    let inverted = (MAX_SCORE - score.clamp(0.0, MAX_SCORE)).round() as u32;
    format!("{:03}-{:0width$}", inverted, rank, width = width)
}

/// Human-readable origin of a candidate, e.g. `method at /src/db.py:25 in Store`.
pub fn detail(candidate: &CompletionCandidate) -> String {
    let symbol = &candidate.symbol;
    let mut detail = format!("{} at {}:{}", symbol.kind, symbol.file_path.display(), symbol.line);
    if let Some(scope) = &symbol.scope {
        detail.push_str(" in ");
        detail.push_str(scope);
    }
    detail
}

/// Converts a ranked candidate list into LSP completion items, preserving its order.
pub fn to_completion_items(
    candidates: &[CompletionCandidate],
    category: CompletionItemKind,
) -> Vec<CompletionItem> {
    let width = rank_width(candidates.len());
    candidates
        .iter()
        .enumerate()
        .map(|(rank, candidate)| CompletionItem {
            label: candidate.symbol.name.clone(),
            kind: Some(category),
            detail: Some(detail(candidate)),
            sort_text: Some(sort_text(candidate.score, rank, width)),
            insert_text: Some(candidate.symbol.name.clone()),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::symbol_index::{Symbol, SymbolKind};
    use std::sync::Arc;

    fn candidate(name: &str, score: f64) -> CompletionCandidate {
        CompletionCandidate {
            symbol: Arc::new(Symbol::new(name, SymbolKind::Function, "/tmp/api.py", 15)),
            score,
        }
    }

    #[test]
    fn test_rank_is_stable_and_truncated() {
        let ranked = rank_candidates(
            vec![
                candidate("low", 10.0),
                candidate("first_tie", 50.0),
                candidate("best", 90.0),
                candidate("second_tie", 50.0),
            ],
            3,
        );
        let names: Vec<&str> = ranked.iter().map(|c| c.symbol.name.as_str()).collect();
        assert_eq!(names, vec!["best", "first_tie", "second_tie"]);
    }

    #[test]
    fn test_sort_text_is_lexically_monotonic() {
        let keys = vec![
            sort_text(100.0, 0, 4),
            sort_text(99.6, 1, 4),
            sort_text(60.0, 2, 4),
            sort_text(60.0, 3, 4),
            sort_text(0.0, 4, 4),
        ];
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys[0], "000-0000");
        assert_eq!(keys[4], "100-0004");
    }

    #[test]
    fn test_rank_width_grows_with_list() {
        assert_eq!(rank_width(0), 4);
        assert_eq!(rank_width(10_000), 4);
        assert_eq!(rank_width(10_001), 5);
        assert_eq!(rank_width(1_000_001), 7);
    }

    #[test]
    fn test_sort_text_orders_past_ten_thousand_items() {
        let candidates: Vec<CompletionCandidate> =
            (0..10_002).map(|i| candidate(&format!("file_{i}"), 50.0)).collect();
        let items = to_completion_items(&candidates, CompletionItemKind::FILE);

        let keys: Vec<&str> = items.iter().filter_map(|item| item.sort_text.as_deref()).collect();
        assert_eq!(keys[9_999], "050-09999");
        assert_eq!(keys[10_000], "050-10000");
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_completion_item_fields() {
        let mut symbol = Symbol::new("save_data", SymbolKind::Method, "/tmp/db.py", 25);
        symbol.scope = Some("Store".to_string());
        let candidate = CompletionCandidate { symbol: Arc::new(symbol), score: 100.0 };

        let items = to_completion_items(&[candidate], CompletionItemKind::METHOD);
        let item = &items[0];
        assert_eq!(item.label, "save_data");
        assert_eq!(item.insert_text.as_deref(), Some("save_data"));
        assert_eq!(item.kind, Some(CompletionItemKind::METHOD));
        assert_eq!(item.detail.as_deref(), Some("method at /tmp/db.py:25 in Store"));
        assert_eq!(item.sort_text.as_deref(), Some("000-0000"));
    }
}
