//! Subsequence fuzzy matching for completion queries
//!
//! A candidate matches when every query character occurs in it, in order, ignoring
//! case. Matches are scored on a 0-100 scale from four weighted components:
//!
//! | component   | weight | awarded for                                        |
//! |-------------|--------|----------------------------------------------------|
//! | prefix      | 40     | candidate starts with the query                    |
//! | contiguity  | 30     | few, long runs of consecutive matched characters   |
//! | boundary    | 20     | runs starting at a word boundary                   |
//! | compactness | 10     | query length relative to the matched span          |
//!
//! Word boundaries are the start of the name, the position after `_`, `.`, `/`, `-`
//! or whitespace, and a lowercase-to-uppercase transition (`myClass`).

const PREFIX_WEIGHT: f64 = 40.0;
const CONTIGUITY_WEIGHT: f64 = 30.0;
const BOUNDARY_WEIGHT: f64 = 20.0;
const COMPACTNESS_WEIGHT: f64 = 10.0;

/// Highest score any alignment can reach.
pub const MAX_SCORE: f64 = PREFIX_WEIGHT + CONTIGUITY_WEIGHT + BOUNDARY_WEIGHT + COMPACTNESS_WEIGHT;

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn is_separator(c: char) -> bool {
    matches!(c, '_' | '.' | '/' | '-') || c.is_whitespace()
}

fn is_word_boundary(chars: &[char], index: usize) -> bool {
    if index == 0 {
        return true;
    }
    let prev = chars[index - 1];
    let current = chars[index];
    is_separator(prev) || (prev.is_lowercase() && current.is_uppercase())
}

/// A case-folded query, reusable across many candidates.
#[derive(Debug, Clone)]
pub struct Pattern {
    needle: Vec<char>,
}

impl Pattern {
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.chars().map(fold).collect(),
        }
    }

    /// Scores `candidate`, or returns `None` when the query is not a subsequence of it.
    ///
    /// Every occurrence of the first query character is tried as an anchor. For each
    /// anchor, all alignments are searched for the most boundary-aligned runs at every
    /// run count and end position, and the best scoring one wins.
    pub fn score(&self, candidate: &str) -> Option<f64> {
        if self.needle.is_empty() {
            return None;
        }
        let original: Vec<char> = candidate.chars().collect();
        if original.len() < self.needle.len() {
            return None;
        }
        let folded: Vec<char> = original.iter().copied().map(fold).collect();

        let occurrences: Vec<Vec<usize>> = self
            .needle
            .iter()
            .map(|wanted| {
                folded
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| *c == wanted)
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();
        if occurrences.iter().any(Vec::is_empty) {
            return None;
        }

        let mut best: Option<f64> = None;
        for &anchor in &occurrences[0] {
            let Some(score) = best_alignment_score(&original, &occurrences, anchor) else {
                // No later anchor can complete the subsequence either
                break;
            };
            if best.is_none_or(|current| score > current) {
                best = Some(score);
            }
            if score >= MAX_SCORE {
                break;
            }
        }
        best
    }
}

/// Alignment state for the query prefix ending at `pos`: `boundary_runs[r]` is the
/// most runs starting on a word boundary among alignments with exactly `r` runs.
struct Partial {
    pos: usize,
    boundary_runs: Vec<Option<usize>>,
}

/// Best score over every alignment whose first character sits at `anchor`.
fn best_alignment_score(
    original: &[char],
    occurrences: &[Vec<usize>],
    anchor: usize,
) -> Option<f64> {
    let query_len = occurrences.len();

    let mut first = vec![None; query_len + 1];
    first[1] = Some(usize::from(is_word_boundary(original, anchor)));
    let mut layer = vec![Partial { pos: anchor, boundary_runs: first }];

    for (matched, positions) in occurrences.iter().enumerate().skip(1) {
        let mut next = Vec::new();
        for &pos in positions {
            let boundary = usize::from(is_word_boundary(original, pos));
            let mut table: Vec<Option<usize>> = vec![None; query_len + 1];
            for prev in layer.iter().filter(|prev| prev.pos < pos) {
                let continues_run = prev.pos + 1 == pos;
                let reachable = prev.boundary_runs.iter().enumerate().take(matched + 1);
                for (runs, best_boundary) in reachable {
                    let Some(best_boundary) = *best_boundary else { continue };
                    let (runs, boundary_runs) = if continues_run {
                        (runs, best_boundary)
                    } else {
                        (runs + 1, best_boundary + boundary)
                    };
                    if table[runs].is_none_or(|current| boundary_runs > current) {
                        table[runs] = Some(boundary_runs);
                    }
                }
            }
            if table.iter().any(Option::is_some) {
                next.push(Partial { pos, boundary_runs: table });
            }
        }
        if next.is_empty() {
            return None;
        }
        layer = next;
    }

    layer
        .iter()
        .flat_map(|end| {
            end.boundary_runs
                .iter()
                .enumerate()
                .filter_map(move |(runs, boundary_runs)| {
                    boundary_runs.map(|b| score_alignment(query_len, anchor, end.pos, runs, b))
                })
        })
        .max_by(f64::total_cmp)
}

fn score_alignment(
    query_len: usize,
    first: usize,
    last: usize,
    runs: usize,
    boundary_runs: usize,
) -> f64 {
    let query_len = query_len as f64;
    let span = (last - first + 1) as f64;
    let is_prefix = first == 0 && runs == 1;

    let prefix = if is_prefix { PREFIX_WEIGHT } else { 0.0 };
    let contiguity = CONTIGUITY_WEIGHT * (query_len - runs as f64 + 1.0) / query_len;
    let boundary = BOUNDARY_WEIGHT * boundary_runs as f64 / runs as f64;
    let compactness = COMPACTNESS_WEIGHT * query_len / span;

    prefix + contiguity + boundary + compactness
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(query: &str, candidate: &str) -> Option<f64> {
        Pattern::new(query).score(candidate)
    }

    #[test]
    fn test_non_subsequence_is_rejected() {
        assert_eq!(score("xyz", "utils.py"), None);
        assert_eq!(score("sliu", "utils.py"), None);
        assert_eq!(score("utilsx", "utils"), None);
        assert_eq!(score("", "utils"), None);
    }

    #[test]
    fn test_prefix_scores_maximum() {
        assert_eq!(score("util", "utils.py"), Some(MAX_SCORE));
        assert_eq!(score("UTIL", "utils.py"), Some(MAX_SCORE));
        assert_eq!(score("utils.py", "utils.py"), Some(MAX_SCORE));
    }

    #[test]
    fn test_ranking_order_for_util() {
        let exact = score("util", "utils.py").unwrap();
        let embedded = score("util", "my_utilities.py").unwrap();
        let scattered = score("util", "u_t_i_l_extra").unwrap();
        assert!(exact > embedded, "{} > {}", exact, embedded);
        assert!(embedded > scattered, "{} > {}", embedded, scattered);
        assert_eq!(embedded, 60.0);
    }

    #[test]
    fn test_prefix_beats_non_prefix_of_same_query() {
        let prefix = score("data", "data_loader").unwrap();
        let inner = score("data", "load_data").unwrap();
        assert!(prefix > inner);
    }

    #[test]
    fn test_camel_case_boundary_counts() {
        let camel = score("uc", "UtilityClass").unwrap();
        let flat = score("uc", "utilityclass").unwrap();
        assert!(camel > flat);
    }

    #[test]
    fn test_best_anchor_is_chosen() {
        // The first 'c' would give a scattered match; the later anchor is contiguous
        let score = score("cls", "calc_cls").unwrap();
        assert!(score >= 30.0 + 20.0 + 10.0);
    }

    #[test]
    fn test_fewer_runs_beat_greedy_alignment() {
        // Greedy matching would take the first 'b' and split "abc" into three runs
        let split = score("abc", "a_b_bc").unwrap();
        let inner = score("abc", "xa_bc").unwrap();
        assert_eq!(split, 45.0);
        assert_eq!(inner, 37.5);
        assert!(split > inner);
    }

    #[test]
    fn test_unicode_folding() {
        assert_eq!(score("ÉCOLE", "école.txt"), Some(MAX_SCORE));
    }
}
