//! Benchmark suite for trigger completion
//!
//! This benchmark measures:
//! - Fuzzy scoring of a single name
//! - Index-wide fuzzy search with various index sizes
//! - Empty-query listing
//! - Full routed completion, from line text to LSP items

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use triggerfish::config::TriggerfishConfig;
use triggerfish::lsp::features::completion::{CompletionRouter, Pattern};
use triggerfish::lsp::symbol_index::{Symbol, SymbolIndex, SymbolKind};

const SEGMENTS: &[&str] = &["core", "utils", "handlers", "models", "api", "db", "views", "tests"];

/// Builds an index with `files` FILE symbols and a class plus two functions per file.
fn generate_index(files: usize) -> Arc<SymbolIndex> {
    let index = Arc::new(SymbolIndex::new());
    index.add_symbols((0..files).flat_map(|i| {
        let dir = SEGMENTS[i % SEGMENTS.len()];
        let sub = SEGMENTS[(i / SEGMENTS.len()) % SEGMENTS.len()];
        let name = format!("{dir}/{sub}/module_{i}.py");
        let path = format!("/bench/{name}");
        [
            Symbol::file(name, path.clone()),
            Symbol::new(format!("{}Service{i}", capitalize(sub)), SymbolKind::Class, path.clone(), 3),
            Symbol::new(format!("get_{dir}_{i}"), SymbolKind::Function, path.clone(), 10),
            Symbol::new(format!("save_{sub}_{i}"), SymbolKind::Method, path, 20),
        ]
    }));
    index
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn bench_pattern_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_score");
    let pattern = Pattern::new("hndlr");

    for name in ["handlers.py", "core/handlers/module_42.py", "some_very_long_module_name_without_match.py"] {
        group.bench_with_input(BenchmarkId::from_parameter(name.len()), name, |b, name| {
            b.iter(|| black_box(pattern.score(black_box(name))));
        });
    }
    group.finish();
}

fn bench_fuzzy_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuzzy_search");

    for files in [100, 1_000, 10_000] {
        let index = generate_index(files);
        group.throughput(Throughput::Elements(files as u64));
        group.bench_with_input(BenchmarkId::new("files", files), &index, |b, index| {
            b.iter(|| black_box(index.fuzzy_search(black_box("utmod"), SymbolKind::File, 50, 20.0)));
        });
    }
    group.finish();
}

fn bench_routed_completion(c: &mut Criterion) {
    let mut group = c.benchmark_group("routed_completion");
    let index = generate_index(5_000);
    let router = CompletionRouter::from_config(Arc::clone(&index), &TriggerfishConfig::default());

    for line in ["see @hand", "extends .Utils", "call #get_co", "just typed @"] {
        let cursor = line.chars().count();
        group.bench_with_input(BenchmarkId::from_parameter(line), line, |b, line| {
            b.iter(|| black_box(router.complete(black_box(line), cursor)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_pattern_score,
    bench_fuzzy_search,
    bench_routed_completion,
);

criterion_main!(benches);
