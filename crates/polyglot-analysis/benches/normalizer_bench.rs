//! Normalizer benchmarks: per-language lowering of 100 generated files,
//! cold and cached tree-sitter parses, and constant folding.
//!
//! Run with: cargo bench -p polyglot-analysis --bench normalizer_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use polyglot_analysis::ir::visit::walk_module;
use polyglot_analysis::normalizers::{JavaNormalizer, JavaScriptNormalizer};
use polyglot_analysis::semantics::fold_expr;
use polyglot_analysis::{normalizer_for, Language, Normalizer};

fn sample_source(lang: Language, idx: usize) -> (String, String) {
    match lang {
        Language::Python => (
            format!("file_{idx}.py"),
            format!(
                r#"def process_{idx}(data: list) -> dict:
    result = {{}}
    for item in data:
        if not item:
            continue
        result[item] = len(item) * {idx} if item else -{idx} % 3
    return result

class Handler_{idx}:
    def __init__(self, config):
        self.config = config

    async def handle(self, request):
        return await self.process(request)
"#
            ),
        ),
        Language::JavaScript => (
            format!("file_{idx}.js"),
            format!(
                r#"function compute_{idx}(a, b) {{
    let total = 0;
    for (let i = 0; i < a.length; i++) {{
        if (a[i] === b) continue;
        total += a[i] > {idx} ? a[i] : "{idx}" + 1;
    }}
    return total;
}}
module.exports = {{ compute_{idx} }};
"#
            ),
        ),
        Language::Java => (
            format!("File_{idx}.java"),
            format!(
                r#"public class File_{idx} {{
    private int value = {idx};
    public int getValue() {{ return value; }}
    public int sum(int[] xs) {{
        int total = 0;
        for (int i = 0; i < xs.length; i++) {{
            total += xs[i] % 2 == 0 ? xs[i] : -{idx};
        }}
        return total;
    }}
}}
"#
            ),
        ),
    }
}

fn normalize_per_language(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_per_language");
    group.sample_size(20);

    for lang in Language::ALL {
        let normalizer = normalizer_for(lang);
        let sources: Vec<(String, String)> = (0..100).map(|i| sample_source(lang, i)).collect();

        group.bench_with_input(BenchmarkId::new("normalize_100", lang.tag()), &sources, |b, sources| {
            b.iter(|| {
                for (name, source) in sources {
                    let _ = normalizer.normalize(source, name);
                }
            });
        });
    }

    group.finish();
}

fn parse_cache_effectiveness(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_cache");
    group.sample_size(20);

    let (js_name, js_source) = sample_source(Language::JavaScript, 0);
    let (java_name, java_source) = sample_source(Language::Java, 0);

    group.bench_function("javascript_uncached", |b| {
        let js = JavaScriptNormalizer::with_cache(None);
        b.iter(|| js.normalize(&js_source, &js_name).unwrap());
    });
    group.bench_function("javascript_cached", |b| {
        let js = JavaScriptNormalizer::new();
        js.normalize(&js_source, &js_name).unwrap();
        b.iter(|| js.normalize(&js_source, &js_name).unwrap());
    });

    group.bench_function("java_uncached", |b| {
        let java = JavaNormalizer::with_cache(None);
        b.iter(|| java.normalize(&java_source, &java_name).unwrap());
    });
    group.bench_function("java_cached", |b| {
        let java = JavaNormalizer::new();
        java.normalize(&java_source, &java_name).unwrap();
        b.iter(|| java.normalize(&java_source, &java_name).unwrap());
    });

    group.finish();
}

fn fold_every_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("fold");
    group.sample_size(20);

    for lang in Language::ALL {
        let (name, source) = sample_source(lang, 7);
        let module = normalizer_for(lang).normalize(&source, &name).unwrap();

        group.bench_with_input(BenchmarkId::new("fold_expr", lang.tag()), &module, |b, module| {
            b.iter(|| {
                let mut folded = 0usize;
                walk_module(module, &mut |node| {
                    if matches!(fold_expr(node), Ok(Some(_))) {
                        folded += 1;
                    }
                });
                folded
            });
        });
    }

    group.finish();
}

criterion_group!(benches, normalize_per_language, parse_cache_effectiveness, fold_every_node);
criterion_main!(benches);
