//! Parse-cache behavior seen through the grammar-shaped normalizers.

use std::sync::Arc;

use polyglot_analysis::ir::visit::find_all;
use polyglot_analysis::ir::{Literal, NodeKind};
use polyglot_analysis::normalizers::{JavaNormalizer, JavaScriptNormalizer};
use polyglot_analysis::parsers::ParseCache;
use polyglot_analysis::Normalizer;

#[test]
fn same_source_parses_once() {
    let js = JavaScriptNormalizer::with_cache(Some(ParseCache::new(16)));
    let source = "const total = price * qty;";
    let first = js.normalize(source, "a.js").unwrap();
    let second = js.normalize(source, "a.js").unwrap();
    assert_eq!(js.frontend().parse_count(), 1);
    assert_eq!(first, second);

    let cache = js.frontend().cache().unwrap();
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.misses(), 1);
}

#[test]
fn one_character_difference_gets_its_own_tree() {
    let java = JavaNormalizer::with_cache(Some(ParseCache::new(16)));
    let a = java.normalize("class T { int x = 1; }", "T.java").unwrap();
    let b = java.normalize("class T { int x = 2; }", "T.java").unwrap();
    assert_eq!(java.frontend().parse_count(), 2);

    let literal = |m: &polyglot_analysis::Module| {
        find_all(m, |n| matches!(n.kind, NodeKind::Constant { .. }))
            .into_iter()
            .filter_map(|n| n.as_literal().cloned())
            .collect::<Vec<_>>()
    };
    assert_eq!(literal(&a), [Literal::Int(1)]);
    assert_eq!(literal(&b), [Literal::Int(2)]);

    // Re-normalizing either text is served from its own entry.
    let a_again = java.normalize("class T { int x = 1; }", "T.java").unwrap();
    assert_eq!(java.frontend().parse_count(), 2);
    assert_eq!(literal(&a_again), [Literal::Int(1)]);
}

#[test]
fn cached_tree_is_shared() {
    let cache = ParseCache::new(4);
    let parse = || polyglot_analysis::parsers::parse_tree(
        polyglot_analysis::Language::JavaScript,
        "let x = 1;",
        std::path::Path::new("x.js"),
    );
    let (first, hit) = cache.get_or_parse("let x = 1;", parse).unwrap();
    assert!(!hit);
    let (second, hit) = cache.get_or_parse("let x = 1;", parse).unwrap();
    assert!(hit);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn without_a_cache_every_call_parses() {
    let js = JavaScriptNormalizer::with_cache(None);
    for _ in 0..3 {
        js.normalize("f();", "f.js").unwrap();
    }
    assert_eq!(js.frontend().parse_count(), 3);
    assert!(js.frontend().cache().is_none());
}

#[test]
fn filename_does_not_leak_between_cache_hits() {
    let js = JavaScriptNormalizer::new();
    let a = js.normalize("f();", "a.js").unwrap();
    let b = js.normalize("f();", "b.js").unwrap();
    assert_eq!(js.frontend().parse_count(), 1);
    assert_eq!(&*a.filename, "a.js");
    assert_eq!(&*b.filename, "b.js");
    assert_eq!(
        b.body[0].loc.as_ref().and_then(|l| l.filename.as_deref()),
        Some("b.js")
    );
}

#[test]
fn parallel_normalization_shares_one_cache() {
    use rayon::prelude::*;
    let js = JavaScriptNormalizer::new();
    let sources: Vec<String> = (0..8).map(|i| format!("let v{i} = {i};")).collect();
    let modules: Vec<_> = sources
        .par_iter()
        .chain(sources.par_iter())
        .map(|s| js.normalize(s, "p.js").unwrap())
        .collect();
    assert_eq!(modules.len(), 16);
    for (i, module) in modules.iter().take(8).enumerate() {
        let NodeKind::Assign { value, .. } = &module.body[0].kind else {
            panic!("{:?}", module.body[0].kind)
        };
        assert_eq!(value.as_literal(), Some(&Literal::Int(i as i64)));
    }
    assert!(js.frontend().parse_count() >= 8);
}

#[test]
fn oldest_entry_is_evicted_even_after_a_hit() {
    let js = JavaScriptNormalizer::with_cache(Some(ParseCache::new(2)));
    let (a, b, c) = ("let a = 1;", "let b = 2;", "let c = 3;");
    js.normalize(a, "a.js").unwrap();
    js.normalize(b, "b.js").unwrap();
    js.normalize(a, "a.js").unwrap();
    assert_eq!(js.frontend().parse_count(), 2);

    // Full: c pushes out a, the first added, not b.
    js.normalize(c, "c.js").unwrap();
    assert_eq!(js.frontend().parse_count(), 3);

    js.normalize(b, "b.js").unwrap();
    assert_eq!(js.frontend().parse_count(), 3);
    js.normalize(a, "a.js").unwrap();
    assert_eq!(js.frontend().parse_count(), 4);
}

#[test]
fn default_cache_holds_sixteen_trees() {
    let java = JavaNormalizer::new();
    let sources: Vec<String> = (0..17).map(|i| format!("class C{i} {{}}")).collect();
    for source in &sources[..16] {
        java.normalize(source, "C.java").unwrap();
    }
    let cache = java.frontend().cache().unwrap();
    assert_eq!(cache.capacity(), 16);
    assert_eq!(cache.entry_count(), 16);

    java.normalize(&sources[16], "C.java").unwrap();
    assert_eq!(cache.entry_count(), 16);
    assert!(!cache.contains(&sources[0]));
    assert!(sources[1..].iter().all(|s| cache.contains(s)));
    assert_eq!(java.frontend().parse_count(), 17);
}
