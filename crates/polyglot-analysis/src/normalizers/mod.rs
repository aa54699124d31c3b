//! Normalizers: native parse trees in, unified IR out.
//!
//! One implementation per input language. Dispatch inside each is a `match`
//! on the native node kind; a kind without an arm fails with
//! `NormalizeError::UnsupportedConstruct` naming it. Nothing is skipped.

pub mod grammar;
pub mod java;
pub mod javascript;
pub mod python;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use polyglot_core::config::PolyglotConfig;
use polyglot_core::errors::{NormalizeError, NormalizeResult, ParseError};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::ir::{Module, Node};
use crate::language::Language;
use crate::parsers::ParseCache;

pub use grammar::GrammarFrontend;
pub use java::JavaNormalizer;
pub use javascript::JavaScriptNormalizer;
pub use python::PythonNormalizer;

/// Zero, one or many IR nodes produced from one native node.
pub type Lowered = SmallVec<[Node; 1]>;

/// Whole-unit normalization for one language.
pub trait Normalizer: Send + Sync {
    fn language(&self) -> Language;

    /// Parse `source` with the language's native parser and lower the result.
    fn normalize(&self, source: &str, filename: &str) -> NormalizeResult<Module>;
}

/// Recursive lowering of one native node of type `N`.
pub trait NodeNormalizer<N> {
    fn normalize_node(&mut self, node: N) -> NormalizeResult<Lowered>;
}

/// Get the normalizer for a given language.
pub fn normalizer_for(language: Language) -> Box<dyn Normalizer> {
    match language {
        Language::Python => Box::new(PythonNormalizer::new()),
        Language::JavaScript => Box::new(JavaScriptNormalizer::new()),
        Language::Java => Box::new(JavaNormalizer::new()),
    }
}

fn configured_normalizer(language: Language, config: &PolyglotConfig) -> Arc<dyn Normalizer> {
    let cache = config
        .normalizer
        .effective_cache_enabled()
        .then(|| ParseCache::new(config.normalizer.effective_cache_capacity()));
    match language {
        Language::Python => Arc::new(PythonNormalizer::new()),
        Language::JavaScript => Arc::new(JavaScriptNormalizer::with_cache(cache)),
        Language::Java => Arc::new(JavaNormalizer::with_cache(cache)),
    }
}

/// The set of normalizers enabled by configuration.
pub struct NormalizerRegistry {
    normalizers: FxHashMap<Language, Arc<dyn Normalizer>>,
    max_source_bytes: u64,
}

impl NormalizerRegistry {
    pub fn from_config(config: &PolyglotConfig) -> Self {
        let normalizers = Language::ALL
            .into_iter()
            .filter(|l| config.normalizer.is_language_enabled(l.tag()))
            .map(|l| (l, configured_normalizer(l, config)))
            .collect::<FxHashMap<_, _>>();
        tracing::debug!(
            languages = normalizers.len(),
            cache_enabled = config.normalizer.effective_cache_enabled(),
            "normalizer registry built"
        );
        Self {
            normalizers,
            max_source_bytes: config.normalizer.effective_max_source_bytes(),
        }
    }

    /// Enabled languages, in declaration order.
    pub fn languages(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|l| self.normalizers.contains_key(l))
            .collect()
    }

    pub fn get(&self, language: Language) -> NormalizeResult<Arc<dyn Normalizer>> {
        self.normalizers
            .get(&language)
            .cloned()
            .ok_or_else(|| NormalizeError::LanguageDisabled {
                language: language.tag().to_string(),
            })
    }

    pub fn normalize(&self, language: Language, source: &str, filename: &str) -> NormalizeResult<Module> {
        let size = source.len() as u64;
        if size > self.max_source_bytes {
            return Err(ParseError::SourceTooLarge {
                path: PathBuf::from(filename),
                size,
                limit: self.max_source_bytes,
            }
            .into());
        }
        self.get(language)?.normalize(source, filename)
    }

    /// Detect the language from the file extension, read and normalize.
    pub fn normalize_path(&self, path: &Path) -> NormalizeResult<Module> {
        let language = Language::from_extension(path.extension().and_then(|e| e.to_str())).ok_or_else(|| {
            NormalizeError::UnknownLanguage {
                path: path.display().to_string(),
            }
        })?;
        let source = std::fs::read_to_string(path).map_err(|e| NormalizeError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.normalize(language, &source, &path.to_string_lossy())
    }

    /// Normalize many files in parallel. Results keep the input order.
    pub fn normalize_paths(&self, paths: &[PathBuf]) -> Vec<(PathBuf, NormalizeResult<Module>)> {
        paths
            .par_iter()
            .map(|path| {
                let result = self.normalize_path(path);
                if let Err(ref e) = result {
                    tracing::warn!(error = %e, path = %path.display(), "normalization failed");
                }
                (path.clone(), result)
            })
            .collect()
    }
}

impl Default for NormalizerRegistry {
    fn default() -> Self {
        Self::from_config(&PolyglotConfig::default())
    }
}
