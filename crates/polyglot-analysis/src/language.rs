//! Supported input languages and detection from file extension.

use serde::{Deserialize, Serialize};

/// The languages a normalizer exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Java,
}

/// Shape of the tree a language's native parser produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeShape {
    /// Already-abstract, attribute-based tree. Syntax errors are fatal.
    Ast,
    /// Grammar-literal tree with named fields and anonymous tokens.
    /// Error-tolerant: malformed regions become ERROR nodes.
    Grammar,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::JavaScript, Language::Java];

    /// Detect language from a file extension string.
    pub fn from_extension(ext: Option<&str>) -> Option<Language> {
        match ext? {
            "py" | "pyi" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    /// Parse a `source_language` tag.
    pub fn from_tag(tag: &str) -> Option<Language> {
        match tag {
            "python" => Some(Language::Python),
            "javascript" => Some(Language::JavaScript),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    /// The `source_language` tag carried by every IR node.
    pub fn tag(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
        }
    }

    /// Returns all file extensions associated with this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::Java => &["java"],
        }
    }

    /// Returns the display name of the language.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
        }
    }

    pub fn tree_shape(&self) -> TreeShape {
        match self {
            Language::Python => TreeShape::Ast,
            Language::JavaScript | Language::Java => TreeShape::Grammar,
        }
    }

    /// Get the tree-sitter grammar for a grammar-shaped language.
    pub fn ts_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
            Language::Python => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for language in Language::ALL {
            assert_eq!(Language::from_tag(language.tag()), Some(language));
        }
        assert_eq!(Language::from_tag("Python"), None);
    }

    #[test]
    fn extension_detection() {
        assert_eq!(Language::from_extension(Some("py")), Some(Language::Python));
        assert_eq!(Language::from_extension(Some("mjs")), Some(Language::JavaScript));
        assert_eq!(Language::from_extension(Some("java")), Some(Language::Java));
        assert_eq!(Language::from_extension(Some("ts")), None);
        assert_eq!(Language::from_extension(None), None);
    }

    #[test]
    fn only_grammar_languages_have_tree_sitter_grammars() {
        for language in Language::ALL {
            let shape = language.tree_shape();
            assert_eq!(language.ts_language().is_some(), shape == TreeShape::Grammar);
        }
    }
}
