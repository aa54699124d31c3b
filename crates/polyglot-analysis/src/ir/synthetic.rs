//! Reserved names for desugared constructs.
//!
//! Every name is wrapped in angle brackets. None of the supported languages
//! accepts `<` in an identifier, so a synthetic call can never be confused
//! with a call to a user function of the same spelling.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntheticCall {
    /// `(test, if_true, if_false)`
    Ternary,
    /// `(element, target, iter, conditions=[..])`
    ListComp,
    SetComp,
    DictComp,
    GenExp,
    /// An extra `for` clause of a comprehension: `(target, iter, conditions=[..])`.
    Comprehension,
    Await,
    Yield,
    YieldFrom,
    Lambda,
    Spread,
    KwSpread,
    /// `(lower, upper, step)`, `Null` for absent parts.
    Slice,
    Set,
    Format,
    FormatValue,
    TypeOf,
    Void,
    Delete,
    InstanceOf,
    Nullish,
    UnsignedRShift,
    /// Enumerable keys of an object, the iterable of a JavaScript `for-in`.
    Keys,
    Cast,
    NewArray,
    Export,
    Regex,
}

impl SyntheticCall {
    pub const ALL: [SyntheticCall; 27] = [
        Self::Ternary,
        Self::ListComp,
        Self::SetComp,
        Self::DictComp,
        Self::GenExp,
        Self::Comprehension,
        Self::Await,
        Self::Yield,
        Self::YieldFrom,
        Self::Lambda,
        Self::Spread,
        Self::KwSpread,
        Self::Slice,
        Self::Set,
        Self::Format,
        Self::FormatValue,
        Self::TypeOf,
        Self::Void,
        Self::Delete,
        Self::InstanceOf,
        Self::Nullish,
        Self::UnsignedRShift,
        Self::Keys,
        Self::Cast,
        Self::NewArray,
        Self::Export,
        Self::Regex,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ternary => "<ternary>",
            Self::ListComp => "<listcomp>",
            Self::SetComp => "<setcomp>",
            Self::DictComp => "<dictcomp>",
            Self::GenExp => "<genexp>",
            Self::Comprehension => "<comprehension>",
            Self::Await => "<await>",
            Self::Yield => "<yield>",
            Self::YieldFrom => "<yield_from>",
            Self::Lambda => "<lambda>",
            Self::Spread => "<spread>",
            Self::KwSpread => "<kwspread>",
            Self::Slice => "<slice>",
            Self::Set => "<set>",
            Self::Format => "<format>",
            Self::FormatValue => "<format_value>",
            Self::TypeOf => "<typeof>",
            Self::Void => "<void>",
            Self::Delete => "<delete>",
            Self::InstanceOf => "<instanceof>",
            Self::Nullish => "<nullish>",
            Self::UnsignedRShift => "<unsigned_rshift>",
            Self::Keys => "<keys>",
            Self::Cast => "<cast>",
            Self::NewArray => "<new_array>",
            Self::Export => "<export>",
            Self::Regex => "<regex>",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }

    /// Whether a callee name is in the reserved form at all.
    pub fn is_reserved(name: &str) -> bool {
        name.len() > 2 && name.starts_with('<') && name.ends_with('>')
    }
}

impl std::fmt::Display for SyntheticCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
