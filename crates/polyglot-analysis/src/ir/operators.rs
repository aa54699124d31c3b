//! Operator vocabulary.
//!
//! Variants identify operator *tokens*, never what they compute: `+` is
//! `BinaryOperator::Add` whichever language it came from. What `Add` means is
//! decided per language by the semantics layer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    MatMul,
}

impl BinaryOperator {
    /// Map a C-family token (JavaScript, Java) to its variant.
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Mod,
            "**" => Self::Pow,
            "&" => Self::BitAnd,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "<<" => Self::LShift,
            ">>" => Self::RShift,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::LShift => "<<",
            Self::RShift => ">>",
            Self::MatMul => "@",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::FloorDiv => "FLOOR_DIV",
            Self::Mod => "MOD",
            Self::Pow => "POW",
            Self::BitAnd => "BIT_AND",
            Self::BitOr => "BIT_OR",
            Self::BitXor => "BIT_XOR",
            Self::LShift => "LSHIFT",
            Self::RShift => "RSHIFT",
            Self::MatMul => "MATMUL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOperator {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
    StrictEq,
    StrictNotEq,
}

impl CompareOperator {
    /// Map a C-family token to its variant. `===`/`!==` only occur in
    /// JavaScript sources; Java never produces them.
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "==" => Self::Eq,
            "!=" => Self::NotEq,
            "<" => Self::Lt,
            "<=" => Self::LtE,
            ">" => Self::Gt,
            ">=" => Self::GtE,
            "===" => Self::StrictEq,
            "!==" => Self::StrictNotEq,
            "in" => Self::In,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtE => "<=",
            Self::Gt => ">",
            Self::GtE => ">=",
            Self::Is => "is",
            Self::IsNot => "is not",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::StrictEq => "===",
            Self::StrictNotEq => "!==",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::NotEq => "NE",
            Self::Lt => "LT",
            Self::LtE => "LE",
            Self::Gt => "GT",
            Self::GtE => "GE",
            Self::Is => "IS",
            Self::IsNot => "IS_NOT",
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
            Self::StrictEq => "STRICT_EQ",
            Self::StrictNotEq => "STRICT_NE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Neg,
    Pos,
    Not,
    Invert,
}

impl UnaryOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "-" => Self::Neg,
            "+" => Self::Pos,
            "!" => Self::Not,
            "~" => Self::Invert,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Pos => "+",
            Self::Not => "not",
            Self::Invert => "~",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Neg => "NEG",
            Self::Pos => "POS",
            Self::Not => "NOT",
            Self::Invert => "INVERT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoolOperator {
    And,
    Or,
}

impl BoolOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "&&" | "and" => Some(Self::And),
            "||" | "or" => Some(Self::Or),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Compound assignment: one variant per [`BinaryOperator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AugAssignOperator(BinaryOperator);

impl AugAssignOperator {
    pub const fn new(op: BinaryOperator) -> Self {
        Self(op)
    }

    /// Map `+=`, `<<=`, ... to the compound variant.
    pub fn from_token(token: &str) -> Option<Self> {
        let base = token.strip_suffix('=')?;
        BinaryOperator::from_token(base).map(Self)
    }

    /// The operator applied before the store.
    pub fn binary(&self) -> BinaryOperator {
        self.0
    }

    pub fn symbol(&self) -> String {
        format!("{}=", self.0.symbol())
    }

    pub fn name(&self) -> String {
        format!("{}_ASSIGN", self.0.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_family_tokens() {
        assert_eq!(BinaryOperator::from_token("%"), Some(BinaryOperator::Mod));
        assert_eq!(BinaryOperator::from_token(">>>"), None);
        assert_eq!(CompareOperator::from_token("==="), Some(CompareOperator::StrictEq));
        assert_eq!(CompareOperator::from_token("instanceof"), None);
        assert_eq!(UnaryOperator::from_token("!"), Some(UnaryOperator::Not));
        assert_eq!(BoolOperator::from_token("??"), None);
    }

    #[test]
    fn aug_assign_mirrors_binary() {
        let op = AugAssignOperator::from_token("**=").unwrap();
        assert_eq!(op.binary(), BinaryOperator::Pow);
        assert_eq!(op.symbol(), "**=");
        assert_eq!(op.name(), "POW_ASSIGN");
        assert!(AugAssignOperator::from_token(">>>=").is_none());
        assert!(AugAssignOperator::from_token("+").is_none());
    }
}
