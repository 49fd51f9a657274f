// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

use std::fmt::{Debug, Display, Formatter};
use crate::segments::Segments;
use crate::TokenId;

/// Label of a non-epsilon transition.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Symbol {
    /// Set of characters (lexicon automaton)
    Chars(Segments),
    /// Terminal of the grammar, identified by the lexical pattern that produces it
    Token(TokenId),
}

impl Symbol {
    pub fn from_char(c: char) -> Self {
        Symbol::Chars(Segments::from_char(c))
    }

    pub fn is_chars(&self) -> bool {
        matches!(self, Symbol::Chars(_))
    }

    pub fn get_token(&self) -> Option<TokenId> {
        if let Symbol::Token(t) = self { Some(*t) } else { None }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Chars(segments) => write!(f, "{segments}"),
            Symbol::Token(t) => write!(f, ":{t}"),
        }
    }
}

/// Value presented to an automaton: a character for the lexicon automaton, a token for the
/// grammar automaton.
pub trait TransValue: Copy + Eq + Debug {
    /// Checks if the value is accepted by a transition labelled `symbol`.
    fn matches(&self, symbol: &Symbol) -> bool;
}

impl TransValue for char {
    #[inline]
    fn matches(&self, symbol: &Symbol) -> bool {
        match symbol {
            Symbol::Chars(segments) => segments.contains_value(*self as u32),
            Symbol::Token(_) => false,
        }
    }
}

impl TransValue for TokenId {
    #[inline]
    fn matches(&self, symbol: &Symbol) -> bool {
        match symbol {
            Symbol::Chars(_) => false,
            Symbol::Token(t) => t == self,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::segments;
    use super::*;

    #[test]
    fn matches() {
        let digits = Symbol::Chars(segments!['0'-'9']);
        let tok = Symbol::Token(3);
        assert!('5'.matches(&digits));
        assert!(!'a'.matches(&digits));
        assert!(!'3'.matches(&tok));
        assert!(3_u16.matches(&tok));
        assert!(!4_u16.matches(&tok));
        assert!(!3_u16.matches(&digits));
        assert_eq!(digits.to_string(), "'0'-'9'");
        assert_eq!(tok.to_string(), ":3");
        assert_eq!(tok.get_token(), Some(3));
        assert!(Symbol::from_char('x').is_chars());
    }
}
