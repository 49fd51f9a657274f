// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Grammar compiler and incremental recognition engine.
//!
//! Build time: expression trees ([expr]) are turned into a Thompson NFA ([nfa]), then into a
//! DFA whose states may carry several completions ([dfa]). The [grammar] module compiles a
//! whole grammar and its lexicon that way.
//!
//! Run time: the [parser] pulls characters from a [CharReader](char_reader::CharReader),
//! tracks the candidate tokens in a [LexemeEngine](lexeme::LexemeEngine) and feeds the
//! recognized tokens to a [Recognizer](recognizer::Recognizer) over the grammar automaton.

pub mod macros;
pub mod log;
pub mod build;
pub mod options;
pub mod char_reader;
pub mod segments;
pub mod partition;
pub mod symbol;
pub mod expr;
pub mod pool;
pub mod nfa;
pub mod dfa;
pub mod grammar;
pub mod recognizer;
pub mod lexeme;
pub mod parser;

// package name & version
pub const GRAMSCAN_PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const GRAMSCAN_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------------------------
// Shared types

/// ID of a lexical pattern (token)
pub type TokenId = u16;
/// ID of a grammar rule (nonterminal)
pub type VarId = u16;
/// ID of a definition, as found in completions: a [VarId] in the grammar automaton, a
/// [TokenId] in the lexicon automaton.
pub type DefId = u16;
/// Index of a production within its definition (alternative of the top-level `|`).
pub type LocalId = u16;
/// ID of a DFA state
pub type StateId = usize;
/// ID of an NFA state
pub type NfaStateId = usize;

// ---------------------------------------------------------------------------------------------
// General helper functions

pub trait CollectJoin {
    fn join(&mut self, separator: &str) -> String
        where Self: Iterator,
              <Self as Iterator>::Item: ToString
    {
        self.map(|x| x.to_string()).collect::<Vec<_>>().join(separator)
    }

    fn to_vec(self) -> Vec<<Self as Iterator>::Item>
        where Self: Iterator + Sized
    {
        self.collect::<Vec<_>>()
    }
}

impl<I: Iterator> CollectJoin for I {}

/// Escapes a character for display in automaton dumps: the UTF-8 bounds get a name, the
/// control characters use their escape sequence.
pub fn escape_char(c: char) -> String {
    match c {
              '\u{0}' => "MIN".to_string(),
           '\u{d7ff}' => "LOW_MAX".to_string(),
           '\u{e000}' => "HIGH_MIN".to_string(),
         '\u{10ffff}' => "MAX".to_string(),
        '\u{1}'..='\u{1f}' | '\u{7f}' | '\'' | '\\' => c.escape_default().to_string(),
        _ => c.to_string(),
    }
}

pub fn escape_string(s: &str) -> String {
    s.chars().map(escape_char).collect()
}
