// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Incremental scanning of the lexical patterns expected at a token boundary.
//!
//! A scan session starts at a position with [LexemeEngine::begin]; the caller then starts one
//! lexeme per pattern it's interested in and feeds the characters one at a time. Every time a
//! lexeme reaches a completion of its pattern, the capture of that (pattern, production) is
//! extended to the current position, so at the end of the session each capture holds the
//! longest match of its production.

pub(crate) mod tests;
pub mod lexicon;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use crate::{LocalId, StateId, TokenId};
use crate::pool::{Pool, PoolStats, Reset};
use lexicon::CompiledLexicon;

/// Thread of the lexicon automaton for one pattern
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lexeme {
    pub token: TokenId,
    pub state: StateId,
    pub start: usize,
}

impl Reset for Lexeme {
    fn reset(&mut self) {
        *self = Lexeme::default();
    }
}

/// Longest match found so far for one production of a pattern. `end` is exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capture {
    pub token: TokenId,
    pub local: LocalId,
    pub start: usize,
    pub end: usize,
}

/// Finalized match of a pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenMatch {
    pub token: TokenId,
    pub local: LocalId,
    pub start: usize,
    pub end: usize,
}

impl TokenMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

impl From<&Capture> for TokenMatch {
    fn from(c: &Capture) -> Self {
        TokenMatch { token: c.token, local: c.local, start: c.start, end: c.end }
    }
}

impl Display for TokenMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, ":{}.{} [{}..{}]", self.token, self.local, self.start, self.end)
    }
}

#[derive(Debug)]
pub struct LexemeEngine<'l> {
    lexicon: &'l CompiledLexicon,
    active: Vec<Lexeme>,
    pool: Pool<Lexeme>,
    /// patterns started in the current session
    started: BTreeSet<TokenId>,
    captures: BTreeMap<(TokenId, LocalId), Capture>,
    start: usize,
    pos: usize,
}

impl<'l> LexemeEngine<'l> {
    pub fn new(lexicon: &'l CompiledLexicon) -> Self {
        LexemeEngine {
            lexicon,
            active: Vec::new(),
            pool: Pool::new(),
            started: BTreeSet::new(),
            captures: BTreeMap::new(),
            start: 0,
            pos: 0,
        }
    }

    pub fn get_lexicon(&self) -> &'l CompiledLexicon {
        self.lexicon
    }

    /// Starts a new session at `pos`. The lexemes and the captures of the previous session
    /// are discarded.
    pub fn begin(&mut self, pos: usize) {
        for lexeme in self.active.drain(..) {
            self.pool.release(lexeme);
        }
        self.started.clear();
        self.captures.clear();
        self.start = pos;
        self.pos = pos;
    }

    /// Starts a lexeme for `token`, unless the pattern was already started in this session
    /// or is unknown. Returns `true` if a lexeme was started.
    ///
    /// Lexemes must be started before the first character of the session is scanned.
    pub fn begin_capture_if_not_exists(&mut self, token: TokenId) -> bool {
        if self.pos != self.start || self.started.contains(&token) {
            return false;
        }
        let Some(state) = self.lexicon.start_state(token) else {
            return false;
        };
        self.started.insert(token);
        let mut lexeme = self.pool.acquire();
        lexeme.token = token;
        lexeme.state = state;
        lexeme.start = self.start;
        self.active.push(lexeme);
        true
    }

    /// Advances all the active lexemes on `c`. The lexemes that can't accept it are dropped,
    /// the others update their captures. Returns the number of lexemes still active.
    pub fn scan(&mut self, c: char) -> usize {
        const VERBOSE: bool = false;
        let lexicon = self.lexicon;
        let dfa = lexicon.dfa();
        self.pos += 1;
        let mut i = 0;
        while i < self.active.len() {
            let lexeme = &mut self.active[i];
            match dfa.next_state(lexeme.state, c) {
                Some(next) => {
                    lexeme.state = next;
                    let token = lexeme.token;
                    for comp in dfa.completions(next).iter().filter(|comp| comp.def == token) {
                        let end = self.pos;
                        self.captures.entry((token, comp.local))
                            .and_modify(|capture| capture.end = capture.end.max(end))
                            .or_insert(Capture { token, local: comp.local, start: self.start, end });
                    }
                    i += 1;
                }
                None => {
                    let dead = self.active.swap_remove(i);
                    if VERBOSE { println!("{c:?} at {}: lexeme :{} ends", self.pos - 1, dead.token); }
                    self.pool.release(dead);
                }
            }
        }
        self.active.len()
    }

    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn num_active(&self) -> usize {
        self.active.len()
    }

    pub fn active_tokens(&self) -> BTreeSet<TokenId> {
        self.active.iter().map(|l| l.token).collect()
    }

    /// Position of the next character to scan
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn session_start(&self) -> usize {
        self.start
    }

    pub fn captures(&self) -> impl Iterator<Item = &Capture> {
        self.captures.values()
    }

    pub fn capture(&self, token: TokenId, local: LocalId) -> Option<&Capture> {
        self.captures.get(&(token, local))
    }

    /// Returns the matches that can't grow anymore: the captures whose pattern has no active
    /// lexeme, or all the captures if `at_end` is set because the input is exhausted.
    ///
    /// The matches are sorted from the longest to the shortest, then by pattern.
    pub fn finalize(&self, at_end: bool) -> Vec<TokenMatch> {
        let active = if at_end { BTreeSet::new() } else { self.active_tokens() };
        let mut matches = self.captures.values()
            .filter(|c| !active.contains(&c.token) && c.end > c.start)
            .map(TokenMatch::from)
            .collect::<Vec<_>>();
        matches.sort_by(|a, b| b.end.cmp(&a.end).then(a.token.cmp(&b.token)).then(a.local.cmp(&b.local)));
        matches
    }

    pub fn get_pool_stats(&self) -> PoolStats {
        self.pool.get_stats()
    }
}
