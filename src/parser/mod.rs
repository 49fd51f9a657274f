// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Driving parser: pulls characters from a [CharReader], lets the grammar automaton decide
//! which tokens are expected at each token boundary, and scans only those tokens (plus the
//! skipped patterns) with a [LexemeEngine].
//!
//! Several matches may end at different positions, or several patterns may match the same
//! text. The parser tries them from the longest to the shortest and backtracks when the
//! grammar rejects the continuation.


use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::io::Read;
use crate::{StateId, TokenId};
use crate::char_reader::{CharReader, CharReaderStatus};
use crate::grammar::CompiledGrammar;
use crate::lexeme::{LexemeEngine, TokenMatch};
use crate::log::{BufLog, LogReader, Logger};
use crate::recognizer::Recognizer;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseResult {
    /// The whole input matches a start rule. `tokens` are the matched tokens, without the
    /// skipped text.
    Accepted { tokens: Vec<TokenMatch> },
    /// `pos` is the furthest token boundary where no continuation was possible.
    Rejected { pos: usize },
}

impl ParseResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ParseResult::Accepted { .. })
    }

    pub fn get_tokens(&self) -> Option<&[TokenMatch]> {
        match self {
            ParseResult::Accepted { tokens } => Some(tokens),
            ParseResult::Rejected { .. } => None,
        }
    }
}

impl Display for ParseResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseResult::Accepted { tokens } => write!(f, "accepted, {} token(s)", tokens.len()),
            ParseResult::Rejected { pos } => write!(f, "rejected at {pos}"),
        }
    }
}

/// Parser of a [CompiledGrammar]. Each call to [Parser::parse] is an independent session.
#[derive(Debug)]
pub struct Parser<'g> {
    compiled: &'g CompiledGrammar,
    log: BufLog,
}

impl<'g> Parser<'g> {
    pub fn new(compiled: &'g CompiledGrammar) -> Self {
        Parser { compiled, log: BufLog::new() }
    }

    pub fn parse_str(&mut self, text: &str) -> ParseResult {
        self.parse(CharReader::new(text.as_bytes()))
    }

    pub fn parse<R: Read>(&mut self, reader: CharReader<R>) -> ParseResult {
        const VERBOSE: bool = false;
        self.log.clear();
        let Some(initial) = self.compiled.initial_state() else {
            self.log.add_error("the grammar automaton has no initial state");
            return ParseResult::Rejected { pos: 0 };
        };
        let mut session = Session::new(self.compiled, reader);
        let result = session.run(initial);
        if let CharReaderStatus::Error(e) = session.reader.get_status() {
            self.log.add_error(format!("input error after {} character(s): {e}", session.buffer.len()));
        }
        self.log.add_note(format!(
            "{} token boundary(ies) explored, {} character(s) read",
            session.explored, session.buffer.len()));
        if VERBOSE { println!("{result}\n{}", self.log); }
        result
    }
}

impl LogReader for Parser<'_> {
    type Item = BufLog;

    fn get_log(&self) -> &Self::Item {
        &self.log
    }

    fn give_log(self) -> Self::Item {
        self.log
    }
}

// ---------------------------------------------------------------------------------------------

/// Candidates at a token boundary, and the next one to try
struct Frame {
    pos: usize,
    state: StateId,
    candidates: Vec<TokenMatch>,
    next: usize,
}

struct Session<'g, R> {
    compiled: &'g CompiledGrammar,
    reader: CharReader<R>,
    /// characters read so far, kept for backtracking
    buffer: Vec<char>,
    engine: LexemeEngine<'g>,
    /// (position, grammar state) pairs known to fail
    failed: BTreeSet<(usize, StateId)>,
    furthest: usize,
    explored: usize,
}

impl<'g, R: Read> Session<'g, R> {
    fn new(compiled: &'g CompiledGrammar, reader: CharReader<R>) -> Self {
        Session {
            compiled,
            reader,
            buffer: Vec::new(),
            engine: LexemeEngine::new(compiled.get_lexicon()),
            failed: BTreeSet::new(),
            furthest: 0,
            explored: 0,
        }
    }

    fn char_at(&mut self, pos: usize) -> Option<char> {
        while self.buffer.len() <= pos {
            let c = self.reader.get_char()?;
            self.buffer.push(c);
        }
        Some(self.buffer[pos])
    }

    /// Checks if the input ends at `pos`, without error.
    fn ends_at(&mut self, pos: usize) -> bool {
        self.char_at(pos).is_none() && !matches!(self.reader.get_status(), CharReaderStatus::Error(_))
    }

    /// Scans the tokens expected in `state` and the skipped patterns from `pos`, and returns
    /// the matches from the longest to the shortest, one per (token, end).
    fn candidates(&mut self, pos: usize, state: StateId) -> Vec<TokenMatch> {
        const VERBOSE: bool = false;
        let compiled = self.compiled;
        self.explored += 1;
        self.engine.begin(pos);
        for token in compiled.expected_tokens(state) {
            self.engine.begin_capture_if_not_exists(token);
        }
        for token in compiled.get_lexicon().skip_tokens() {
            self.engine.begin_capture_if_not_exists(token);
        }
        let mut p = pos;
        while self.engine.has_active() {
            let Some(c) = self.char_at(p) else { break };
            self.engine.scan(c);
            p += 1;
        }
        let mut matches = self.engine.finalize(true);
        matches.dedup_by_key(|m| (m.end, m.token));
        if VERBOSE { println!("{pos} (state {state}): {}", matches.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", ")); }
        matches
    }

    fn fail(&mut self, pos: usize, state: StateId) {
        self.failed.insert((pos, state));
        self.furthest = self.furthest.max(pos);
    }

    /// Depth-first search of a sequence of matches covering the whole input.
    fn run(&mut self, initial: StateId) -> ParseResult {
        let compiled = self.compiled;
        let lexicon = compiled.get_lexicon();
        if self.ends_at(0) {
            if compiled.is_accepting(initial) {
                return ParseResult::Accepted { tokens: vec![] };
            }
            self.fail(0, initial);
            return ParseResult::Rejected { pos: 0 };
        }
        let candidates = self.candidates(0, initial);
        let mut stack = vec![Frame { pos: 0, state: initial, candidates, next: 0 }];
        // match leading to each frame but the first
        let mut path = Vec::<TokenMatch>::new();
        while let Some(frame) = stack.last_mut() {
            let Some(&m) = frame.candidates.get(frame.next) else {
                let (pos, state) = (frame.pos, frame.state);
                self.fail(pos, state);
                stack.pop();
                path.pop();
                continue;
            };
            frame.next += 1;
            let state = frame.state;
            let next_state = if lexicon.is_skip(m.token) {
                state
            } else {
                match Recognizer::<TokenId>::with_state(compiled.get_dfa(), state).recognize(m.token) {
                    Ok(s) => s.id(),
                    Err(_) => continue,
                }
            };
            if self.failed.contains(&(m.end, next_state)) {
                continue;
            }
            if self.char_at(m.end).is_none() {
                if self.ends_at(m.end) && compiled.is_accepting(next_state) {
                    path.push(m);
                    let tokens = path.into_iter().filter(|m| !lexicon.is_skip(m.token)).collect();
                    return ParseResult::Accepted { tokens };
                }
                self.fail(m.end, next_state);
                continue;
            }
            let candidates = self.candidates(m.end, next_state);
            path.push(m);
            stack.push(Frame { pos: m.end, state: next_state, candidates, next: 0 });
        }
        ParseResult::Rejected { pos: self.furthest }
    }
}
