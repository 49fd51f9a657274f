// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

use std::collections::BTreeMap;
use crate::{StateId, TokenId, VarId};
use crate::build::{BuildError, BuildErrorKind};
use crate::dfa::{Dfa, DfaBuilder, StartMode};
use crate::expr::{check_tree, literal_tree, rule_refs, ExprTree, RuleSource};
use crate::log::{BufLog, LogReader, Logger};
use crate::nfa::{Nfa, NfaBuilder};
use crate::options::Options;

/// What happens to the text matched by a pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatternKind {
    /// The match is a token given to the grammar.
    Token,
    /// The match is consumed between tokens (white space, comments).
    Skip,
}

/// Lexical pattern. The root of its tree is the production `id`.
#[derive(Clone, Debug)]
pub struct Pattern {
    pub id: TokenId,
    pub name: String,
    pub kind: PatternKind,
    pub tree: ExprTree,
}

/// Set of lexical patterns, and of the fragments they can reference.
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    patterns: BTreeMap<TokenId, Pattern>,
    fragments: BTreeMap<VarId, ExprTree>,
}

impl Lexicon {
    pub fn new() -> Self {
        Lexicon::default()
    }

    /// Adds a pattern. Its tree must have the production root `id`.
    pub fn add_pattern<T: Into<String>>(&mut self, id: TokenId, name: T, kind: PatternKind, tree: ExprTree) {
        self.patterns.insert(id, Pattern { id, name: name.into(), kind, tree });
    }

    pub fn add_token<T: Into<String>>(&mut self, id: TokenId, name: T, tree: ExprTree) {
        self.add_pattern(id, name, PatternKind::Token, tree);
    }

    pub fn add_skip<T: Into<String>>(&mut self, id: TokenId, name: T, tree: ExprTree) {
        self.add_pattern(id, name, PatternKind::Skip, tree);
    }

    /// Adds a token matching the literal `text`, named after the text.
    pub fn add_literal(&mut self, id: TokenId, text: &str) {
        self.add_token(id, text, literal_tree(id, text));
    }

    /// Adds a fragment, which patterns can reference with [ExprNode::RuleRef](crate::expr::ExprNode::RuleRef)
    /// but which is never matched on its own.
    pub fn add_fragment(&mut self, var: VarId, tree: ExprTree) {
        self.fragments.insert(var, tree);
    }

    pub fn get_pattern(&self, id: TokenId) -> Option<&Pattern> {
        self.patterns.get(&id)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.values()
    }

    pub fn num_patterns(&self) -> usize {
        self.patterns.len()
    }

    /// Verifies the pattern and fragment trees, and the fragment references.
    pub fn check(&self) -> Result<(), BuildError> {
        let mut log = BufLog::new();
        let mut kind = None;
        for pattern in self.patterns.values() {
            match check_tree(&pattern.tree) {
                Ok(def) if def != pattern.id => {
                    log.add_error(format!("pattern '{}' ({}) has the root of definition {def}", pattern.name, pattern.id));
                    kind.get_or_insert(BuildErrorKind::MalformedExpression);
                }
                Ok(_) => {}
                Err(msg) => {
                    log.add_error(format!("pattern '{}': {msg}", pattern.name));
                    kind.get_or_insert(BuildErrorKind::MalformedExpression);
                }
            }
        }
        for (var, tree) in &self.fragments {
            if let Err(msg) = check_tree(tree) {
                log.add_error(format!("fragment {var}: {msg}"));
                kind.get_or_insert(BuildErrorKind::MalformedExpression);
            }
        }
        let trees = self.patterns.values().map(|p| (p.name.clone(), &p.tree))
            .chain(self.fragments.iter().map(|(v, t)| (format!("fragment {v}"), t)));
        for (name, tree) in trees {
            for var in rule_refs(tree) {
                if !self.fragments.contains_key(&var) {
                    log.add_error(format!("{name} references the undefined fragment {var}"));
                    kind.get_or_insert(BuildErrorKind::UndefinedReference);
                }
            }
        }
        match kind {
            Some(kind) => Err(BuildError::new(kind, log)),
            None => Ok(()),
        }
    }

    /// Compiles the patterns into one automaton with an initial state per pattern.
    pub fn compile(&self, options: &Options) -> Result<(CompiledLexicon, BufLog), BuildError> {
        self.check()?;
        let mut log = BufLog::new();
        let mut nfa_builder = NfaBuilder::new(options);
        for pattern in self.patterns.values() {
            nfa_builder.add_root(&pattern.tree, self, None)
                .map_err(|e| e.with_previous_log(log.clone()))?;
        }
        let (nfa, nfa_log) = nfa_builder.build();
        log.extend(nfa_log);
        let mut dfa_builder = DfaBuilder::new(&nfa, options);
        let dfa = dfa_builder.build(StartMode::Separate)
            .map_err(|e| e.with_previous_log(log.clone()))?;
        log.extend(dfa_builder.give_log());
        let mut starts = BTreeMap::new();
        let mut kinds = BTreeMap::new();
        let mut names = BTreeMap::new();
        for (pattern, &start) in self.patterns.values().zip(dfa.initial_states()) {
            starts.insert(pattern.id, start);
            kinds.insert(pattern.id, pattern.kind);
            names.insert(pattern.id, pattern.name.clone());
        }
        Ok((CompiledLexicon { nfa, dfa, starts, kinds, names }, log))
    }
}

impl RuleSource for Lexicon {
    fn get_rule(&self, var: VarId) -> Option<&ExprTree> {
        self.fragments.get(&var)
    }
}

// ---------------------------------------------------------------------------------------------

/// Automaton of a [Lexicon]: one initial state per pattern, and the completions of a state
/// reached from the initial state of a pattern only refer to that pattern.
#[derive(Clone, Debug, Default)]
pub struct CompiledLexicon {
    nfa: Nfa,
    dfa: Dfa,
    starts: BTreeMap<TokenId, StateId>,
    kinds: BTreeMap<TokenId, PatternKind>,
    names: BTreeMap<TokenId, String>,
}

impl CompiledLexicon {
    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }

    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    pub fn start_state(&self, token: TokenId) -> Option<StateId> {
        self.starts.get(&token).copied()
    }

    pub fn kind(&self, token: TokenId) -> Option<PatternKind> {
        self.kinds.get(&token).copied()
    }

    pub fn is_skip(&self, token: TokenId) -> bool {
        self.kind(token) == Some(PatternKind::Skip)
    }

    pub fn name(&self, token: TokenId) -> Option<&str> {
        self.names.get(&token).map(|s| s.as_str())
    }

    pub fn tokens(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.starts.keys().copied()
    }

    pub fn skip_tokens(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.kinds.iter().filter(|(_, k)| **k == PatternKind::Skip).map(|(t, _)| *t)
    }
}
