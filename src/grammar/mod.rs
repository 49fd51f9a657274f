// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Compilation of a grammar and its lexicon into automata.
//!
//! A grammar model gives the start rules, the rules they reference and the lexicon of the
//! tokens. The [GrammarCompiler] builds the grammar automaton over token IDs, whose initial
//! state merges all the start rules, and the lexicon automaton over characters.


use std::collections::{BTreeMap, BTreeSet};
use crate::{CollectJoin, StateId, TokenId, VarId};
use crate::build::{BuildError, BuildErrorKind};
use crate::dfa::{Dfa, DfaBuilder, StartMode};
use crate::expr::{check_tree, rule_refs, ExprNode, ExprTree, RuleSource};
use crate::lexeme::lexicon::{CompiledLexicon, Lexicon};
use crate::log::{BufLog, LogReader, Logger};
use crate::nfa::{Nfa, NfaBuilder};
use crate::options::Options;
use crate::parser::Parser;

/// Source of the rules to compile.
///
/// Once [GrammarModel::ensure_build] has succeeded, every rule reference in the trees must
/// be resolved by [RuleSource::get_rule].
pub trait GrammarModel: RuleSource {
    /// Rules the grammar automaton starts with, and their trees.
    fn get_start_rules(&self) -> Vec<(VarId, &ExprTree)>;

    fn get_lexicon(&self) -> &Lexicon;

    /// Resolves and verifies the rules, if it's not already done.
    fn ensure_build(&mut self) -> Result<(), BuildError>;

    fn get_rule_name(&self, var: VarId) -> Option<&str> {
        let _ = var;
        None
    }
}

#[derive(Clone, Debug)]
pub struct Rule {
    pub var: VarId,
    pub name: String,
    pub tree: ExprTree,
}

/// Grammar made of named rules. The tree of a rule has the production root `var`.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    rules: BTreeMap<VarId, Rule>,
    start_rules: Vec<VarId>,
    lexicon: Lexicon,
    resolved: bool,
}

impl Grammar {
    pub fn new(lexicon: Lexicon) -> Self {
        Grammar { lexicon, ..Grammar::default() }
    }

    pub fn add_rule<T: Into<String>>(&mut self, var: VarId, name: T, tree: ExprTree) {
        self.rules.insert(var, Rule { var, name: name.into(), tree });
        self.resolved = false;
    }

    /// Declares `var` as a start rule. A rule can be declared before it's added.
    pub fn add_start_rule(&mut self, var: VarId) {
        if !self.start_rules.contains(&var) {
            self.start_rules.push(var);
            self.resolved = false;
        }
    }

    pub fn get_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn rule_name(&self, var: VarId) -> Option<&str> {
        self.rules.get(&var).map(|r| r.name.as_str())
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    fn check(&self) -> Result<(), BuildError> {
        let mut log = BufLog::new();
        let mut kind = None;
        for rule in self.rules.values() {
            match check_tree(&rule.tree) {
                Ok(def) if def != rule.var => {
                    log.add_error(format!("rule '{}' ({}) has the root of definition {def}", rule.name, rule.var));
                    kind.get_or_insert(BuildErrorKind::MalformedExpression);
                }
                Ok(_) => {}
                Err(msg) => {
                    log.add_error(format!("rule '{}': {msg}", rule.name));
                    kind.get_or_insert(BuildErrorKind::MalformedExpression);
                }
            }
            let mut stack = rule.tree.get_root().into_iter().collect::<Vec<_>>();
            while let Some(index) = stack.pop() {
                match rule.tree.get(index) {
                    ExprNode::RuleRef(var) if !self.rules.contains_key(var) => {
                        log.add_error(format!("rule '{}' references the undefined rule {var}", rule.name));
                        kind.get_or_insert(BuildErrorKind::UndefinedReference);
                    }
                    ExprNode::Token(token) if self.lexicon.get_pattern(*token).is_none() => {
                        log.add_error(format!("rule '{}' references the undefined token {token}", rule.name));
                        kind.get_or_insert(BuildErrorKind::UndefinedReference);
                    }
                    ExprNode::Char(_) | ExprNode::Range(_) | ExprNode::Class(_) => {
                        log.add_error(format!("rule '{}' has a character terminal; characters belong to the lexicon", rule.name));
                        kind.get_or_insert(BuildErrorKind::MalformedExpression);
                    }
                    _ => {}
                }
                stack.extend(rule.tree.children(index));
            }
        }
        for var in &self.start_rules {
            if !self.rules.contains_key(var) {
                log.add_error(format!("start rule {var} is undefined"));
                kind.get_or_insert(BuildErrorKind::UndefinedReference);
            }
        }
        match kind {
            Some(kind) => Err(BuildError::new(kind, log)),
            None => Ok(()),
        }
    }
}

impl RuleSource for Grammar {
    fn get_rule(&self, var: VarId) -> Option<&ExprTree> {
        self.rules.get(&var).map(|r| &r.tree)
    }
}

impl GrammarModel for Grammar {
    fn get_start_rules(&self) -> Vec<(VarId, &ExprTree)> {
        self.start_rules.iter().filter_map(|&var| self.rules.get(&var).map(|r| (var, &r.tree))).collect()
    }

    fn get_lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn ensure_build(&mut self) -> Result<(), BuildError> {
        if !self.resolved {
            self.check()?;
            self.resolved = true;
        }
        Ok(())
    }

    fn get_rule_name(&self, var: VarId) -> Option<&str> {
        self.rule_name(var)
    }
}

// ---------------------------------------------------------------------------------------------

/// Result of a successful build: the grammar and lexicon automata. Immutable.
#[derive(Clone, Debug)]
pub struct CompiledGrammar {
    nfa: Nfa,
    dfa: Dfa,
    lexicon: CompiledLexicon,
    start_rules: Vec<VarId>,
}

impl CompiledGrammar {
    pub fn get_nfa(&self) -> &Nfa {
        &self.nfa
    }

    pub fn get_dfa(&self) -> &Dfa {
        &self.dfa
    }

    pub fn get_lexicon(&self) -> &CompiledLexicon {
        &self.lexicon
    }

    pub fn get_start_rules(&self) -> &[VarId] {
        &self.start_rules
    }

    pub fn initial_state(&self) -> Option<StateId> {
        self.dfa.initial_state()
    }

    /// Checks if `state` completes one of the start rules.
    pub fn is_accepting(&self, state: StateId) -> bool {
        self.dfa.completions(state).iter().any(|c| self.start_rules.contains(&c.def))
    }

    /// Tokens labelling the transitions that leave `state`.
    pub fn expected_tokens(&self, state: StateId) -> Vec<TokenId> {
        self.dfa.get_state(state)
            .map(|s| s.transitions().iter().filter_map(|t| t.symbol.get_token()).collect())
            .unwrap_or_default()
    }

    pub fn parser(&self) -> Parser<'_> {
        Parser::new(self)
    }
}

/// Builds the automata of a [GrammarModel].
///
/// The compiler keeps the result of the first successful build; a failed build leaves it
/// unbuilt.
#[derive(Debug)]
pub struct GrammarCompiler<G> {
    grammar: G,
    options: Options,
    compiled: Option<CompiledGrammar>,
    log: BufLog,
}

impl<G: GrammarModel> GrammarCompiler<G> {
    pub fn new(grammar: G) -> Self {
        Self::with_options(grammar, Options::default())
    }

    pub fn with_options(grammar: G, options: Options) -> Self {
        GrammarCompiler { grammar, options, compiled: None, log: BufLog::new() }
    }

    pub fn get_grammar(&self) -> &G {
        &self.grammar
    }

    pub fn get_options(&self) -> &Options {
        &self.options
    }

    pub fn is_built(&self) -> bool {
        self.compiled.is_some()
    }

    /// Builds the automata. Does nothing if they're already built.
    pub fn build(&mut self) -> Result<(), BuildError> {
        if self.compiled.is_some() {
            return Ok(());
        }
        let mut log = BufLog::new();
        match self.compile(&mut log) {
            Ok(compiled) => {
                self.compiled = Some(compiled);
                self.log.extend(log);
                Ok(())
            }
            Err(e) => Err(e.with_previous_log(log)),
        }
    }

    /// Builds the automata if they're not built yet.
    pub fn ensure_build(&mut self) -> Result<(), BuildError> {
        if !self.is_built() {
            self.build()?;
        }
        Ok(())
    }

    pub fn get_compiled(&self) -> Option<&CompiledGrammar> {
        self.compiled.as_ref()
    }

    pub fn give_compiled(self) -> Option<CompiledGrammar> {
        self.compiled
    }

    pub fn get_nfa(&self) -> Option<&Nfa> {
        self.compiled.as_ref().map(|c| &c.nfa)
    }

    pub fn get_dfa(&self) -> Option<&Dfa> {
        self.compiled.as_ref().map(|c| &c.dfa)
    }

    pub fn parser(&self) -> Option<Parser<'_>> {
        self.compiled.as_ref().map(Parser::new)
    }

    fn compile(&mut self, log: &mut BufLog) -> Result<CompiledGrammar, BuildError> {
        const VERBOSE: bool = false;
        self.grammar.ensure_build()?;
        let grammar = &self.grammar;
        let start_rules = grammar.get_start_rules();
        if start_rules.is_empty() {
            return Err(BuildError::from_msg(BuildErrorKind::NoStartRules, "the grammar has no start rules"));
        }
        check_recursion(grammar, &start_rules)?;
        let mut nfa_builder = NfaBuilder::new(&self.options);
        for (var, tree) in &start_rules {
            if VERBOSE { println!("start rule {var}: {}", crate::expr::expr_to_string(tree)); }
            nfa_builder.add_root(tree, grammar, Some(*var))?;
        }
        let (nfa, nfa_log) = nfa_builder.build();
        log.extend(nfa_log);
        let mut dfa_builder = DfaBuilder::new(&nfa, &self.options);
        let dfa = dfa_builder.build(StartMode::Merged)?;
        log.extend(dfa_builder.give_log());
        let (lexicon, lexicon_log) = grammar.get_lexicon().compile(&self.options)?;
        log.extend(lexicon_log);
        log.add_note(format!(
            "grammar: {} start rule(s), {} DFA state(s); lexicon: {} DFA state(s)",
            start_rules.len(), dfa.num_states(), lexicon.dfa().num_states()));
        if VERBOSE { println!("{log}"); }
        let start_rules = start_rules.into_iter().map(|(var, _)| var).collect();
        Ok(CompiledGrammar { nfa, dfa, lexicon, start_rules })
    }
}

impl<G: GrammarModel> LogReader for GrammarCompiler<G> {
    type Item = BufLog;

    fn get_log(&self) -> &Self::Item {
        &self.log
    }

    fn give_log(self) -> Self::Item {
        self.log
    }
}

// ---------------------------------------------------------------------------------------------

/// Verifies that each rule reachable from the start rules can derive a finite sequence.
///
/// A rule whose every production needs the rule itself again, like `A := a B c` and
/// `B := b A d`, can't be resolved.
pub fn check_recursion<G: GrammarModel>(grammar: &G, start_rules: &[(VarId, &ExprTree)]) -> Result<(), BuildError> {
    let mut reachable = BTreeSet::<VarId>::new();
    let mut stack = start_rules.iter().map(|(var, _)| *var).collect::<Vec<_>>();
    while let Some(var) = stack.pop() {
        if reachable.insert(var) {
            if let Some(tree) = grammar.get_rule(var) {
                stack.extend(rule_refs(tree));
            }
        }
    }
    let mut productive = BTreeSet::<VarId>::new();
    loop {
        let mut changed = false;
        for &var in &reachable {
            if productive.contains(&var) {
                continue;
            }
            let finite = grammar.get_rule(var)
                .and_then(|tree| tree.get_root().map(|root| derives_finite(tree, root, &productive)))
                .unwrap_or(false);
            if finite {
                productive.insert(var);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    let stuck = reachable.difference(&productive).copied().collect::<Vec<_>>();
    if stuck.is_empty() {
        return Ok(());
    }
    let names = stuck.iter()
        .map(|&v| grammar.get_rule_name(v).map(|n| format!("'{n}'")).unwrap_or_else(|| v.to_string()))
        .join(", ");
    let mut log = BufLog::new();
    log.add_error(format!("unresolvable recursion: rule(s) {names} never derive a finite sequence"));
    Err(BuildError::new(BuildErrorKind::UnresolvableRecursion, log))
}

fn derives_finite(tree: &ExprTree, index: usize, productive: &BTreeSet<VarId>) -> bool {
    let mut children = tree.children(index).iter().map(|&c| derives_finite(tree, c, productive));
    match tree.get(index) {
        ExprNode::Empty | ExprNode::Char(_) | ExprNode::Range(_) | ExprNode::Class(_) | ExprNode::Token(_) => true,
        ExprNode::Star | ExprNode::Maybe => true,
        ExprNode::Concat | ExprNode::Plus | ExprNode::Production(_) => children.all(|f| f),
        ExprNode::Or => children.any(|f| f),
        ExprNode::RuleRef(var) => productive.contains(var),
    }
}
