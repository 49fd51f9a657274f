// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Thompson construction of a nondeterministic automaton from expression trees.


use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use iter_index::IndexerIterator;
use crate::{DefId, LocalId, NfaStateId, VarId};
use crate::build::{BuildError, BuildErrorKind};
use crate::expr::{check_tree, productions, tree_to_string, ExprNode, ExprTree, RuleSource};
use crate::log::{BufLog, LogReader, Logger};
use crate::options::Options;
use crate::symbol::{Symbol, TransValue};

/// Production completed by an accepting state: definition and local index of the production
/// within that definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Completion {
    pub def: DefId,
    pub local: LocalId,
}

impl Completion {
    pub fn new(def: DefId, local: LocalId) -> Self {
        Completion { def, local }
    }
}

impl Display for Completion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.def, self.local)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NfaTrans {
    Epsilon(NfaStateId),
    Symbol(Symbol, NfaStateId),
}

impl NfaTrans {
    pub fn target(&self) -> NfaStateId {
        match self {
            NfaTrans::Epsilon(t) | NfaTrans::Symbol(_, t) => *t,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NfaState {
    trans: Vec<NfaTrans>,
    accept: Option<Completion>,
}

impl NfaState {
    pub fn transitions(&self) -> &[NfaTrans] {
        &self.trans
    }

    pub fn accept(&self) -> Option<Completion> {
        self.accept
    }
}

/// Nondeterministic automaton. It owns all its states; `starts` holds one start state per
/// root expression, in the order the roots were added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Nfa {
    states: Vec<NfaState>,
    starts: Vec<NfaStateId>,
}

impl Nfa {
    pub fn states(&self) -> &[NfaState] {
        &self.states
    }

    pub fn get_state(&self, id: NfaStateId) -> Option<&NfaState> {
        self.states.get(id)
    }

    pub fn starts(&self) -> &[NfaStateId] {
        &self.starts
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Adds to `set` all the states reachable from its states through epsilon transitions.
    /// `stack` is a work buffer, empty on return.
    pub fn extend_closure(&self, set: &mut BTreeSet<NfaStateId>, stack: &mut Vec<NfaStateId>) {
        stack.extend(set.iter());
        while let Some(id) = stack.pop() {
            let Some(state) = self.states.get(id) else { continue };
            for trans in &state.trans {
                if let NfaTrans::Epsilon(target) = trans {
                    if set.insert(*target) {
                        stack.push(*target);
                    }
                }
            }
        }
    }

    /// Simulates the automaton from `start` on `input` and returns the completions of the
    /// states reached after the last value.
    pub fn simulate<T: TransValue>(&self, start: NfaStateId, input: &[T]) -> BTreeSet<Completion> {
        let mut stack = Vec::new();
        let mut current = BTreeSet::from([start]);
        self.extend_closure(&mut current, &mut stack);
        for value in input {
            let mut next = BTreeSet::new();
            for &id in &current {
                for trans in &self.states[id].trans {
                    if let NfaTrans::Symbol(symbol, target) = trans {
                        if value.matches(symbol) {
                            next.insert(*target);
                        }
                    }
                }
            }
            if next.is_empty() {
                return BTreeSet::new();
            }
            self.extend_closure(&mut next, &mut stack);
            current = next;
        }
        current.iter().filter_map(|&id| self.states[id].accept).collect()
    }
}

impl Display for Nfa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "starts: {}", self.starts.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", "))?;
        for (id, state) in self.states.iter().enumerate() {
            let trans = state.trans.iter().map(|t| match t {
                NfaTrans::Epsilon(target) => format!("ε -> {target}"),
                NfaTrans::Symbol(symbol, target) => format!("{symbol} -> {target}"),
            }).collect::<Vec<_>>();
            write!(f, "{id:4}: {}", trans.join(", "))?;
            if let Some(acc) = state.accept {
                write!(f, " <accept {acc}>")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------------------------

/// Sub-automaton with one entry and one exit state.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Fragment {
    start: NfaStateId,
    end: NfaStateId,
}

/// Context of the root being built
struct RootContext<'r, R> {
    rules: &'r R,
    /// rules being expanded, from the root to the current node
    active: Vec<VarId>,
    /// single instance of each recursive rule
    shared: BTreeMap<VarId, Fragment>,
}

/// Builds an [Nfa] from expression trees.
///
/// Each root is added with [NfaBuilder::add_root]. A rule reference is expanded in place,
/// unless the rule is already being expanded: in that case, the reference is linked to one
/// shared, untagged instance of the rule, which makes the automaton cyclic.
#[derive(Debug)]
pub struct NfaBuilder<'o> {
    options: &'o Options,
    states: Vec<NfaState>,
    starts: Vec<NfaStateId>,
    log: BufLog,
}

impl<'o> NfaBuilder<'o> {
    pub fn new(options: &'o Options) -> Self {
        NfaBuilder { options, states: Vec::new(), starts: Vec::new(), log: BufLog::new() }
    }

    /// Adds the automaton of `tree`, whose root must be a production. `rule` is the rule the
    /// tree defines, if it is a grammar rule, so that self-references are seen as recursive.
    /// Returns the start state.
    pub fn add_root<R: RuleSource>(&mut self, tree: &ExprTree, rules: &R, rule: Option<VarId>) -> Result<NfaStateId, BuildError> {
        const VERBOSE: bool = false;
        let def = check_tree(tree).map_err(|msg| BuildError::from_msg(BuildErrorKind::MalformedExpression, msg))?;
        let (_, prods) = productions(tree)
            .ok_or_else(|| BuildError::from_msg(BuildErrorKind::MalformedExpression, format!("definition {def} has no production")))?;
        let mut ctx = RootContext { rules, active: rule.into_iter().collect(), shared: BTreeMap::new() };
        let start = self.new_state()?;
        for (local, &prod) in prods.iter().index::<LocalId>() {
            if VERBOSE { println!("root {def}.{local}: {}", tree_to_string(tree, prod)); }
            let frag = self.build_node(&mut ctx, tree, prod)?;
            let accept = self.new_state()?;
            self.states[accept].accept = Some(Completion::new(def, local));
            self.add_epsilon(start, frag.start);
            self.add_epsilon(frag.end, accept);
        }
        if !ctx.shared.is_empty() {
            self.log.add_note(format!(
                "definition {def}: recursive reference(s) to rule(s) {}",
                ctx.shared.keys().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")));
        }
        self.starts.push(start);
        Ok(start)
    }

    /// Returns the automaton.
    pub fn build(self) -> (Nfa, BufLog) {
        (Nfa { states: self.states, starts: self.starts }, self.log)
    }

    fn new_state(&mut self) -> Result<NfaStateId, BuildError> {
        if self.states.len() >= self.options.max_nfa_states {
            return Err(BuildError::from_msg(
                BuildErrorKind::StateLimit,
                format!("the NFA exceeds the maximum number of states ({})", self.options.max_nfa_states)));
        }
        self.states.push(NfaState::default());
        Ok(self.states.len() - 1)
    }

    fn new_fragment(&mut self) -> Result<Fragment, BuildError> {
        Ok(Fragment { start: self.new_state()?, end: self.new_state()? })
    }

    #[inline]
    fn add_epsilon(&mut self, from: NfaStateId, to: NfaStateId) {
        self.states[from].trans.push(NfaTrans::Epsilon(to));
    }

    #[inline]
    fn add_symbol(&mut self, from: NfaStateId, symbol: Symbol, to: NfaStateId) {
        self.states[from].trans.push(NfaTrans::Symbol(symbol, to));
    }

    fn build_node<R: RuleSource>(&mut self, ctx: &mut RootContext<'_, R>, tree: &ExprTree, index: usize) -> Result<Fragment, BuildError> {
        let node = tree.get(index);
        let children = tree.children(index);
        let frag = match node {
            ExprNode::Empty => {
                let frag = self.new_fragment()?;
                self.add_epsilon(frag.start, frag.end);
                frag
            }
            ExprNode::Char(_) | ExprNode::Range(_) | ExprNode::Class(_) => {
                let frag = self.new_fragment()?;
                let segments = node.to_segments().unwrap_or_default();
                self.add_symbol(frag.start, Symbol::Chars(segments), frag.end);
                frag
            }
            ExprNode::Token(token) => {
                let frag = self.new_fragment()?;
                self.add_symbol(frag.start, Symbol::Token(*token), frag.end);
                frag
            }
            ExprNode::Concat => {
                let mut frag: Option<Fragment> = None;
                for &child in children {
                    let next = self.build_node(ctx, tree, child)?;
                    frag = Some(match frag {
                        Some(prev) => {
                            self.add_epsilon(prev.end, next.start);
                            Fragment { start: prev.start, end: next.end }
                        }
                        None => next,
                    });
                }
                frag.ok_or_else(|| Self::malformed(tree, index))?
            }
            ExprNode::Or => {
                if children.is_empty() {
                    return Err(Self::malformed(tree, index));
                }
                let frag = self.new_fragment()?;
                for &child in children {
                    let alt = self.build_node(ctx, tree, child)?;
                    self.add_epsilon(frag.start, alt.start);
                    self.add_epsilon(alt.end, frag.end);
                }
                frag
            }
            ExprNode::Star | ExprNode::Plus | ExprNode::Maybe => {
                let &[child] = children else {
                    return Err(Self::malformed(tree, index));
                };
                let inner = self.build_node(ctx, tree, child)?;
                let frag = self.new_fragment()?;
                self.add_epsilon(frag.start, inner.start);
                self.add_epsilon(inner.end, frag.end);
                if !matches!(node, ExprNode::Maybe) {
                    self.add_epsilon(inner.end, inner.start);
                }
                if !matches!(node, ExprNode::Plus) {
                    self.add_epsilon(frag.start, frag.end);
                }
                frag
            }
            ExprNode::RuleRef(var) => self.build_reference(ctx, *var)?,
            ExprNode::Production(def) => {
                return Err(BuildError::from_msg(
                    BuildErrorKind::MalformedExpression,
                    format!("production {def} found below the root of a tree")));
            }
        };
        Ok(frag)
    }

    fn build_reference<R: RuleSource>(&mut self, ctx: &mut RootContext<'_, R>, var: VarId) -> Result<Fragment, BuildError> {
        let rules = ctx.rules;
        let tree = rules.get_rule(var)
            .ok_or_else(|| BuildError::from_msg(BuildErrorKind::UndefinedReference, format!("reference to undefined rule {var}")))?;
        let body = tree.get_root()
            .and_then(|root| tree.children(root).first().copied())
            .ok_or_else(|| BuildError::from_msg(BuildErrorKind::MalformedExpression, format!("rule {var} has no production")))?;
        if ctx.active.contains(&var) {
            let shared = match ctx.shared.get(&var) {
                Some(frag) => *frag,
                None => {
                    // registered before its body is built, so the references inside the body find it
                    let frag = self.new_fragment()?;
                    ctx.shared.insert(var, frag);
                    let saved = std::mem::replace(&mut ctx.active, vec![var]);
                    let inner = self.build_node(ctx, tree, body);
                    ctx.active = saved;
                    let inner = inner?;
                    self.add_epsilon(frag.start, inner.start);
                    self.add_epsilon(inner.end, frag.end);
                    frag
                }
            };
            let call = self.new_fragment()?;
            self.add_epsilon(call.start, shared.start);
            self.add_epsilon(shared.end, call.end);
            Ok(call)
        } else {
            ctx.active.push(var);
            let frag = self.build_node(ctx, tree, body);
            ctx.active.pop();
            frag
        }
    }

    fn malformed(tree: &ExprTree, index: usize) -> BuildError {
        BuildError::from_msg(BuildErrorKind::MalformedExpression, format!("malformed expression: {}", tree_to_string(tree, index)))
    }
}

impl LogReader for NfaBuilder<'_> {
    type Item = BufLog;

    fn get_log(&self) -> &Self::Item {
        &self.log
    }

    fn give_log(self) -> Self::Item {
        self.log
    }
}
