// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Step-by-step recognition over a [Dfa].
//!
//! The same recognizer drives the lexicon automaton, with characters, and the grammar
//! automaton, with token IDs.

use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use crate::{DefId, StateId};
use crate::dfa::{Dfa, DfaState, DfaTrans};
use crate::nfa::Completion;
use crate::symbol::TransValue;

/// View of a DFA state during recognition
#[derive(Clone, Copy, Debug)]
pub struct RecognizerState<'a> {
    id: StateId,
    state: &'a DfaState,
}

impl<'a> RecognizerState<'a> {
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn completions(&self) -> &'a [Completion] {
        self.state.completions()
    }

    pub fn is_accepting(&self) -> bool {
        self.state.is_accepting()
    }

    pub fn transitions(&self) -> impl Iterator<Item = RecognizerTransition<'a>> {
        let state = self.state;
        state.transitions().iter().enumerate().map(|(index, trans)| RecognizerTransition { index, trans })
    }
}

/// View of a transition leaving a [RecognizerState]
#[derive(Clone, Copy, Debug)]
pub struct RecognizerTransition<'a> {
    index: usize,
    trans: &'a DfaTrans,
}

impl<'a> RecognizerTransition<'a> {
    /// Position of the transition in its state
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get_trans(&self) -> &'a DfaTrans {
        self.trans
    }

    pub fn target(&self) -> StateId {
        self.trans.target
    }
}

/// Value without a matching transition in the current state. The recognizer stays in that state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rejected<T> {
    pub value: T,
    pub state: StateId,
}

impl<T: Display> Display for Rejected<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} rejected in state {}", self.value, self.state)
    }
}

/// Tracks the current state of a walk through a [Dfa].
#[derive(Clone, Debug)]
pub struct Recognizer<'a, T> {
    dfa: &'a Dfa,
    initial: StateId,
    state: StateId,
    _value: PhantomData<T>,
}

impl<'a, T: TransValue> Recognizer<'a, T> {
    /// Creates a recognizer at the first initial state of `dfa`.
    pub fn new(dfa: &'a Dfa) -> Self {
        let initial = dfa.initial_state().unwrap_or(0);
        Recognizer { dfa, initial, state: initial, _value: PhantomData }
    }

    /// Creates a recognizer starting at `state`, which is also the state restored by [Recognizer::reset].
    pub fn with_state(dfa: &'a Dfa, state: StateId) -> Self {
        Recognizer { dfa, initial: state, state, _value: PhantomData }
    }

    pub fn state_id(&self) -> StateId {
        self.state
    }

    pub fn current(&self) -> Option<RecognizerState<'a>> {
        let dfa = self.dfa;
        dfa.get_state(self.state).map(|state| RecognizerState { id: self.state, state })
    }

    /// Follows the transition of the current state that accepts `value`, if any.
    pub fn recognize(&mut self, value: T) -> Result<RecognizerState<'a>, Rejected<T>> {
        let dfa = self.dfa;
        let rejected = Rejected { value, state: self.state };
        let current = dfa.get_state(self.state).ok_or(rejected)?;
        let trans = current.transitions().iter().find(|t| value.matches(&t.symbol)).ok_or(rejected)?;
        let state = dfa.get_state(trans.target).ok_or(rejected)?;
        self.state = trans.target;
        Ok(RecognizerState { id: trans.target, state })
    }

    pub fn reset(&mut self) {
        self.state = self.initial;
    }

    pub fn is_accepting(&self) -> bool {
        self.current().map(|s| s.is_accepting()).unwrap_or(false)
    }

    pub fn has_completion(&self, def: DefId) -> bool {
        self.dfa.get_state(self.state).map(|s| s.has_completion(def)).unwrap_or(false)
    }

    pub fn completions(&self) -> &'a [Completion] {
        self.dfa.completions(self.state)
    }

    /// Transitions leaving the current state
    pub fn expected(&self) -> Vec<RecognizerTransition<'a>> {
        self.current().map(|s| s.transitions().collect()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use crate::node;
    use crate::dfa::{DfaBuilder, StartMode};
    use crate::expr::{alt_tree, literal_tree, ExprTree};
    use crate::nfa::NfaBuilder;
    use crate::options::Options;
    use crate::symbol::Symbol;
    use crate::{TokenId, VarId};
    use super::*;

    fn make_dfa(trees: &[ExprTree]) -> Dfa {
        let options = Options::default();
        let no_rules = BTreeMap::<VarId, ExprTree>::new();
        let mut nfa_builder = NfaBuilder::new(&options);
        for tree in trees {
            nfa_builder.add_root(tree, &no_rules, None).unwrap();
        }
        let (nfa, _) = nfa_builder.build();
        let mut builder = DfaBuilder::new(&nfa, &options);
        builder.build(StartMode::Merged).unwrap()
    }

    #[test]
    fn recognize_chars() {
        let dfa = make_dfa(&[literal_tree(0, "if"), literal_tree(1, "in")]);
        let mut rec = Recognizer::<char>::new(&dfa);
        assert!(!rec.is_accepting());
        assert_eq!(rec.expected().len(), 1);
        let s = rec.recognize('i').unwrap();
        assert_eq!(s.id(), rec.state_id());
        assert_eq!(rec.expected().len(), 2);
        let err = rec.recognize('x').unwrap_err();
        assert_eq!(err, Rejected { value: 'x', state: s.id() });
        assert_eq!(err.to_string(), format!("x rejected in state {}", s.id()));
        // still in the same state
        assert_eq!(rec.state_id(), s.id());
        let s = rec.recognize('n').unwrap();
        assert!(s.is_accepting());
        assert_eq!(s.completions(), &[Completion::new(1, 0)]);
        assert!(rec.has_completion(1));
        assert!(!rec.has_completion(0));
        assert!(rec.recognize('n').is_err());
        rec.reset();
        assert_eq!(Some(rec.state_id()), dfa.initial_state());
    }

    #[test]
    fn recognize_tokens() {
        let dfa = make_dfa(&[alt_tree(4, vec![vec![node!(t 1), node!(t 2)], vec![node!(t 3)]])]);
        let tests: Vec<(Vec<TokenId>, Option<bool>)> = vec![
            (vec![1, 2], Some(true)),
            (vec![1], Some(false)),
            (vec![3], Some(true)),
            (vec![2], None),
            (vec![3, 3], None),
        ];
        for (idx, (input, expected)) in tests.into_iter().enumerate() {
            let mut rec = Recognizer::<TokenId>::new(&dfa);
            let result = input.iter().try_fold((), |_, &t| rec.recognize(t).map(|_| ())).ok().map(|_| rec.is_accepting());
            assert_eq!(result, expected, "test {idx} failed");
        }
        let rec = Recognizer::<TokenId>::new(&dfa);
        let expected = rec.expected().iter().map(|t| t.get_trans().symbol.clone()).collect::<Vec<_>>();
        assert_eq!(expected, vec![Symbol::Token(1), Symbol::Token(3)]);
        assert_eq!(rec.expected()[1].index(), 1);
    }

    #[test]
    fn recognize_from_state() {
        let dfa = make_dfa(&[literal_tree(0, "abc")]);
        let after_a = dfa.next_state(0, 'a').unwrap();
        let mut rec = Recognizer::<char>::with_state(&dfa, after_a);
        assert!(rec.recognize('b').is_ok());
        rec.reset();
        assert_eq!(rec.state_id(), after_a);
        let mut lost = Recognizer::<char>::with_state(&dfa, 100);
        assert!(lost.current().is_none());
        assert_eq!(lost.recognize('a').unwrap_err(), Rejected { value: 'a', state: 100 });
    }
}
