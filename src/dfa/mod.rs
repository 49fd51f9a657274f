// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Subset construction of a deterministic automaton from an [Nfa].
//!
//! A DFA state may complete several productions, possibly of different definitions: the
//! ambiguity is kept in the state and reported in the log, not resolved.


use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use crate::{DefId, NfaStateId, StateId, TokenId};
use crate::build::{BuildError, BuildErrorKind};
use crate::log::{BufLog, LogReader, Logger};
use crate::nfa::{Completion, Nfa, NfaTrans};
use crate::options::Options;
use crate::partition::IntervalPartition;
use crate::pool::Pool;
use crate::segments::Segments;
use crate::symbol::{Symbol, TransValue};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DfaTrans {
    pub symbol: Symbol,
    pub target: StateId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DfaState {
    trans: Vec<DfaTrans>,
    /// sorted, without duplicates
    completions: Vec<Completion>,
}

impl DfaState {
    pub fn transitions(&self) -> &[DfaTrans] {
        &self.trans
    }

    pub fn completions(&self) -> &[Completion] {
        &self.completions
    }

    #[inline]
    pub fn is_accepting(&self) -> bool {
        !self.completions.is_empty()
    }

    pub fn has_completion(&self, def: DefId) -> bool {
        self.completions.iter().any(|c| c.def == def)
    }

    /// Returns the target of the transition accepting `value`. Labels leaving a state are
    /// disjoint, so there is at most one.
    pub fn next<T: TransValue>(&self, value: T) -> Option<StateId> {
        self.trans.iter().find(|t| value.matches(&t.symbol)).map(|t| t.target)
    }
}

/// Deterministic automaton. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dfa {
    states: Vec<DfaState>,
    initial_states: Vec<StateId>,
}

impl Dfa {
    pub fn states(&self) -> &[DfaState] {
        &self.states
    }

    pub fn get_state(&self, id: StateId) -> Option<&DfaState> {
        self.states.get(id)
    }

    /// Initial states, one per NFA start state, or a single one if the starts were merged.
    pub fn initial_states(&self) -> &[StateId] {
        &self.initial_states
    }

    pub fn initial_state(&self) -> Option<StateId> {
        self.initial_states.first().copied()
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.states.iter().map(|s| s.trans.len()).sum()
    }

    pub fn completions(&self, state: StateId) -> &[Completion] {
        self.states.get(state).map(|s| s.completions.as_slice()).unwrap_or(&[])
    }

    pub fn next_state<T: TransValue>(&self, state: StateId, value: T) -> Option<StateId> {
        self.states.get(state)?.next(value)
    }

    /// Runs the automaton from `start` on `input`. Returns the final state, or `None` if a
    /// value is rejected.
    pub fn simulate<T: TransValue>(&self, start: StateId, input: &[T]) -> Option<StateId> {
        input.iter().try_fold(start, |state, &value| self.next_state(state, value))
    }
}

impl Display for Dfa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "initial states: {}", self.initial_states.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", "))?;
        for (id, state) in self.states.iter().enumerate() {
            write!(f, "{id:4}:")?;
            for t in &state.trans {
                write!(f, " {} -> {};", t.symbol, t.target)?;
            }
            if state.is_accepting() {
                write!(f, " <{}>", state.completions.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------------------------

/// How the NFA start states map to DFA initial states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartMode {
    /// One initial state for the union of all the start states
    Merged,
    /// One initial state per start state
    Separate,
}

/// Work buffers reused while computing the epsilon closures.
#[derive(Debug, Default)]
struct ClosurePools {
    sets: Pool<BTreeSet<NfaStateId>>,
    stacks: Pool<Vec<NfaStateId>>,
    keys: Pool<Vec<NfaStateId>>,
}

impl ClosurePools {
    /// Epsilon closure of `seeds` as a canonical key: sorted NFA state IDs, without duplicates.
    fn closure<I: IntoIterator<Item = NfaStateId>>(&mut self, nfa: &Nfa, seeds: I) -> Vec<NfaStateId> {
        let mut set = self.sets.scoped();
        let mut stack = self.stacks.scoped();
        set.extend(seeds);
        nfa.extend_closure(&mut set, &mut stack);
        let mut key = self.keys.acquire();
        key.extend(set.iter());
        key
    }
}

/// Builds a [Dfa] from an [Nfa] by subset construction.
///
/// The states are numbered in breadth-first discovery order and the transitions of each
/// state are computed in a fixed order, so two builds of the same NFA give identical DFAs.
#[derive(Debug)]
pub struct DfaBuilder<'a> {
    nfa: &'a Nfa,
    options: &'a Options,
    log: BufLog,
    pools: ClosurePools,
}

impl<'a> DfaBuilder<'a> {
    pub fn new(nfa: &'a Nfa, options: &'a Options) -> Self {
        DfaBuilder { nfa, options, log: BufLog::new(), pools: ClosurePools::default() }
    }

    pub fn build(&mut self, mode: StartMode) -> Result<Dfa, BuildError> {
        const VERBOSE: bool = false;
        let nfa = self.nfa;
        let mut ids = BTreeMap::<Vec<NfaStateId>, StateId>::new();
        let mut keys = Vec::<Vec<NfaStateId>>::new();
        let mut initial_states = Vec::new();
        match mode {
            StartMode::Merged => {
                if !nfa.starts().is_empty() {
                    let key = self.pools.closure(nfa, nfa.starts().iter().copied());
                    initial_states.push(self.intern(key, &mut ids, &mut keys)?);
                }
            }
            StartMode::Separate => {
                for &start in nfa.starts() {
                    let key = self.pools.closure(nfa, [start]);
                    initial_states.push(self.intern(key, &mut ids, &mut keys)?);
                }
            }
        }
        let mut states = Vec::<DfaState>::new();
        let mut partition = IntervalPartition::<NfaStateId>::new();
        let mut tokens = BTreeMap::<TokenId, BTreeSet<NfaStateId>>::new();
        // `keys` grows while the states are processed
        let mut current = 0;
        while current < keys.len() {
            let mut completions = Vec::new();
            partition.clear();
            tokens.clear();
            for &id in &keys[current] {
                let Some(nfa_state) = nfa.get_state(id) else { continue };
                completions.extend(nfa_state.accept());
                for trans in nfa_state.transitions() {
                    match trans {
                        NfaTrans::Epsilon(_) => {}
                        NfaTrans::Symbol(Symbol::Chars(segments), target) => partition.insert_segments(segments, *target),
                        NfaTrans::Symbol(Symbol::Token(token), target) => {
                            tokens.entry(*token).or_default().insert(*target);
                        }
                    }
                }
            }
            completions.sort();
            completions.dedup();
            // several cells may lead to the same state: they're grouped into one label
            let mut char_targets = BTreeMap::<StateId, Segments>::new();
            for (seg, targets) in partition.iter() {
                let key = self.pools.closure(nfa, targets.iter().copied());
                let target = self.intern(key, &mut ids, &mut keys)?;
                char_targets.entry(target).or_default().insert(*seg);
            }
            let mut trans = Vec::with_capacity(char_targets.len() + tokens.len());
            for (target, mut segments) in char_targets {
                segments.normalize();
                trans.push(DfaTrans { symbol: Symbol::Chars(segments), target });
            }
            for (token, targets) in &tokens {
                let key = self.pools.closure(nfa, targets.iter().copied());
                let target = self.intern(key, &mut ids, &mut keys)?;
                trans.push(DfaTrans { symbol: Symbol::Token(*token), target });
            }
            if self.options.log_ambiguities {
                let defs = completions.iter().map(|c| c.def).collect::<BTreeSet<_>>();
                if defs.len() > 1 {
                    self.log.add_note(format!(
                        "state {current} completes several definitions: {}",
                        completions.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")));
                }
            }
            if VERBOSE {
                println!("state {current} = {:?}: {} transition(s), completions {completions:?}", keys[current], trans.len());
            }
            states.push(DfaState { trans, completions });
            current += 1;
        }
        for key in keys {
            self.pools.keys.release(key);
        }
        self.log.add_note(format!("DFA: {} state(s), {} NFA state(s)", states.len(), nfa.num_states()));
        Ok(Dfa { states, initial_states })
    }

    /// Returns the state ID of `key`, creating a new state if the key is new.
    fn intern(&mut self, key: Vec<NfaStateId>, ids: &mut BTreeMap<Vec<NfaStateId>, StateId>, keys: &mut Vec<Vec<NfaStateId>>) -> Result<StateId, BuildError> {
        if let Some(&id) = ids.get(&key) {
            self.pools.keys.release(key);
            return Ok(id);
        }
        if keys.len() >= self.options.max_dfa_states {
            let msg = format!(
                "the DFA exceeds the maximum number of states ({}); the recursion in the definitions can't be resolved",
                self.options.max_dfa_states);
            self.log.add_error(msg.clone());
            return Err(BuildError::from_msg(BuildErrorKind::UnresolvableRecursion, msg));
        }
        let id = keys.len();
        ids.insert(key.clone(), id);
        keys.push(key);
        Ok(id)
    }
}

impl LogReader for DfaBuilder<'_> {
    type Item = BufLog;

    fn get_log(&self) -> &Self::Item {
        &self.log
    }

    fn give_log(self) -> Self::Item {
        self.log
    }
}

// ---------------------------------------------------------------------------------------------

/// Lists the states by definition they complete, for the debugging consumers.
pub fn states_by_definition(dfa: &Dfa) -> BTreeMap<DefId, Vec<StateId>> {
    let mut map = BTreeMap::<DefId, Vec<StateId>>::new();
    for (id, state) in dfa.states().iter().enumerate() {
        for def in state.completions().iter().map(|c| c.def).collect::<BTreeSet<_>>() {
            map.entry(def).or_default().push(id);
        }
    }
    map
}
