// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

/// Default maximum number of NFA states
pub const DEFAULT_MAX_NFA_STATES: usize = 100_000;
/// Default maximum number of DFA states
pub const DEFAULT_MAX_DFA_STATES: usize = 10_000;

/// Options of the grammar compiler and of the automaton builders.
///
/// See [OptionsBuilder] for the accompanying builder.
#[derive(Clone, PartialEq, Debug)]
pub struct Options {
    /// Maximum number of NFA states, beyond which the NFA construction fails with
    /// [StateLimit](crate::build::BuildErrorKind::StateLimit)
    pub max_nfa_states: usize,
    /// Maximum number of DFA states, beyond which the subset construction fails with
    /// [UnresolvableRecursion](crate::build::BuildErrorKind::UnresolvableRecursion)
    pub max_dfa_states: usize,
    /// Adds a note to the log for each DFA state completing more than one definition
    pub log_ambiguities: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_nfa_states: DEFAULT_MAX_NFA_STATES,
            max_dfa_states: DEFAULT_MAX_DFA_STATES,
            log_ambiguities: true,
        }
    }
}

// ---------------------------------------------------------------------------------------------

/// Builder of the [Options] object.
///
/// # Example
/// ```
/// # use gramscan::options::{Options, OptionsBuilder};
/// let options = OptionsBuilder::new()
///     .max_dfa_states(500)
///     .log_ambiguities(false)
///     .build();
/// assert_eq!(options.max_dfa_states, 500);
/// assert!(!options.log_ambiguities);
/// ```
#[derive(Clone, Debug, Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        OptionsBuilder::default()
    }

    /// Sets the maximum number of NFA states
    pub fn max_nfa_states(&mut self, max: usize) -> &mut Self {
        self.options.max_nfa_states = max;
        self
    }

    /// Sets the maximum number of DFA states
    pub fn max_dfa_states(&mut self, max: usize) -> &mut Self {
        self.options.max_dfa_states = max;
        self
    }

    /// Enables or disables the notes about ambiguous DFA states
    pub fn log_ambiguities(&mut self, log: bool) -> &mut Self {
        self.options.log_ambiguities = log;
        self
    }

    /// Creates an [Options] object from the current settings.
    pub fn build(&self) -> Options {
        self.options.clone()
    }

    /// Returns the [Options] object, consuming the builder.
    pub fn options(self) -> Options {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let options = OptionsBuilder::new().max_nfa_states(64).build();
        assert_eq!(options, Options { max_nfa_states: 64, ..Options::default() });
        let mut builder = OptionsBuilder::new();
        builder.max_dfa_states(3).log_ambiguities(false);
        let options = builder.options();
        assert_eq!(options.max_dfa_states, 3);
        assert_eq!(options.max_nfa_states, DEFAULT_MAX_NFA_STATES);
        assert!(!options.log_ambiguities);
    }
}
