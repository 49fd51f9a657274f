// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

use std::error::Error;
use std::fmt::{Display, Formatter};
use crate::log::{BufLog, LogStatus, Logger};

// ---------------------------------------------------------------------------------------------

/// Category of a build failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildErrorKind {
    /// The grammar has no start rule.
    NoStartRules,
    /// A cycle of rule references can't be turned into a finite automaton: either no rule of
    /// the cycle derives a finite sequence, or the subset construction exceeds its state bound.
    UnresolvableRecursion,
    /// An expression tree doesn't have the expected shape.
    MalformedExpression,
    /// A rule reference points to a rule that doesn't exist.
    UndefinedReference,
    /// The NFA construction exceeds the configured number of states.
    StateLimit,
}

impl Display for BuildErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BuildErrorKind::NoStartRules => "no start rules",
            BuildErrorKind::UnresolvableRecursion => "unresolvable recursion",
            BuildErrorKind::MalformedExpression => "malformed expression",
            BuildErrorKind::UndefinedReference => "undefined reference",
            BuildErrorKind::StateLimit => "state limit exceeded",
        };
        write!(f, "{text}")
    }
}

/// Error returned by the build operations. The log holds the messages produced until the
/// failure, including the error message(s).
#[derive(Debug)]
pub struct BuildError {
    kind: BuildErrorKind,
    log: BufLog,
}

impl BuildError {
    pub fn new(kind: BuildErrorKind, log: BufLog) -> Self {
        BuildError { kind, log }
    }

    /// Creates an error from a single message.
    pub fn from_msg<T: Into<String>>(kind: BuildErrorKind, msg: T) -> Self {
        let mut log = BufLog::new();
        log.add_error(msg);
        BuildError { kind, log }
    }

    pub fn kind(&self) -> BuildErrorKind {
        self.kind
    }

    pub fn get_log(&self) -> &BufLog {
        &self.log
    }

    pub fn give_log(self) -> BufLog {
        self.log
    }

    /// Puts the messages of `log` before the messages of this error.
    pub fn with_previous_log(mut self, mut log: BufLog) -> Self {
        log.extend(self.log);
        self.log = log;
        self
    }
}

impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Build error ({}):\n{}", self.kind, self.log.get_messages_str())
    }
}

impl Error for BuildError {
}
