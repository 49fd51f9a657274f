// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Build-time message log.
//!
//! Producers (the NFA/DFA builders, the compiler) write to a [Logger]; consumers query the
//! outcome through [LogStatus]. A type owning a [BufLog] implements [LogReader] and gets
//! [LogStatus] for free.

use std::fmt::{Debug, Display, Formatter};

static NO_LOG_STORE: LogMsg = LogMsg::NoLogStore;

/// Common log functionalities for a message consumer/status verifier
pub trait LogStatus: Debug {
    fn num_notes(&self) -> usize;
    fn num_warnings(&self) -> usize;
    fn num_errors(&self) -> usize;

    #[inline]
    fn has_no_errors(&self) -> bool {
        self.num_errors() == 0
    }

    #[inline]
    fn has_no_warnings(&self) -> bool {
        self.num_warnings() == 0
    }

    fn get_messages(&self) -> impl Iterator<Item = &LogMsg> {
        [&NO_LOG_STORE].into_iter()
    }

    fn get_messages_str(&self) -> String {
        self.get_messages().map(|m| format!("- {m}")).collect::<Vec<_>>().join("\n")
    }

    fn get_notes(&self) -> impl Iterator<Item = &String> {
        self.get_messages().filter_map(|m| if let LogMsg::Note(s) = m { Some(s) } else { None })
    }

    fn get_warnings(&self) -> impl Iterator<Item = &String> {
        self.get_messages().filter_map(|m| if let LogMsg::Warning(s) = m { Some(s) } else { None })
    }

    fn get_errors(&self) -> impl Iterator<Item = &String> {
        self.get_messages().filter_map(|m| if let LogMsg::Error(s) = m { Some(s) } else { None })
    }
}

/// Common log functionalities for a message producer
pub trait Logger: Debug {
    fn add_note<T: Into<String>>(&mut self, msg: T);
    fn add_warning<T: Into<String>>(&mut self, msg: T);
    fn add_error<T: Into<String>>(&mut self, msg: T);
}

// ---------------------------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum LogMsg { NoLogStore, Note(String), Warning(String), Error(String) }

impl Display for LogMsg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogMsg::NoLogStore => write!(f, "The log messages were not stored"),
            LogMsg::Note(s) =>    write!(f, "Note   : {s}"),
            LogMsg::Warning(s) => write!(f, "Warning: {s}"),
            LogMsg::Error(s) =>   write!(f, "ERROR  : {s}"),
        }
    }
}

/// Number of messages of each severity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct LogCounts {
    notes: usize,
    warnings: usize,
    errors: usize,
}

impl LogCounts {
    fn count(&mut self, msg: &LogMsg) {
        match msg {
            LogMsg::NoLogStore => {}
            LogMsg::Note(_) => self.notes += 1,
            LogMsg::Warning(_) => self.warnings += 1,
            LogMsg::Error(_) => self.errors += 1,
        }
    }
}

/// Log that stores the messages, so that they can be attached to a [BuildError](crate::build::BuildError)
/// or inspected after a build.
#[derive(Clone, Debug, Default)]
pub struct BufLog {
    messages: Vec<LogMsg>,
    counts: LogCounts,
}

impl BufLog {
    pub fn new() -> Self {
        BufLog { messages: Vec::new(), counts: LogCounts::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Clears all messages: notes, warnings, and errors.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.counts = LogCounts::default();
    }

    /// Moves all the messages of `other` at the end of this log.
    pub fn extend(&mut self, other: BufLog) {
        self.extend_messages(other.messages);
    }

    pub fn extend_messages<T: IntoIterator<Item = LogMsg>>(&mut self, iter: T) {
        for msg in iter {
            self.push(msg);
        }
    }

    fn push(&mut self, msg: LogMsg) {
        self.counts.count(&msg);
        self.messages.push(msg);
    }
}

impl LogStatus for BufLog {
    fn num_notes(&self) -> usize {
        self.counts.notes
    }

    fn num_warnings(&self) -> usize {
        self.counts.warnings
    }

    fn num_errors(&self) -> usize {
        self.counts.errors
    }

    fn get_messages(&self) -> impl Iterator<Item = &LogMsg> {
        self.messages.iter()
    }
}

impl Logger for BufLog {
    fn add_note<T: Into<String>>(&mut self, msg: T) {
        self.push(LogMsg::Note(msg.into()));
    }

    fn add_warning<T: Into<String>>(&mut self, msg: T) {
        self.push(LogMsg::Warning(msg.into()));
    }

    fn add_error<T: Into<String>>(&mut self, msg: T) {
        self.push(LogMsg::Error(msg.into()));
    }
}

impl Display for BufLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get_messages_str())
    }
}

// ---------------------------------------------------------------------------------------------
// blanket implementation: LogReader -> LogStatus

/// Gives access to the log owned by an object (builder, compiler).
pub trait LogReader {
    type Item: LogStatus;

    fn get_log(&self) -> &Self::Item;

    fn give_log(self) -> Self::Item;
}

impl<T: LogReader + Debug> LogStatus for T {
    fn num_notes(&self) -> usize {
        self.get_log().num_notes()
    }

    fn num_warnings(&self) -> usize {
        self.get_log().num_warnings()
    }

    fn num_errors(&self) -> usize {
        self.get_log().num_errors()
    }

    fn get_messages(&self) -> impl Iterator<Item=&LogMsg> {
        self.get_log().get_messages()
    }

    fn get_messages_str(&self) -> String {
        self.get_log().get_messages_str()
    }
}

// ---------------------------------------------------------------------------------------------
