//! Keeping track of a student's working, one step at a time.

use crate::{
    algebra::ops::{Builtins, Context},
    check::{Checker, Line, Report, Verdict},
    config::Config,
    diagnose::Hint,
};
use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex, PoisonError};

/// The line a fresh session starts from.
pub const DEFAULT_PREVIOUS_LINE: &str = "2x + 3y = 20; x + y = 8";

/// A single checked step.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: DateTime<Local>,
    pub previous: String,
    pub current: String,
    pub verdict: Verdict,
    pub hint: Option<Hint>,
}

/// An append-only log of every step that was checked.
///
/// Appends are serialised, so a `History` can be shared between threads
/// (e.g. behind an [`Arc`]).
#[derive(Debug, Default)]
pub struct History {
    records: Mutex<Vec<Record>>,
}

impl History {
    pub fn new() -> Self { History::default() }

    pub fn push(&self, record: Record) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// A snapshot of every record, oldest first.
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// The state behind a worksheet: the line being transformed, the student's
/// attempt at the next line, and the history of everything checked so far.
#[derive(Debug)]
pub struct Session<C = Builtins> {
    checker: Checker<C>,
    previous: String,
    current: String,
    verified: bool,
    history: Arc<History>,
}

impl Session<Builtins> {
    pub fn new() -> Self {
        Session::with_checker(Checker::new(Config::default()))
    }
}

impl Default for Session<Builtins> {
    fn default() -> Self { Session::new() }
}

impl<C: Context> Session<C> {
    pub fn with_checker(checker: Checker<C>) -> Self {
        Session {
            checker,
            previous: String::from(DEFAULT_PREVIOUS_LINE),
            current: String::new(),
            verified: false,
            history: Arc::new(History::new()),
        }
    }

    /// Record checked steps in an existing [`History`].
    pub fn with_history(self, history: Arc<History>) -> Self {
        Session { history, ..self }
    }

    pub fn checker(&self) -> &Checker<C> { &self.checker }

    pub fn previous(&self) -> &str { &self.previous }

    pub fn current(&self) -> &str { &self.current }

    pub fn set_previous<S: Into<String>>(&mut self, text: S) {
        self.previous = text.into();
        self.verified = false;
    }

    pub fn set_current<S: Into<String>>(&mut self, text: S) {
        self.current = text.into();
        self.verified = false;
    }

    /// Type some text onto the end of a line, the way a keypad would.
    pub fn append(&mut self, line: Line, text: &str) {
        match line {
            Line::Previous => self.previous.push_str(text),
            Line::Current => self.current.push_str(text),
        }
        self.verified = false;
    }

    /// Check the current step and add it to the history.
    pub fn check(&mut self) -> Report {
        let report = self.checker.check_step(&self.previous, &self.current);
        self.verified = report.verdict.is_accepted();

        self.history.push(Record {
            timestamp: Local::now(),
            previous: self.previous.clone(),
            current: self.current.clone(),
            verdict: report.verdict.clone(),
            hint: report.hint,
        });

        report
    }

    /// Has the current line been accepted since it was last edited?
    pub fn is_verified(&self) -> bool { self.verified }

    /// Move on to the next step, making the current line the new starting
    /// point.
    ///
    /// Returns `false` (and does nothing) unless the current line has been
    /// verified.
    pub fn next_step(&mut self) -> bool {
        if !self.verified {
            return false;
        }

        self.previous = std::mem::take(&mut self.current);
        self.verified = false;
        true
    }

    pub fn history(&self) -> &Arc<History> { &self.history }
}
