// crates/pavilion-core/src/state.rs
// ============================================================================
// Module: Pavilion Run State Machine
// Description: Run lifecycle states and the append-only status journal.
// Purpose: Give every component a single, crash-safe vocabulary for
//          recording and observing a test run's progress.
// Dependencies: serde, time, thiserror
// ============================================================================

//! ## Overview
//! [`RunState`] enumerates every state a test run passes through.
//! [`StatusJournal`] models the append-only sequence of `(timestamp, state,
//! note)` entries that is the sole cross-host coordination channel for run
//! observation; it never allows a non-terminal entry to follow a terminal
//! one except the `Error` state, which corruption can trigger from anywhere.

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A single state in a test run's lifecycle.
///
/// # Invariants
/// - Transitions are monotone forward per [`RunState::ORDER`], with the
///   single exception that `Error` may follow any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// The run record has been created but not yet resolved.
    Created,
    /// Variable and expression resolution completed.
    Resolved,
    /// Waiting for the build lock or an in-progress build.
    BuildWait,
    /// The build script is executing.
    Building,
    /// The build completed (or the run's build was already available).
    BuildDone,
    /// The job has been submitted to the scheduler.
    Scheduled,
    /// The allocation is running the test script.
    Running,
    /// The result pipeline is parsing output.
    ResultsParsing,
    /// Terminal: the run finished and produced a result.
    Complete,
    /// Terminal: the run's script or build failed.
    Failed,
    /// Terminal: the run was cancelled.
    Cancelled,
    /// Terminal: the run exceeded its allotted time.
    TimedOut,
    /// Terminal: `only_if`/`not_if` excluded this run.
    Skipped,
    /// Terminal: internal corruption; may be entered from any prior state.
    Error,
}

impl RunState {
    /// Non-error states in their expected forward order.
    pub const ORDER: [Self; 8] = [
        Self::Created,
        Self::Resolved,
        Self::BuildWait,
        Self::Building,
        Self::BuildDone,
        Self::Scheduled,
        Self::Running,
        Self::ResultsParsing,
    ];

    /// Returns `true` for the six terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Complete | Self::Failed | Self::Cancelled | Self::TimedOut | Self::Skipped | Self::Error
        )
    }

    /// Returns this state's position in [`Self::ORDER`], or `None` for a
    /// terminal state (terminal states have no fixed forward rank).
    #[must_use]
    fn rank(self) -> Option<usize> {
        Self::ORDER.iter().position(|candidate| *candidate == self)
    }

    /// Returns `true` if transitioning from `self` to `next` is monotone
    /// forward, per [`Self::ORDER`], or is the universal `Error` escape.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if next == Self::Error {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to >= from,
            // `next` is a non-Error terminal: always reachable from a
            // non-terminal state.
            (Some(_), None) => true,
            _ => false,
        }
    }
}

/// A single append-only journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    /// When this entry was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// The state tag.
    pub state: RunState,
    /// A free-form, human-readable note.
    pub note: String,
}

impl StatusEntry {
    /// Creates a new entry at the given timestamp.
    #[must_use]
    pub fn new(timestamp: OffsetDateTime, state: RunState, note: impl Into<String>) -> Self {
        Self {
            timestamp,
            state,
            note: note.into(),
        }
    }

    /// Formats the timestamp as RFC 3339, the on-disk journal format.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp cannot be formatted (only possible
    /// for timestamps outside the representable range).
    pub fn timestamp_rfc3339(&self) -> Result<String, time::error::Format> {
        self.timestamp.format(&Rfc3339)
    }
}

/// Errors raised while appending to or replaying a status journal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// The proposed entry would move a terminal run backward.
    #[error("illegal transition from {from:?} to {to:?}")]
    IllegalTransition {
        /// The run's last recorded state.
        from: RunState,
        /// The rejected next state.
        to: RunState,
    },
}

/// An in-memory, append-only sequence of status entries.
///
/// # Invariants
/// - `current()` is always `entries.last()`.
/// - No entry after a terminal entry, except that corruption may still be
///   recorded as an `Error` entry (itself terminal, so the journal is closed
///   afterward too).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusJournal {
    entries: Vec<StatusEntry>,
}

impl StatusJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a journal from previously recorded entries without
    /// re-validating monotonicity (used when replaying a file on disk).
    #[must_use]
    pub const fn from_entries(entries: Vec<StatusEntry>) -> Self {
        Self { entries }
    }

    /// Returns the current (last) entry, if any.
    #[must_use]
    pub fn current(&self) -> Option<&StatusEntry> {
        self.entries.last()
    }

    /// Returns all entries in chronological order.
    #[must_use]
    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    /// Appends a new entry, enforcing monotone-forward transition.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::IllegalTransition`] if the last recorded state
    /// is terminal and `entry.state` is not `Error`.
    pub fn append(&mut self, entry: StatusEntry) -> Result<(), JournalError> {
        if let Some(current) = self.current()
            && !current.state.can_transition_to(entry.state)
        {
            return Err(JournalError::IllegalTransition {
                from: current.state,
                to: entry.state,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Returns `true` if the journal's last state is terminal, which per the
    /// data model must agree with `RUN_COMPLETE` marker presence.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current().is_some_and(|entry| entry.state.is_terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    #[test]
    fn monotonicity_is_enforced() {
        let mut journal = StatusJournal::new();
        journal.append(StatusEntry::new(ts(), RunState::Created, "")).unwrap();
        journal.append(StatusEntry::new(ts(), RunState::Resolved, "")).unwrap();
        journal.append(StatusEntry::new(ts(), RunState::Complete, "")).unwrap();
        let err = journal.append(StatusEntry::new(ts(), RunState::Running, "")).unwrap_err();
        assert!(matches!(err, JournalError::IllegalTransition { .. }));
    }

    #[test]
    fn error_escapes_from_any_state() {
        let mut journal = StatusJournal::new();
        journal.append(StatusEntry::new(ts(), RunState::Building, "")).unwrap();
        journal.append(StatusEntry::new(ts(), RunState::Error, "corruption")).unwrap();
        assert!(journal.is_complete());
    }

    #[test]
    fn skip_is_reachable_directly_from_resolved() {
        assert!(RunState::Resolved.can_transition_to(RunState::Skipped));
    }
}
