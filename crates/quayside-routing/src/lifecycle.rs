//! Session lifecycle state machine.
//!
//! This module defines the valid status transitions for chat sessions and
//! provides validation helpers to ensure state machine invariants are
//! maintained.
//!
//! # State Machine
//!
//! ```text
//!     ┌──────────┐  (agent take)   ┌──────────┐
//!     │ Waiting  │────────────────▶│  Active  │
//!     └────┬─────┘                 └────┬─────┘
//!          │ (close)                    │ (close)
//!          │        ┌──────────┐        │
//!          └───────▶│  Closed  │◀───────┘
//!                   └──────────┘
//! ```
//!
//! Transitions are monotonic: no state is ever skipped and no transition
//! reverses. `Closed` is terminal.

use quayside_store::{Sender, SessionStatus};

/// Check if a status transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: SessionStatus, to: SessionStatus) -> bool {
    use SessionStatus::{Active, Closed, Waiting};

    matches!((from, to), (Waiting, Active) | (Waiting | Active, Closed))
}

/// Returns the list of valid target statuses from the given status.
#[must_use]
pub fn valid_transitions_from(status: SessionStatus) -> Vec<SessionStatus> {
    use SessionStatus::{Active, Closed, Waiting};

    match status {
        Waiting => vec![Active, Closed],
        Active => vec![Closed],
        Closed => vec![],
    }
}

/// Returns true if the session can still be taken by an agent.
#[must_use]
pub const fn can_take(status: SessionStatus) -> bool {
    matches!(status, SessionStatus::Waiting)
}

/// Returns true if the status is terminal.
#[must_use]
pub const fn is_terminal(status: SessionStatus) -> bool {
    matches!(status, SessionStatus::Closed)
}

/// Returns true if a message from the given sender may be appended while the
/// session has the given status.
///
/// Users may message while queued; agents only once the session is active.
/// Bot notices accompany any non-terminal transition.
#[must_use]
pub const fn may_send(status: SessionStatus, sender: Sender) -> bool {
    use SessionStatus::{Active, Closed, Waiting};

    match sender {
        Sender::User | Sender::Bot => matches!(status, Waiting | Active),
        Sender::Agent => matches!(status, Active),
    }
}
