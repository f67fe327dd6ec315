//! Session lifecycle phases.

use std::sync::atomic::{AtomicU8, Ordering};

/// Where a session is in its life.
///
/// Phases only move forward. `Terminated` is absorbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SessionPhase {
    /// Accepted, id issued, greeting not yet fully enqueued.
    Joining = 0,
    /// Greeted and announced; relaying reports.
    Active = 1,
    /// Removed from the registry; close signal issued.
    Disconnecting = 2,
    /// Both pumps have stopped.
    Terminated = 3,
}

impl SessionPhase {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Joining,
            1 => Self::Active,
            2 => Self::Disconnecting,
            _ => Self::Terminated,
        }
    }
}

/// Shared, lock-free phase cell written by the coordinator and the actor.
#[derive(Debug)]
pub struct SessionStatus {
    phase: AtomicU8,
}

impl SessionStatus {
    /// A new status in [`SessionPhase::Joining`].
    pub const fn new() -> Self {
        Self {
            phase: AtomicU8::new(SessionPhase::Joining as u8),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Move to `next` if it is later than the current phase.
    ///
    /// Returns `false` when the status was already at or past `next`.
    pub fn advance(&self, next: SessionPhase) -> bool {
        self.phase
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (next as u8 > current).then_some(next as u8)
            })
            .is_ok()
    }

    /// Whether the session has not yet started disconnecting.
    pub fn is_live(&self) -> bool {
        self.phase() < SessionPhase::Disconnecting
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_joining() {
        let status = SessionStatus::new();
        assert_eq!(status.phase(), SessionPhase::Joining);
        assert!(status.is_live());
    }

    #[test]
    fn advances_in_order() {
        let status = SessionStatus::new();
        assert!(status.advance(SessionPhase::Active));
        assert!(status.advance(SessionPhase::Disconnecting));
        assert!(!status.is_live());
        assert!(status.advance(SessionPhase::Terminated));
        assert_eq!(status.phase(), SessionPhase::Terminated);
    }

    #[test]
    fn never_moves_backwards() {
        let status = SessionStatus::new();
        assert!(status.advance(SessionPhase::Disconnecting));
        assert!(!status.advance(SessionPhase::Active));
        assert!(!status.advance(SessionPhase::Disconnecting));
        assert_eq!(status.phase(), SessionPhase::Disconnecting);
    }

    #[test]
    fn terminated_is_absorbing() {
        let status = SessionStatus::new();
        assert!(status.advance(SessionPhase::Terminated));
        for phase in [
            SessionPhase::Joining,
            SessionPhase::Active,
            SessionPhase::Disconnecting,
            SessionPhase::Terminated,
        ] {
            assert!(!status.advance(phase));
        }
        assert_eq!(status.phase(), SessionPhase::Terminated);
    }
}
