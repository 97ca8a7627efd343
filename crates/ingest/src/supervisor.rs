//! Request outcome state machine for the timeout backstop.
//!
//! The deadline timer is blunt, not cooperative: the pipeline keeps
//! running after it fires. The supervisor decides which side owns the
//! response so a late completion never double-responds.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Running,
    Completed,
    TimedOut,
}

/// Shared between the pipeline task and its deadline timer.
///
/// Transitions: Running → Completed, Running → TimedOut. TimedOut is
/// terminal; a completion arriving after the deadline loses the race
/// and must discard its result.
#[derive(Debug)]
pub struct RequestSupervisor {
    state: Mutex<RequestState>,
}

impl RequestSupervisor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RequestState::Running),
        }
    }

    pub fn state(&self) -> RequestState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim the response for the pipeline. Returns false when the
    /// deadline already fired; the caller must drop its result.
    pub fn try_complete(&self) -> bool {
        self.transition(RequestState::Completed)
    }

    /// Claim the response for the deadline timer. Returns false when
    /// the pipeline already finished.
    pub fn try_timeout(&self) -> bool {
        self.transition(RequestState::TimedOut)
    }

    fn transition(&self, next: RequestState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == RequestState::Running {
            *state = next;
            true
        } else {
            false
        }
    }
}

impl Default for RequestSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
