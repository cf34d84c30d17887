//! Session invariant checks.

use debate_client::ConnectionState;

use super::{Invariant, InvariantResult, SessionObservation, Violation};

/// At most one socket is open or opening at any time.
///
/// Also requires at most one pending retry timer: a second timer would mean
/// two sockets once both fire.
pub struct SingleLiveSocket;

impl Invariant for SingleLiveSocket {
    fn name(&self) -> &'static str {
        "single_live_socket"
    }

    fn check(&self, state: &SessionObservation) -> InvariantResult {
        if state.live_sockets > 1 || state.pending_timers > 1 {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{} live sockets, {} pending timers",
                    state.live_sockets, state.pending_timers
                ),
            });
        }
        Ok(())
    }
}

/// The attempt counter never passes the configured budget.
pub struct AttemptsWithinBudget;

impl Invariant for AttemptsWithinBudget {
    fn name(&self) -> &'static str {
        "attempts_within_budget"
    }

    fn check(&self, state: &SessionObservation) -> InvariantResult {
        let attempts = state.snapshot.reconnect_attempts;
        if attempts > state.max_attempts {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{attempts} attempts with a budget of {}", state.max_attempts),
            });
        }
        Ok(())
    }
}

/// `connected` is set exactly when the socket is open.
pub struct ConnectedMeansOpen;

impl Invariant for ConnectedMeansOpen {
    fn name(&self) -> &'static str {
        "connected_means_open"
    }

    fn check(&self, state: &SessionObservation) -> InvariantResult {
        let open = state.snapshot.state == ConnectionState::Open;
        if state.snapshot.connected != open {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "connected={} in state {:?}",
                    state.snapshot.connected, state.snapshot.state
                ),
            });
        }
        Ok(())
    }
}
