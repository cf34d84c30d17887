//! Deterministic simulation harness for debate session clients.
//!
//! Virtual-time implementations of the Environment and Driver traits for
//! reproducible tests of reconnect timing and socket lifecycles without a
//! network.
//!
//! # Async Simulation
//!
//! [`SimEnv`] reads tokio's clock, so under `#[tokio::test(start_paused =
//! true)]` every reconnect delay elapses instantly. [`SimDriver`] runs the
//! real [`debate_client::Runtime`] against sockets scripted through a
//! [`SimNetwork`] handle.
//!
//! # Synchronous Simulation
//!
//! [`SimSession`] executes a [`debate_client::SessionClient`]'s actions
//! in-line on a manual clock. Property tests use it to drive thousands of
//! event sequences cheaply.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold after every
//! step. Use [`InvariantRegistry::standard()`] for the session invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod recorder;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_session;

pub use invariants::{
    AttemptsWithinBudget, ConnectedMeansOpen, Invariant, InvariantRegistry, InvariantResult,
    SessionObservation, SingleLiveSocket, Violation,
};
pub use recorder::{EventLog, RecordingListener};
pub use sim_driver::{SimDriver, SimDriverError, SimNetwork};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_session::SimSession;
