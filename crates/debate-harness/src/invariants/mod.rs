//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during execution. Unlike
//! example-based tests that check specific scenarios, invariants verify
//! behavioral properties across all execution paths.
//!
//! # Architecture
//!
//! Each step of a simulation is summarized as a [`SessionObservation`]: the
//! client's [`SessionSnapshot`] plus what the simulated network saw. The
//! registered [`Invariant`] checks run against it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.assert_all(&session.observe(), "after close");
//! ```

mod checks;

use debate_client::SessionSnapshot;

pub use checks::{AttemptsWithinBudget, ConnectedMeansOpen, SingleLiveSocket};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Observable state after one simulation step.
#[derive(Debug, Clone)]
pub struct SessionObservation {
    /// Client view.
    pub snapshot: SessionSnapshot,
    /// Sockets the network considers open or opening.
    pub live_sockets: usize,
    /// Retry timers scheduled and neither fired nor cancelled.
    pub pending_timers: usize,
    /// Configured reconnect budget.
    pub max_attempts: u32,
}

/// An invariant that can be checked against an observation.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant.
    fn check(&self, state: &SessionObservation) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the session invariants.
    ///
    /// Includes:
    /// - [`SingleLiveSocket`]: at most one socket open or opening
    /// - [`AttemptsWithinBudget`]: retries never exceed the budget
    /// - [`ConnectedMeansOpen`]: connected flag agrees with the state
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(SingleLiveSocket);
        registry.add(AttemptsWithinBudget);
        registry.add(ConnectedMeansOpen);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants, collecting every violation.
    pub fn check_all(&self, state: &SessionObservation) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SessionObservation, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
