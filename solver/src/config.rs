//! Tuning knobs for a solve.

use tilewave_core::ConfigurationError;
use tilewave_system_contradiction::RepairStrategy;
use tilewave_system_propagation::PropagationBudget;

/// Repairs allowed before a solve is declared unsatisfiable.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 10_000;

/// Settings controlling propagation depth, repair and give-up behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// Work allowed per propagation call.
    pub propagation: PropagationBudget,
    /// How contradictions are repaired.
    pub repair: RepairStrategy,
    /// Repairs allowed before giving up; `None` retries forever.
    pub max_attempts: Option<u64>,
}

impl SolverConfig {
    /// Rejects settings no solve could run with.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.repair.validate()
    }

    /// Same settings with propagation run to a fixpoint.
    #[must_use]
    pub fn with_fixpoint_propagation(mut self) -> Self {
        self.propagation = PropagationBudget::Fixpoint;
        self
    }

    /// Same settings with a different attempt ceiling.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Same settings with a different repair strategy.
    #[must_use]
    pub fn with_repair(mut self, repair: RepairStrategy) -> Self {
        self.repair = repair;
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            propagation: PropagationBudget::default(),
            repair: RepairStrategy::default(),
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
        }
    }
}
