//! Error type shared by the model and both solvers.
//!
//! Only conditions that make a run meaningless are errors: an instance in
//! which some device can never be served, or a configuration that cannot
//! drive a search. A trial that fails to place every device, a timeout, or
//! a stagnating search are normal outcomes and are reported through
//! [`TerminationReason`](crate::report::TerminationReason) instead.

/// Errors raised while building an instance or starting a solver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// A device has no gateway it can reach within its maximum SF.
    #[error("device {device} cannot reach any gateway within its maximum spreading factor")]
    NoReachableGateway {
        /// Index of the unreachable device.
        device: usize,
    },

    /// A reachability entry below SF 7.
    #[error("invalid spreading factor {value} for device {device} and gateway {gateway}")]
    InvalidSpreadingFactor {
        /// Device (row) index.
        device: usize,
        /// Gateway (column) index.
        gateway: usize,
        /// Offending value.
        value: u8,
    },

    /// The reachability matrix and the period vector disagree in shape.
    #[error("dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Which input was malformed.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        found: usize,
    },

    /// No SF tier up to 12 lets every device reach a gateway.
    #[error("no spreading-factor tier up to 12 covers every device")]
    NoCoverage,

    /// A device whose only candidate gateway has no capacity left for it.
    #[error("device {device} can only use gateway {gateway}, which has no capacity left")]
    EssentialOverload {
        /// Index of the essential device.
        device: usize,
        /// Its only candidate gateway.
        gateway: usize,
    },

    /// A solver configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias using [`PlanError`].
pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = PlanError::EssentialOverload {
            device: 4,
            gateway: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("device 4"), "{msg}");
        assert!(msg.contains("gateway 2"), "{msg}");

        let err = PlanError::InvalidConfig("population_size must be at least 2".into());
        assert!(err.to_string().contains("population_size"));
    }
}
