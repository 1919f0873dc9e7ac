//! Configuration errors
//!
//! Everything here is fatal at startup. The simulation tick itself never fails.

/// Error raised while loading or validating [`Tuning`](crate::Tuning)
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Boss staircase would contain no offsets
    #[error("Boss pattern is empty (extent {extent}, step {step})")]
    EmptyBossPattern { extent: f32, step: f32 },

    /// Power-up cycle has nothing to hand out
    #[error("Power-up list is empty")]
    EmptyPowerList,

    /// A count that must be at least one was zero
    #[error("{0} must be at least 1")]
    ZeroCount(&'static str),

    /// A duration or interval that must be positive was not
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    /// A speed, spacing or step that must not be negative was
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },

    /// A per-tick chance outside [0, 1]
    #[error("{field} must be a chance between 0 and 1 (got {value})")]
    NotAChance { field: &'static str, value: f64 },

    /// A generator floor sits above its base delay
    #[error("Floor for {kind} ({floor}s) exceeds its base delay ({delay}s)")]
    FloorAboveDelay {
        kind: &'static str,
        floor: f32,
        delay: f32,
    },

    /// Malformed tuning file
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
