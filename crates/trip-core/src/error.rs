//! Input validation errors. Nothing else in the pipeline is allowed to fail.

/// Reasons a planning request is rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("origin must not be empty")]
    EmptyOrigin,
    #[error("destination must not be empty")]
    EmptyDestination,
    #[error("invalid preferred departure time '{0}', expected HH:MM")]
    InvalidDepartureTime(String),
    #[error("hours per day must be between 1 and 24, got {0}")]
    InvalidHoursPerDay(u32),
    #[error("max driving time must be between 1 and 24, got {0}")]
    InvalidMaxDrivingTime(u32),
}

/// Planner tuning that cannot be used as loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("min_score {min} is above max_score {max}")]
    InvertedScoreBounds { min: u8, max: u8 },
}
