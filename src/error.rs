use std::fmt::{self, Display};
use std::io;

/// The error type for everything that can go wrong in this crate, from
/// parameter definition through scenario loading to integration.
///
/// All failures are surfaced to the caller through `Result`; the crate never
/// logs-and-swallows an error.
#[derive(Debug)]
pub enum SeirError {
    /// A parameter was defined with `min > max`, with an explicit default
    /// outside `[min, max]`, or the model was configured with an impossible
    /// value (e.g. a zero population). These are programming errors in the
    /// caller's definitions, not runtime conditions.
    InvalidBounds(String),
    /// A second definition of a name that is already in the registry.
    /// Registries are write-once per identifier.
    DuplicateParam(String),
    /// `update()` (or a scenario override) named a parameter outside the
    /// registry's tunable set: either unknown entirely, or a constant.
    UnknownParam(String),
    /// The ODE driver exhausted its step/tolerance budget or the state went
    /// non-finite. Out-of-range parameter combinations (e.g. negative rates
    /// pushed in through `update`) are the most likely cause.
    Integration(String),
    Io(io::Error),
    Json(serde_json::Error),
}

impl From<io::Error> for SeirError {
    fn from(error: io::Error) -> Self {
        SeirError::Io(error)
    }
}

impl From<serde_json::Error> for SeirError {
    fn from(error: serde_json::Error) -> Self {
        SeirError::Json(error)
    }
}

impl Display for SeirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeirError::InvalidBounds(msg) => write!(f, "invalid parameter bounds: {msg}"),
            SeirError::DuplicateParam(name) => {
                write!(f, "parameter '{name}' is already defined")
            }
            SeirError::UnknownParam(name) => {
                write!(f, "'{name}' is not a tunable parameter of this model")
            }
            SeirError::Integration(msg) => write!(f, "integration failed: {msg}"),
            SeirError::Io(error) => write!(f, "{error}"),
            SeirError::Json(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for SeirError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SeirError::Io(error) => Some(error),
            SeirError::Json(error) => Some(error),
            _ => None,
        }
    }
}
