use thiserror::Error;

/// Everything that can go wrong while building, filling or querying a
/// histogram. Observations that land outside every bin are not errors and
/// never show up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistError {
    /// `fill` or `at` was called with the wrong number of coordinates.
    #[error("number of arguments {got} != histogram rank {rank}")]
    ArgumentCount { got: usize, rank: usize },

    /// A coordinate could not be interpreted by the axis it was routed to.
    #[error("{axis}: cannot convert argument of type {found} to {expected}")]
    ArgumentType {
        axis: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// The storage cell has no update for the requested argument role.
    #[error("{cell} does not accept a {role} argument")]
    UnsupportedRole {
        cell: &'static str,
        role: &'static str,
    },

    /// A sample carried the wrong number of values for its cell.
    #[error("sample expects {expected} values, got {got}")]
    SampleArity { expected: usize, got: usize },

    /// More than one weight or more than one sample in a single fill.
    #[error("more than one {0} argument in a single fill")]
    DuplicateRole(&'static str),

    /// `at` was asked for a bin the axis does not have.
    #[error("bin index {index} out of range for axis {axis} with {size} bins")]
    IndexOutOfRange { axis: usize, index: i32, size: usize },

    /// A fixed-capacity storage was asked to hold more cells than it can.
    #[error("cannot hold {requested} cells, capacity is {capacity}")]
    Capacity { requested: usize, capacity: usize },

    #[error("a histogram needs at least one axis")]
    NoAxes,

    #[error("axes of both histograms must be equal")]
    AxesMismatch,

    #[error("storage holds {cells} cells but the axes require {expected}")]
    StorageSize { cells: usize, expected: usize },

    #[error("invalid axis: {0}")]
    InvalidAxis(String),
}

/// Result type for histogram operations.
pub type Result<T> = std::result::Result<T, HistError>;
