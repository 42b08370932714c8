//! Error types for the timeline engine and its collaborators.
//!
//! Nothing in the engine is fatal. Invalid input and inconsistent state are
//! recovered where they are detected (the operation becomes a no-op and a
//! warning is logged); environment problems such as a zero-sized viewport
//! short-circuit layout to an empty result.

use std::path::PathBuf;

use uuid::Uuid;

/// Broad classification of a [`TimelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed dates, out-of-range values, unknown ids.
    InvalidInput,
    /// Engine state refers to data the collaborator no longer has.
    InconsistentState,
    /// The surrounding environment cannot support layout (zero-sized panes).
    Environment,
}

/// Errors raised by timeline operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineError {
    /// A date string could not be parsed.
    #[error("invalid date '{input}'")]
    InvalidDate {
        /// The rejected input.
        input: String,
    },

    /// A zoom value was outside the accepted bounds and had to be clamped.
    #[error("zoom {requested}% out of range, clamped to {clamped}%")]
    ZoomOutOfRange { requested: i32, clamped: i32 },

    /// A task id is not part of the current task list.
    #[error("unknown task {0}")]
    UnknownTask(Uuid),

    /// A project id is not part of the current project list.
    #[error("unknown project {0}")]
    UnknownProject(Uuid),

    /// A scroll pane id was never registered.
    #[error("unknown scroll pane {0}")]
    UnknownPane(usize),

    /// Selected ids disappeared from the task list.
    #[error("{count} selected task(s) no longer exist")]
    StaleSelection { count: usize },

    /// The viewport or container has no usable size.
    #[error("viewport has zero size ({width}x{height})")]
    ZeroViewport { width: f32, height: f32 },

    /// Cell width was zero, negative or not a number.
    #[error("cell width {0} is not positive")]
    InvalidCellWidth(f32),
}

impl TimelineError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDate { .. }
            | Self::ZoomOutOfRange { .. }
            | Self::UnknownTask(_)
            | Self::UnknownProject(_)
            | Self::UnknownPane(_) => ErrorKind::InvalidInput,
            Self::StaleSelection { .. } => ErrorKind::InconsistentState,
            Self::ZeroViewport { .. } | Self::InvalidCellWidth(_) => ErrorKind::Environment,
        }
    }
}

/// A specialized Result type for timeline operations.
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Errors raised while loading settings or collaborator data from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}
