use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot convert an empty time series")]
    EmptySeries,

    #[error("channel {0} has no samples")]
    EmptyChannel(String),

    #[error("{what} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{path:?} has no column named {column}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path:?} row {row} column {column}: invalid value {value:?}")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("channel {0} contains duplicate timestamps; cannot align by time")]
    DuplicateTimestamps(String),

    #[error("no common timestamps between {0}")]
    NoOverlap(String),

    #[error("unknown channel {0}")]
    UnknownChannel(String),

    #[error("no default analysis named {0}")]
    UnknownAnalysis(String),

    #[error("failed to read {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Config invalid: {0}")]
    ConfigInvalid(String),
    #[error("Failed to load config: {}", .source)]
    ConfigLoad {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("time error: {0}")]
    Time(String),

    #[error("failed to render plot: {0}")]
    Plot(String),
}

impl<E: std::error::Error + Send + Sync + 'static>
    From<plotters::drawing::DrawingAreaErrorKind<E>> for Error
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        Error::Plot(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
