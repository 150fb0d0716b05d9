use thiserror::Error;

/// Failure to turn a report's content into canonical coverage files.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input contains no marker the format recognizes.
    #[error("no {format} coverage data found")]
    MissingMarker { format: &'static str },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Violations of the canonical model's construction rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("source file path must not be empty")]
    EmptyPath,

    #[error("line numbers are 1-based, got 0 in '{path}'")]
    ZeroLine { path: String },

    #[error("line {line} of '{path}' is beyond its {line_count} lines")]
    LineOutOfRange {
        path: String,
        line: u32,
        line_count: u32,
    },

    #[error("line {line} of '{path}' exceeds the supported maximum of {max}")]
    LineTooLarge { path: String, line: u32, max: u32 },

    #[error("payload carries both git data and a commit sha")]
    ConflictingProvenance,
}

/// Classified failure for a single coverage source.
#[derive(Error, Debug)]
pub enum LoadCoverageFilesError {
    #[error("input file not found")]
    InputFileNotFound,

    #[error("mode not supported")]
    ModeNotSupported,

    #[error("failed to parse input: {0}")]
    Parse(#[source] ParseError),

    #[error("unknown error finding files")]
    UnknownFilesMissingError,
}

/// A user-facing failure of a publish run.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("{0}")]
    Coverage(String),

    #[error("{0}")]
    Upload(String),
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;
