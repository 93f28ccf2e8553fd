use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Missing required data fields: {0}")]
    MissingField(String),

    #[error("Please provide {expected}-minute interval data for accurate analysis (sampled interval: {observed})")]
    Interval { expected: u32, observed: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid bar: {0}")]
    InvalidBar(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}

impl EngineError {
    /// Short machine-friendly name of the failure kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::ConfigError(_) => "config",
            EngineError::CsvSystemError { .. } => "csv",
            EngineError::IoError { .. } => "io",
            EngineError::MissingField(_) => "missing_field",
            EngineError::Interval { .. } => "interval",
            EngineError::InsufficientData(_) => "insufficient_data",
            EngineError::Parse(_) => "parse",
            EngineError::InvalidBar(_) => "invalid_bar",
            EngineError::Overflow(_) => "overflow",
        }
    }
}
