use thiserror::Error;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input file not found: {0}")]
    InputMissing(String),

    #[error("Required column `{column}` missing from {file}")]
    MissingColumn { file: String, column: String },

    #[error("CSV read error in {file}: {message}")]
    Csv { file: String, message: String },

    #[error(
        "{invalid} of {total} rows in {file} have unparseable dates \
         (exceeds configured limit of {limit_pct:.0}%)"
    )]
    TooManyInvalidDates {
        file: String,
        invalid: usize,
        total: usize,
        limit_pct: f64,
    },

    #[error("Workbook render error: {0}")]
    Render(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
