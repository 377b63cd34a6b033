use thiserror::Error;

/// Errors surfaced by the export pipeline.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("workbook error: {0}")]
    Document(#[from] rust_xlsxwriter::XlsxError),

    #[error("source fetch failed: {0}")]
    Fetch(String),

    #[error("no page is open")]
    NoPage,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
