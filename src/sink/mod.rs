mod memory;
mod xlsx;

pub use memory::{MemoryPage, MemorySink, RecordedCell};
pub use xlsx::XlsxSink;

use crate::errors::{ExportError, ExportResult};

/// Seam between the export pipeline and a concrete tabular document.
///
/// A sink tracks its own current page; the paginator decides when a new one
/// is opened. Blank cells are never written, so there is no blank
/// operation. Column auto-sizing on `finish_page` is a cosmetic
/// best-effort step: implementations log problems and swallow them.
pub trait DocumentSink {
    /// Open a fresh page and make it current.
    fn open_page(&mut self) -> ExportResult<()>;

    /// Write one header cell (row 0) on the current page.
    fn write_header_cell(&mut self, col: u16, text: &str) -> ExportResult<()>;

    /// Freeze the header row on the current page.
    fn freeze_header_row(&mut self) -> ExportResult<()>;

    /// Write a text cell on the current page.
    fn write_text(&mut self, row: u32, col: u16, text: &str) -> ExportResult<()>;

    /// Write a numeric cell on the current page, applying the sink's money
    /// style when `money` is set.
    fn write_number(&mut self, row: u32, col: u16, value: f64, money: bool) -> ExportResult<()>;

    /// Finalize the current page (auto-size columns, best-effort).
    fn finish_page(&mut self);
}

/// Column indices are u16 on the wire; anything wider than a spreadsheet
/// can hold is a configuration problem, not a panic.
pub(crate) fn cast_col(index: usize) -> ExportResult<u16> {
    u16::try_from(index)
        .map_err(|_| ExportError::InvalidConfig(format!("column index {index} exceeds u16")))
}
