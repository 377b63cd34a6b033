use crate::errors::{ExportError, ExportResult};
use crate::sink::{cast_col, DocumentSink};

/// Maximum data rows per page before a new page is opened.
pub const DEFAULT_ROW_CEILING: u32 = 1_000_000;

/// Tracks the running row index across pages and opens a new page with a
/// replicated header row whenever the row ceiling is reached.
///
/// Physical row 0 of every page is reserved for the header; records land
/// on rows 1..=ceiling.
pub struct Paginator {
    ceiling: u32,
    next_index: u64,
    pages: u32,
}

impl Paginator {
    pub fn new(ceiling: u32) -> ExportResult<Self> {
        if ceiling == 0 {
            return Err(ExportError::InvalidConfig(
                "row ceiling must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            ceiling,
            next_index: 0,
            pages: 0,
        })
    }

    /// Open the first page and emit its header row. Called once, before
    /// any record is written.
    pub fn begin(&mut self, sink: &mut dyn DocumentSink, headers: &[&str]) -> ExportResult<()> {
        self.emit_page(sink, headers)
    }

    /// Reserve the physical row for the next record, rolling over to a new
    /// page (finalizing the current one) when the ceiling is hit. The very
    /// first record never triggers a rollover.
    pub fn next_row(&mut self, sink: &mut dyn DocumentSink, headers: &[&str]) -> ExportResult<u32> {
        let local = (self.next_index % u64::from(self.ceiling)) as u32;
        if self.next_index > 0 && local == 0 {
            sink.finish_page();
            self.emit_page(sink, headers)?;
        }
        self.next_index += 1;
        Ok(local + 1)
    }

    /// Finalize the last page. Called exactly once, after the stream is
    /// exhausted.
    pub fn finish(&mut self, sink: &mut dyn DocumentSink) {
        sink.finish_page();
    }

    pub fn rows_written(&self) -> u64 {
        self.next_index
    }

    pub fn pages(&self) -> u32 {
        self.pages
    }

    fn emit_page(&mut self, sink: &mut dyn DocumentSink, headers: &[&str]) -> ExportResult<()> {
        sink.open_page()?;
        for (idx, header) in headers.iter().enumerate() {
            sink.write_header_cell(cast_col(idx)?, header)?;
        }
        sink.freeze_header_row()?;
        self.pages += 1;
        Ok(())
    }
}
