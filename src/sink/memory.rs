use std::collections::BTreeMap;

use crate::errors::{ExportError, ExportResult};
use crate::sink::DocumentSink;

/// What was written to one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCell {
    Text(String),
    Number { value: f64, money: bool },
}

/// One recorded page: header row plus data cells keyed by (row, col).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryPage {
    pub header: Vec<String>,
    pub cells: BTreeMap<(u32, u16), RecordedCell>,
    pub frozen: bool,
    pub finished: bool,
}

/// In-memory sink that records every write. Useful for dry runs and for
/// asserting export output in tests without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemorySink {
    pages: Vec<MemoryPage>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[MemoryPage] {
        &self.pages
    }

    fn current_mut(&mut self) -> ExportResult<&mut MemoryPage> {
        self.pages.last_mut().ok_or(ExportError::NoPage)
    }
}

impl DocumentSink for MemorySink {
    fn open_page(&mut self) -> ExportResult<()> {
        self.pages.push(MemoryPage::default());
        Ok(())
    }

    fn write_header_cell(&mut self, col: u16, text: &str) -> ExportResult<()> {
        let page = self.current_mut()?;
        let idx = usize::from(col);
        if page.header.len() <= idx {
            page.header.resize(idx + 1, String::new());
        }
        page.header[idx] = text.to_string();
        Ok(())
    }

    fn freeze_header_row(&mut self) -> ExportResult<()> {
        self.current_mut()?.frozen = true;
        Ok(())
    }

    fn write_text(&mut self, row: u32, col: u16, text: &str) -> ExportResult<()> {
        self.current_mut()?
            .cells
            .insert((row, col), RecordedCell::Text(text.to_string()));
        Ok(())
    }

    fn write_number(&mut self, row: u32, col: u16, value: f64, money: bool) -> ExportResult<()> {
        self.current_mut()?
            .cells
            .insert((row, col), RecordedCell::Number { value, money });
        Ok(())
    }

    fn finish_page(&mut self) {
        if let Some(page) = self.pages.last_mut() {
            page.finished = true;
        }
    }
}
