use std::path::Path;

use log::warn;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::errors::{ExportError, ExportResult};
use crate::sink::DocumentSink;

/// Default currency symbol for the money cell style.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "¥";

/// Sink backed by a `rust_xlsxwriter` workbook.
///
/// Each instance owns its header and money formats, so concurrent exports
/// never share style state. Call [`XlsxSink::save`] after the export
/// completes to flush the workbook to disk.
pub struct XlsxSink {
    workbook: Workbook,
    fmt_header: Format,
    fmt_money: Format,
    pages: usize,
}

impl Default for XlsxSink {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxSink {
    pub fn new() -> Self {
        Self::with_currency_symbol(DEFAULT_CURRENCY_SYMBOL)
    }

    /// Build a sink whose money cells use the given currency symbol.
    pub fn with_currency_symbol(symbol: &str) -> Self {
        let fmt_header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        let fmt_money = Format::new()
            .set_num_format(money_number_format(symbol))
            .set_align(FormatAlign::VerticalCenter);
        Self {
            workbook: Workbook::new(),
            fmt_header,
            fmt_money,
            pages: 0,
        }
    }

    /// Number of pages opened so far.
    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Persist the workbook. Consumes the sink.
    pub fn save<P: AsRef<Path>>(mut self, path: P) -> ExportResult<()> {
        self.workbook.save(path.as_ref())?;
        Ok(())
    }

    fn current<'a>(workbook: &'a mut Workbook, pages: usize) -> ExportResult<&'a mut Worksheet> {
        if pages == 0 {
            return Err(ExportError::NoPage);
        }
        Ok(workbook.worksheet_from_index(pages - 1)?)
    }
}

impl DocumentSink for XlsxSink {
    fn open_page(&mut self) -> ExportResult<()> {
        self.workbook.add_worksheet();
        self.pages += 1;
        Ok(())
    }

    fn write_header_cell(&mut self, col: u16, text: &str) -> ExportResult<()> {
        let worksheet = Self::current(&mut self.workbook, self.pages)?;
        worksheet.write_string_with_format(0, col, text, &self.fmt_header)?;
        Ok(())
    }

    fn freeze_header_row(&mut self) -> ExportResult<()> {
        let worksheet = Self::current(&mut self.workbook, self.pages)?;
        worksheet.set_freeze_panes(1, 0)?;
        Ok(())
    }

    fn write_text(&mut self, row: u32, col: u16, text: &str) -> ExportResult<()> {
        let worksheet = Self::current(&mut self.workbook, self.pages)?;
        worksheet.write_string(row, col, text)?;
        Ok(())
    }

    fn write_number(&mut self, row: u32, col: u16, value: f64, money: bool) -> ExportResult<()> {
        let worksheet = Self::current(&mut self.workbook, self.pages)?;
        if money {
            worksheet.write_number_with_format(row, col, value, &self.fmt_money)?;
        } else {
            worksheet.write_number(row, col, value)?;
        }
        Ok(())
    }

    fn finish_page(&mut self) {
        // Cosmetic only; a failure here must never abort the export.
        match Self::current(&mut self.workbook, self.pages) {
            Ok(worksheet) => {
                worksheet.autofit();
            }
            Err(err) => warn!("column auto-size skipped: {err}"),
        }
    }
}

/// Accounting-style number format built around a currency symbol.
fn money_number_format(symbol: &str) -> String {
    format!("_ {symbol}* #,##0.00_ ;_ {symbol}* -#,##0.00_ ;_ {symbol}* \"-\"??_ ;_ @_ ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_format_embeds_symbol_in_all_sections() {
        let format = money_number_format("$");
        assert_eq!(format.matches('$').count(), 3);
        assert!(format.contains("#,##0.00"));
    }

    #[test]
    fn workbook_round_trip_writes_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.xlsx");

        let mut sink = XlsxSink::new();
        sink.open_page().unwrap();
        sink.write_header_cell(0, "Name").unwrap();
        sink.write_header_cell(1, "Amount").unwrap();
        sink.freeze_header_row().unwrap();
        sink.write_text(1, 0, "Alice").unwrap();
        sink.write_number(1, 1, 2.5, true).unwrap();
        sink.finish_page();
        assert_eq!(sink.page_count(), 1);

        sink.save(&path).unwrap();
        let written = std::fs::metadata(&path).unwrap().len();
        assert!(written > 0);
    }

    #[test]
    fn writes_without_a_page_fail() {
        let mut sink = XlsxSink::new();
        assert!(matches!(
            sink.write_text(1, 0, "x"),
            Err(ExportError::NoPage)
        ));
    }
}
