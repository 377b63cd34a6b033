use std::time::Instant;

use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::{ExportError, ExportResult};
use crate::mapping::{CellContext, ColumnSet};
use crate::paginate::{Paginator, DEFAULT_ROW_CEILING};
use crate::sink::{cast_col, DocumentSink};
use crate::source::{spawn_records, RecordSource};
use crate::value::{coerce, CellWrite};

/// Default bound of the producer/consumer hand-off channel; a small
/// multiple of a typical fetch batch.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Completion statistics for one export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportStats {
    pub rows_written: u64,
    pub pages: u32,
    pub duration_ms: u64,
}

/// Drives one export: renders records into pages through a [`DocumentSink`]
/// using a declarative [`ColumnSet`], paginating at the row ceiling.
///
/// Bulk mode ([`Exporter::export_slice`]) walks an in-memory slice;
/// streaming mode ([`Exporter::export_stream`]) runs the cursor-driven
/// producer/consumer pipeline until the source is exhausted.
pub struct Exporter<T> {
    columns: ColumnSet<T>,
    ceiling: u32,
    channel_capacity: usize,
}

impl<T> Exporter<T> {
    pub fn new(columns: ColumnSet<T>) -> Self {
        Self {
            columns,
            ceiling: DEFAULT_ROW_CEILING,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Override the per-page data-row ceiling.
    pub fn with_row_ceiling(mut self, ceiling: u32) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Override the hand-off channel capacity for streaming mode.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Bulk mode: export a finite in-memory slice.
    pub fn export_slice(
        &self,
        sink: &mut dyn DocumentSink,
        records: &[T],
    ) -> ExportResult<ExportStats> {
        let started = Instant::now();
        let headers = self.columns.headers();
        let mut paginator = Paginator::new(self.ceiling)?;
        paginator.begin(sink, &headers)?;

        for record in records {
            let row = paginator.next_row(sink, &headers)?;
            self.render_row(sink, record, row)?;
        }

        paginator.finish(sink);
        Ok(self.complete(&paginator, started))
    }

    /// Streaming mode: run the full producer/consumer pipeline until the
    /// source reports an empty batch. Records are rendered in the exact
    /// order the producer fetched them; a fetch error aborts the export.
    pub async fn export_stream<S>(
        &self,
        sink: &mut dyn DocumentSink,
        source: S,
    ) -> ExportResult<ExportStats>
    where
        T: Send + 'static,
        S: RecordSource<T> + 'static,
    {
        if self.channel_capacity == 0 {
            return Err(ExportError::InvalidConfig(
                "channel capacity must be at least 1".to_string(),
            ));
        }

        let started = Instant::now();
        let headers = self.columns.headers();
        let mut paginator = Paginator::new(self.ceiling)?;
        paginator.begin(sink, &headers)?;

        let mut rx = spawn_records(source, self.channel_capacity);
        while let Some(item) = rx.recv().await {
            let record = item?;
            let row = paginator.next_row(sink, &headers)?;
            self.render_row(sink, &record, row)?;
        }

        paginator.finish(sink);
        Ok(self.complete(&paginator, started))
    }

    /// Render one record into one physical row, column by column in
    /// registration order. Blank cells skip styling and the customizer;
    /// for everything else the customizer (if any) runs last and has the
    /// final word on the cell.
    fn render_row(&self, sink: &mut dyn DocumentSink, record: &T, row: u32) -> ExportResult<()> {
        for (idx, column) in self.columns.iter().enumerate() {
            let col = cast_col(idx)?;
            let value = column.extract(record);
            match coerce(value.as_ref(), column.is_money()) {
                CellWrite::Blank => continue,
                CellWrite::Number { value, money } => sink.write_number(row, col, value, money)?,
                CellWrite::Text(text) => sink.write_text(row, col, &text)?,
            }
            let mut ctx = CellContext {
                sink: &mut *sink,
                record,
                row,
                col,
            };
            column.customize(&mut ctx);
        }
        Ok(())
    }

    fn complete(&self, paginator: &Paginator, started: Instant) -> ExportStats {
        let stats = ExportStats {
            rows_written: paginator.rows_written(),
            pages: paginator.pages(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "export complete: {} rows across {} pages in {}ms",
            stats.rows_written, stats.pages, stats.duration_ms
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::sink::{MemorySink, RecordedCell};
    use crate::value::Value;

    #[derive(Clone)]
    struct Payment {
        name: String,
        cents: i64,
        note: Option<String>,
    }

    fn payment(name: &str, cents: i64) -> Payment {
        Payment {
            name: name.to_string(),
            cents,
            note: None,
        }
    }

    fn name_and_amount_columns() -> ColumnSet<Payment> {
        let mut columns = ColumnSet::new();
        columns.add_mapping("Name", |p: &Payment| Some(Value::from(p.name.clone())), false);
        columns.add_mapping("Amount", |p: &Payment| Some(Value::Int(p.cents)), true);
        columns
    }

    #[test]
    fn single_record_end_to_end() {
        let exporter = Exporter::new(name_and_amount_columns());
        let mut sink = MemorySink::new();
        let stats = exporter
            .export_slice(&mut sink, &[payment("Alice", 250)])
            .unwrap();

        assert_eq!(stats.rows_written, 1);
        assert_eq!(stats.pages, 1);

        let page = &sink.pages()[0];
        assert_eq!(page.header, vec!["Name", "Amount"]);
        assert!(page.frozen);
        assert!(page.finished);
        assert_eq!(
            page.cells.get(&(1, 0)),
            Some(&RecordedCell::Text("Alice".to_string()))
        );
        assert_eq!(
            page.cells.get(&(1, 1)),
            Some(&RecordedCell::Number {
                value: 2.5,
                money: true
            })
        );
    }

    #[test]
    fn ceiling_plus_one_records_split_across_two_pages() {
        let exporter = Exporter::new(name_and_amount_columns()).with_row_ceiling(3);
        let mut sink = MemorySink::new();
        let records: Vec<Payment> = (0..4).map(|i| payment(&format!("r{i}"), i * 100)).collect();
        let stats = exporter.export_slice(&mut sink, &records).unwrap();

        assert_eq!(stats.pages, 2);
        assert_eq!(sink.pages().len(), 2);

        let first = &sink.pages()[0];
        let second = &sink.pages()[1];
        assert_eq!(first.header, second.header);
        // Rows 0..2 stay on page 1; the ceiling-th record opens page 2.
        assert_eq!(
            first.cells.get(&(3, 0)),
            Some(&RecordedCell::Text("r2".to_string()))
        );
        assert_eq!(
            second.cells.get(&(1, 0)),
            Some(&RecordedCell::Text("r3".to_string()))
        );
        assert!(first.finished);
        assert!(second.finished);
    }

    #[test]
    fn null_extraction_leaves_cell_blank_and_skips_customizer() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = invocations.clone();

        let mut columns: ColumnSet<Payment> = ColumnSet::new();
        columns.add_mapping_with(
            "Note",
            |p: &Payment| p.note.clone().map(Value::from),
            false,
            move |_ctx: &mut CellContext<'_, Payment>| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        let exporter = Exporter::new(columns);
        let mut sink = MemorySink::new();
        exporter
            .export_slice(&mut sink, &[payment("Alice", 0)])
            .unwrap();

        assert_eq!(invocations.load(Ordering::SeqCst), 0);
        assert!(sink.pages()[0].cells.is_empty());
    }

    #[test]
    fn customizer_has_the_last_word_on_the_cell() {
        let mut columns: ColumnSet<Payment> = ColumnSet::new();
        columns.add_mapping_with(
            "Name",
            |p: &Payment| Some(Value::from(p.name.clone())),
            false,
            |ctx: &mut CellContext<'_, Payment>| {
                let replacement = format!("{}!", ctx.record.name);
                ctx.sink.write_text(ctx.row, ctx.col, &replacement).unwrap();
            },
        );

        let exporter = Exporter::new(columns);
        let mut sink = MemorySink::new();
        exporter
            .export_slice(&mut sink, &[payment("Alice", 0)])
            .unwrap();

        assert_eq!(
            sink.pages()[0].cells.get(&(1, 0)),
            Some(&RecordedCell::Text("Alice!".to_string()))
        );
    }

    #[test]
    fn money_string_column_is_parsed_or_passed_through() {
        let mut columns: ColumnSet<Payment> = ColumnSet::new();
        columns.add_mapping("Raw", |p: &Payment| Some(Value::from(p.name.clone())), true);

        let exporter = Exporter::new(columns);
        let mut sink = MemorySink::new();
        exporter
            .export_slice(&mut sink, &[payment("42.5", 0), payment("abc", 0)])
            .unwrap();

        let page = &sink.pages()[0];
        assert_eq!(
            page.cells.get(&(1, 0)),
            Some(&RecordedCell::Number {
                value: 42.5,
                money: true
            })
        );
        assert_eq!(
            page.cells.get(&(2, 0)),
            Some(&RecordedCell::Text("abc".to_string()))
        );
    }

    /// Streams payments in fixed batches with an artificial inter-batch
    /// delay, cursoring on the row offset.
    struct PaymentSource {
        batches: Vec<Vec<Payment>>,
        call: usize,
        delay: Duration,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl RecordSource<Payment> for PaymentSource {
        type Cursor = i64;

        async fn fetch(&mut self, _cursor: Option<i64>) -> ExportResult<Vec<Payment>> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let call = self.call;
            self.call += 1;
            if self.fail_after == Some(call) {
                return Err(ExportError::Fetch("cursor query failed".to_string()));
            }
            Ok(self.batches.get(call).cloned().unwrap_or_default())
        }

        fn next_cursor(&self, last: &Payment) -> i64 {
            last.cents
        }
    }

    #[tokio::test]
    async fn streaming_export_preserves_batch_order() {
        let _ = env_logger::try_init();
        let source = PaymentSource {
            batches: vec![
                vec![payment("r1", 100), payment("r2", 200)],
                vec![payment("r3", 300)],
            ],
            call: 0,
            delay: Duration::from_millis(15),
            fail_after: None,
        };

        let exporter = Exporter::new(name_and_amount_columns());
        let mut sink = MemorySink::new();
        let stats = exporter.export_stream(&mut sink, source).await.unwrap();

        assert_eq!(stats.rows_written, 3);
        assert_eq!(stats.pages, 1);
        let page = &sink.pages()[0];
        for (row, expected) in [(1, "r1"), (2, "r2"), (3, "r3")] {
            assert_eq!(
                page.cells.get(&(row, 0)),
                Some(&RecordedCell::Text(expected.to_string()))
            );
        }
    }

    #[tokio::test]
    async fn streaming_export_paginates_like_bulk_mode() {
        let source = PaymentSource {
            batches: vec![
                vec![payment("a", 1), payment("b", 2)],
                vec![payment("c", 3)],
            ],
            call: 0,
            delay: Duration::ZERO,
            fail_after: None,
        };

        let exporter = Exporter::new(name_and_amount_columns()).with_row_ceiling(2);
        let mut sink = MemorySink::new();
        let stats = exporter.export_stream(&mut sink, source).await.unwrap();

        assert_eq!(stats.pages, 2);
        assert_eq!(
            sink.pages()[1].cells.get(&(1, 0)),
            Some(&RecordedCell::Text("c".to_string()))
        );
    }

    #[tokio::test]
    async fn fetch_failure_aborts_the_streaming_export() {
        let source = PaymentSource {
            batches: vec![vec![payment("a", 1)]],
            call: 0,
            delay: Duration::ZERO,
            fail_after: Some(1),
        };

        let exporter = Exporter::new(name_and_amount_columns());
        let mut sink = MemorySink::new();
        let result = exporter.export_stream(&mut sink, source).await;
        assert!(matches!(result, Err(ExportError::Fetch(_))));
        // The prefix fetched before the failure was still rendered.
        assert_eq!(
            sink.pages()[0].cells.get(&(1, 0)),
            Some(&RecordedCell::Text("a".to_string()))
        );
    }

    #[tokio::test]
    async fn zero_channel_capacity_is_rejected_before_spawning() {
        let source = PaymentSource {
            batches: vec![],
            call: 0,
            delay: Duration::ZERO,
            fail_after: None,
        };

        let exporter = Exporter::new(name_and_amount_columns()).with_channel_capacity(0);
        let mut sink = MemorySink::new();
        let result = exporter.export_stream(&mut sink, source).await;
        assert!(matches!(result, Err(ExportError::InvalidConfig(_))));
        assert!(sink.pages().is_empty());
    }
}
