//! Streaming record-to-spreadsheet export.
//!
//! Exports an arbitrarily large, possibly paginated, collection of typed
//! records into a multi-page workbook using a declarative column mapping
//! instead of per-record formatting code. The pipeline is:
//!
//! ```text
//! RecordSource -> bounded channel -> Exporter -> Paginator -> DocumentSink
//! ```
//!
//! A background producer task pulls successive batches from a cursor-driven
//! [`source::RecordSource`], the [`exporter::Exporter`] drains the channel
//! and renders one row per record (type-directed coercion, money scaling,
//! date formatting), and the [`paginate::Paginator`] splits output across
//! pages of at most [`paginate::DEFAULT_ROW_CEILING`] data rows, replicating
//! the header row on each page.
//!
//! ```no_run
//! use sheet_export::{ColumnSet, Exporter, Value, XlsxSink};
//!
//! struct Payment { name: String, cents: i64 }
//!
//! let mut columns = ColumnSet::new();
//! columns.add_mapping("Name", |p: &Payment| Some(Value::from(p.name.clone())), false);
//! columns.add_mapping("Amount", |p: &Payment| Some(Value::Int(p.cents)), true);
//!
//! let exporter = Exporter::new(columns);
//! let mut sink = XlsxSink::new();
//! exporter.export_slice(&mut sink, &[Payment { name: "Alice".into(), cents: 250 }])?;
//! sink.save("payments.xlsx")?;
//! # Ok::<(), sheet_export::ExportError>(())
//! ```

pub mod errors;
pub mod exporter;
pub mod mapping;
pub mod paginate;
pub mod sink;
pub mod source;
pub mod value;

pub use errors::{ExportError, ExportResult};
pub use exporter::{Exporter, ExportStats, DEFAULT_CHANNEL_CAPACITY};
pub use mapping::{CellContext, ColumnMapping, ColumnSet};
pub use paginate::{Paginator, DEFAULT_ROW_CEILING};
pub use sink::{DocumentSink, MemoryPage, MemorySink, RecordedCell, XlsxSink};
pub use source::{spawn_records, RecordSource};
pub use value::{coerce, CellWrite, Value};
