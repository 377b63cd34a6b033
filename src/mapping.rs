use crate::sink::DocumentSink;
use crate::value::Value;

/// Scoped view handed to a column customizer after its cell is written.
///
/// The sink reference targets the page the cell lives on; anything the
/// customizer writes is the last word on that cell's final state. The
/// context is only valid for the duration of the customizer call.
pub struct CellContext<'a, T> {
    pub sink: &'a mut dyn DocumentSink,
    pub record: &'a T,
    pub row: u32,
    pub col: u16,
}

type Extractor<T> = Box<dyn Fn(&T) -> Option<Value> + Send + Sync>;
type Customizer<T> = Box<dyn Fn(&mut CellContext<'_, T>) + Send + Sync>;

/// One output column: header text, value extractor, money flag and an
/// optional per-cell customizer. Immutable once registered.
pub struct ColumnMapping<T> {
    header: String,
    extractor: Extractor<T>,
    money: bool,
    customizer: Option<Customizer<T>>,
}

impl<T> ColumnMapping<T> {
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn is_money(&self) -> bool {
        self.money
    }

    pub fn extract(&self, record: &T) -> Option<Value> {
        (self.extractor)(record)
    }

    pub fn customize(&self, ctx: &mut CellContext<'_, T>) {
        if let Some(customizer) = &self.customizer {
            customizer(ctx);
        }
    }
}

/// Insertion-ordered set of column mappings for one export definition.
///
/// Registration order determines column order in the output. Headers are
/// not deduplicated: columns are addressed by index internally, so
/// duplicate header texts are allowed and harmless.
pub struct ColumnSet<T> {
    columns: Vec<ColumnMapping<T>>,
}

impl<T> Default for ColumnSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ColumnSet<T> {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Append one column mapping.
    pub fn add_mapping<F>(&mut self, header: impl Into<String>, extractor: F, money: bool)
    where
        F: Fn(&T) -> Option<Value> + Send + Sync + 'static,
    {
        self.columns.push(ColumnMapping {
            header: header.into(),
            extractor: Box::new(extractor),
            money,
            customizer: None,
        });
    }

    /// Append one column mapping with a per-cell customizer.
    pub fn add_mapping_with<F, C>(
        &mut self,
        header: impl Into<String>,
        extractor: F,
        money: bool,
        customizer: C,
    ) where
        F: Fn(&T) -> Option<Value> + Send + Sync + 'static,
        C: Fn(&mut CellContext<'_, T>) + Send + Sync + 'static,
    {
        self.columns.push(ColumnMapping {
            header: header.into(),
            extractor: Box::new(extractor),
            money,
            customizer: Some(Box::new(customizer)),
        });
    }

    /// Header texts in registration order.
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnMapping<T>> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
