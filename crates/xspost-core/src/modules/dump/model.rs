//! Numeric tables recovered from a text dump.

/// Rectangular table of floats; every row has the same width, enforced at
/// parse time. Missing input tokens are stored as NaN, never dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericTable {
    rows: Vec<Vec<f64>>,
    width: usize,
}

impl NumericTable {
    pub(super) fn new(rows: Vec<Vec<f64>>, width: usize) -> Self {
        Self { rows, width }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        self.rows.get(row)?.get(column).copied()
    }

    /// Extracts one column top to bottom. An empty table yields an empty
    /// column for any index, since it declares no width.
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if self.rows.is_empty() {
            return Some(Vec::new());
        }
        if index >= self.width {
            return None;
        }
        Some(self.rows.iter().map(|row| row[index]).collect())
    }
}

/// The three tables of one dump's data section, in dump order.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpTables {
    pub counts: NumericTable,
    pub photons: NumericTable,
    pub ratio: NumericTable,
}
