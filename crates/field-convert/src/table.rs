//! Column-major attribute tables.

use field_core::AttrValue;

/// A tabular view of a field collection: one row per field, one column per
/// requested attribute key. Missing attributes are `None` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTable {
    columns: Vec<String>,
    cells: Vec<Vec<Option<AttrValue>>>,
}

impl FieldTable {
    /// Create a table from column names and column-major cells.
    ///
    /// Callers must pass one cell vector per column, all of equal length.
    pub fn new(columns: Vec<String>, cells: Vec<Vec<Option<AttrValue>>>) -> Self {
        debug_assert_eq!(columns.len(), cells.len());
        Self { columns, cells }
    }

    /// Column names, in request order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows (fields).
    pub fn n_rows(&self) -> usize {
        self.cells.first().map(Vec::len).unwrap_or(0)
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    /// The cells of one column.
    pub fn column(&self, name: &str) -> Option<&[Option<AttrValue>]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.cells[i].as_slice())
    }

    /// One row as `(column, cell)` pairs.
    pub fn row(&self, n: usize) -> Option<Vec<(&str, Option<&AttrValue>)>> {
        if n >= self.n_rows() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .zip(&self.cells)
                .map(|(name, cells)| (name.as_str(), cells[n].as_ref()))
                .collect(),
        )
    }
}
