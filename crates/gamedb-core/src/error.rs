use crate::decode::DecodeError;

/// Errors raised while resolving, reading, or installing one sheet.
///
/// Row and column numbers are 1-based, matching what a spreadsheet editor
/// shows.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SheetError {
    /// The sheet has no data row or no data column under the layout.
    #[error("sheet '{sheet}' does not fit the layout: {rows} rows, {columns} columns")]
    TooSmall {
        sheet: String,
        rows: u32,
        columns: u32,
    },

    /// No header cell matched any field of the record shape.
    #[error("no column of sheet '{sheet}' matches record shape {shape}")]
    NoColumns { sheet: String, shape: &'static str },

    /// A header cell could not be read as text.
    #[error("sheet '{sheet}' header cell (row {row}, column {column}): {source}")]
    Header {
        sheet: String,
        row: u32,
        column: u32,
        source: DecodeError,
    },

    /// A declared field has no column with its header text.
    #[error("sheet '{sheet}' has no column '{column}' for field {shape}.{field}")]
    SchemaMismatch {
        sheet: String,
        shape: &'static str,
        field: &'static str,
        column: &'static str,
    },

    /// Blank rows are not allowed inside the data region.
    #[error("sheet '{sheet}' has an empty row at row {row}")]
    EmptyRow { sheet: String, row: u32 },

    /// The identity column of a data row is empty.
    #[error("sheet '{sheet}' cell (row {row}, column {column}): identity column must not be empty")]
    EmptyIdentity { sheet: String, row: u32, column: u32 },

    /// A cell could not be decoded into its field.
    #[error("sheet '{sheet}' cell (row {row}, column {column}) field {field}: {source}")]
    Cell {
        sheet: String,
        row: u32,
        column: u32,
        field: &'static str,
        source: DecodeError,
    },

    /// A key or identity value occurs twice in one table.
    #[error("table {table} field {field}: value {value} is duplicated")]
    DuplicateKey {
        table: String,
        field: &'static str,
        value: i32,
    },
}
