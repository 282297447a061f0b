//! Sheet reader: turns the data rows of one sheet into records.

use calamine::{Data, Range};

use crate::decode::DecodeError;
use crate::error::SheetError;
use crate::schema::{RecordShape, SheetLayout, resolve_columns};

/// Text of one cell as the decoders see it (untrimmed).
///
/// Numbers use their shortest decimal form, so a whole float reads as
/// `"3"` rather than `"3.0"`. Error cells cannot be read.
pub fn cell_text(data: &Data) -> Result<String, DecodeError> {
    match data {
        Data::Empty => Ok(String::new()),
        Data::String(s) => Ok(s.clone()),
        Data::Int(v) => Ok(v.to_string()),
        Data::Float(v) => Ok(v.to_string()),
        Data::Bool(v) => Ok(v.to_string()),
        Data::Error(e) => Err(DecodeError::Unreadable(e.to_string())),
        other => Ok(other.to_string()),
    }
}

fn is_blank(data: Option<&Data>) -> bool {
    match data {
        None | Some(Data::Empty) => true,
        Some(Data::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn row_is_blank(range: &Range<Data>, row: u32) -> bool {
    let (Some((_, first)), Some((_, last))) = (range.start(), range.end()) else {
        return true;
    };
    (first..=last).all(|column| is_blank(range.get_value((row, column))))
}

/// Read every data row of `range` into a record of shape `R`.
///
/// Rows are returned in sheet order. Any failure aborts the whole sheet.
pub fn read_sheet<R: RecordShape>(
    sheet: &str,
    range: &Range<Data>,
    layout: &SheetLayout,
) -> Result<Vec<R>, SheetError> {
    let schema = R::schema();
    let columns = resolve_columns(sheet, &schema, range, layout)?;
    let identity = columns.identity_column();
    let Some((last_row, _)) = range.end() else {
        return Ok(Vec::new());
    };

    let mut records = Vec::with_capacity((last_row + 1 - layout.first_data_row()) as usize);

    for row in layout.first_data_row()..=last_row {
        if row_is_blank(range, row) {
            return Err(SheetError::EmptyRow {
                sheet: sheet.to_string(),
                row: row + 1,
            });
        }

        let mut record = R::default();
        for (&column, &index) in &columns.bindings {
            let def = &schema.fields()[index];
            let cell_error = |source| SheetError::Cell {
                sheet: sheet.to_string(),
                row: row + 1,
                column: column + 1,
                field: def.field,
                source,
            };

            let text = match range.get_value((row, column)) {
                Some(data) => cell_text(data).map_err(cell_error)?,
                None => String::new(),
            };
            let text = text.trim();

            if identity == Some(column) && text.is_empty() {
                return Err(SheetError::EmptyIdentity {
                    sheet: sheet.to_string(),
                    row: row + 1,
                    column: column + 1,
                });
            }

            def.setter.apply(&mut record, text).map_err(cell_error)?;
        }
        records.push(record);
    }

    Ok(records)
}
