//! Record-shape registry and the column resolver.
//!
//! Each record shape declares its fields explicitly: the field name, the
//! header text of the column that feeds it, and a typed setter. The resolver
//! matches those declarations against a sheet's header row.

use std::collections::{BTreeMap, BTreeSet};

use calamine::{Data, Range};

pub use crate::decode::FieldKind;
use crate::decode::{
    CellDecode, DecodeError, clean_string, fit, parse_bool, parse_float, parse_rounded_int,
    parse_uint,
};
use crate::error::SheetError;
use crate::sheet::cell_text;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Position of the header row and the first data column (both 0-based).
///
/// Data rows start immediately below the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub header_row: u32,
    pub first_column: u32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            header_row: 2,
            first_column: 1,
        }
    }
}

impl SheetLayout {
    pub fn first_data_row(&self) -> u32 {
        self.header_row + 1
    }
}

// ---------------------------------------------------------------------------
// Field declarations
// ---------------------------------------------------------------------------

pub type CompositeSetter<R> = Box<dyn Fn(&mut R, &str) -> Result<(), DecodeError> + Send + Sync>;

/// Typed setter for one field, tagged by kind.
pub enum FieldSetter<R> {
    Bool(fn(&mut R, bool)),
    Int(fn(&mut R, i32)),
    Long(fn(&mut R, i64)),
    Uint(fn(&mut R, u32)),
    Float(fn(&mut R, f64)),
    Str(fn(&mut R, String)),
    Composite(CompositeSetter<R>),
}

impl<R> FieldSetter<R> {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldSetter::Bool(_) => FieldKind::Bool,
            FieldSetter::Int(_) | FieldSetter::Long(_) => FieldKind::Int,
            FieldSetter::Uint(_) => FieldKind::Uint,
            FieldSetter::Float(_) => FieldKind::Float,
            FieldSetter::Str(_) => FieldKind::Str,
            FieldSetter::Composite(_) => FieldKind::Composite,
        }
    }

    /// Decode trimmed cell text into the field.
    ///
    /// Composite decoders always run, so the field ends up initialized even
    /// for an empty cell. Primitives keep their zero value when the cell is
    /// empty. Integers that do not fit the field's type fail.
    pub fn apply(&self, record: &mut R, text: &str) -> Result<(), DecodeError> {
        match self {
            FieldSetter::Composite(set) => return set(record, text),
            _ if text.is_empty() => {}
            FieldSetter::Bool(set) => set(record, parse_bool(text)?),
            FieldSetter::Int(set) => set(record, fit(text, self.kind(), parse_rounded_int(text)?)?),
            FieldSetter::Long(set) => set(record, parse_rounded_int(text)?),
            FieldSetter::Uint(set) => set(record, fit(text, self.kind(), parse_uint(text)?)?),
            FieldSetter::Float(set) => set(record, parse_float(text)?),
            FieldSetter::Str(set) => set(record, clean_string(text)),
        }
        Ok(())
    }
}

/// One declared field of a record shape.
pub struct FieldDef<R> {
    pub field: &'static str,
    pub column: &'static str,
    pub setter: FieldSetter<R>,
}

/// The ordered field declarations of a record shape.
pub struct Schema<R> {
    shape: &'static str,
    fields: Vec<FieldDef<R>>,
}

impl<R> Schema<R> {
    pub fn shape(&self) -> &'static str {
        self.shape
    }

    pub fn fields(&self) -> &[FieldDef<R>] {
        &self.fields
    }
}

impl<R: 'static> Schema<R> {
    pub fn new(shape: &'static str) -> Self {
        Self {
            shape,
            fields: Vec::new(),
        }
    }

    fn push(mut self, field: &'static str, column: &'static str, setter: FieldSetter<R>) -> Self {
        self.fields.push(FieldDef {
            field,
            column,
            setter,
        });
        self
    }

    pub fn boolean(self, field: &'static str, column: &'static str, set: fn(&mut R, bool)) -> Self {
        self.push(field, column, FieldSetter::Bool(set))
    }

    pub fn int(self, field: &'static str, column: &'static str, set: fn(&mut R, i32)) -> Self {
        self.push(field, column, FieldSetter::Int(set))
    }

    pub fn long(self, field: &'static str, column: &'static str, set: fn(&mut R, i64)) -> Self {
        self.push(field, column, FieldSetter::Long(set))
    }

    pub fn uint(self, field: &'static str, column: &'static str, set: fn(&mut R, u32)) -> Self {
        self.push(field, column, FieldSetter::Uint(set))
    }

    pub fn float(self, field: &'static str, column: &'static str, set: fn(&mut R, f64)) -> Self {
        self.push(field, column, FieldSetter::Float(set))
    }

    pub fn string(self, field: &'static str, column: &'static str, set: fn(&mut R, String)) -> Self {
        self.push(field, column, FieldSetter::Str(set))
    }

    /// Declare a field decoded by a [`CellDecode`] grammar.
    pub fn composite<T: CellDecode + 'static>(
        self,
        field: &'static str,
        column: &'static str,
        set: fn(&mut R, T),
    ) -> Self {
        let setter: CompositeSetter<R> = Box::new(move |record: &mut R, text: &str| {
            set(record, T::decode(text)?);
            Ok(())
        });
        self.push(field, column, FieldSetter::Composite(setter))
    }
}

// ---------------------------------------------------------------------------
// Record shapes
// ---------------------------------------------------------------------------

/// Reads an integer key out of a record.
pub struct KeyAccessor<R> {
    pub field: &'static str,
    pub get: fn(&R) -> i32,
}

impl<R> Clone for KeyAccessor<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for KeyAccessor<R> {}

impl<R> KeyAccessor<R> {
    pub fn new(field: &'static str, get: fn(&R) -> i32) -> Self {
        Self { field, get }
    }
}

/// A row type that can be decoded from a sheet.
pub trait RecordShape: Default + Send + 'static {
    fn schema() -> Schema<Self>;

    /// Primary identity field, checked for uniqueness in sequence tables.
    fn id_key() -> Option<KeyAccessor<Self>> {
        None
    }

    /// Secondary identity field, used when the shape has no primary one.
    fn level_key() -> Option<KeyAccessor<Self>> {
        None
    }
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Result of matching a schema against one header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBindings {
    /// Column index -> index into [`Schema::fields`].
    pub bindings: BTreeMap<u32, usize>,
    /// Header texts that matched at least one field.
    pub matched: BTreeSet<String>,
    /// Rightmost non-empty header column; anything past it is a comment.
    pub max_column: u32,
}

impl ColumnBindings {
    /// The leftmost bound column; it must be filled on every data row.
    pub fn identity_column(&self) -> Option<u32> {
        self.bindings.keys().next().copied()
    }
}

/// Bind header columns to schema fields.
///
/// Scans the header row from the first data column and stops at the first
/// empty cell. When several fields share one header text the last declared
/// field is bound to that column.
pub fn resolve_columns<R>(
    sheet: &str,
    schema: &Schema<R>,
    range: &Range<Data>,
    layout: &SheetLayout,
) -> Result<ColumnBindings, SheetError> {
    let (rows, columns) = range.end().map_or((0, 0), |(r, c)| (r + 1, c + 1));
    if rows <= layout.first_data_row() || columns <= layout.first_column {
        return Err(SheetError::TooSmall {
            sheet: sheet.to_string(),
            rows,
            columns,
        });
    }

    let mut bindings = BTreeMap::new();
    let mut matched = BTreeSet::new();
    let mut max_column = layout.first_column;

    for column in layout.first_column..columns {
        let header = match range.get_value((layout.header_row, column)) {
            Some(data) => cell_text(data).map_err(|source| SheetError::Header {
                sheet: sheet.to_string(),
                row: layout.header_row + 1,
                column: column + 1,
                source,
            })?,
            None => String::new(),
        };
        let header = header.trim();
        if header.is_empty() {
            break;
        }
        max_column = column;

        for (index, def) in schema.fields().iter().enumerate() {
            if def.column == header {
                bindings.insert(column, index);
                matched.insert(header.to_string());
            }
        }
    }

    if bindings.is_empty() {
        return Err(SheetError::NoColumns {
            sheet: sheet.to_string(),
            shape: schema.shape(),
        });
    }

    if let Some(missing) = schema
        .fields()
        .iter()
        .find(|def| !matched.contains(def.column))
    {
        return Err(SheetError::SchemaMismatch {
            sheet: sheet.to_string(),
            shape: schema.shape(),
            field: missing.field,
            column: missing.column,
        });
    }

    Ok(ColumnBindings {
        bindings,
        matched,
        max_column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn binds_every_declared_column() {
        let range = standard_sheet(&MONSTER_HEADER, &[&["1", "Slime", "10", "1.5", "", "", "", ""]]);
        let schema = Monster::schema();
        let cols = resolve_columns("monster", &schema, &range, &SheetLayout::default()).unwrap();

        assert_eq!(cols.bindings.len(), MONSTER_HEADER.len());
        assert_eq!(cols.identity_column(), Some(1));
        assert_eq!(cols.max_column, MONSTER_HEADER.len() as u32);
        assert!(cols.matched.contains("hp"));
    }

    #[test]
    fn comment_columns_after_gap_are_ignored() {
        let mut header: Vec<&str> = MONSTER_HEADER.to_vec();
        header.push("");
        header.push("hp");
        let range = standard_sheet(&header, &[&["1", "Slime", "10", "", "", "", "", "", "", "99"]]);
        let cols =
            resolve_columns("monster", &Monster::schema(), &range, &SheetLayout::default()).unwrap();

        assert_eq!(cols.max_column, MONSTER_HEADER.len() as u32);
        assert!(cols.bindings.keys().all(|&c| c <= cols.max_column));
    }

    #[test]
    fn missing_column_names_the_field() {
        let header: Vec<&str> = MONSTER_HEADER.iter().copied().filter(|h| *h != "speed").collect();
        let range = standard_sheet(&header, &[&["1", "Slime", "10", "", "", "", ""]]);
        let err = resolve_columns("monster", &Monster::schema(), &range, &SheetLayout::default())
            .unwrap_err();

        assert_eq!(
            err,
            SheetError::SchemaMismatch {
                sheet: "monster".to_string(),
                shape: "Monster",
                field: "speed",
                column: "speed",
            }
        );
    }

    #[test]
    fn no_matching_header_fails() {
        let range = standard_sheet(&["foo", "bar"], &[&["1", "2"]]);
        let err = resolve_columns("monster", &Monster::schema(), &range, &SheetLayout::default())
            .unwrap_err();
        assert!(matches!(err, SheetError::NoColumns { .. }));
    }

    #[test]
    fn header_without_data_rows_is_too_small() {
        let range = standard_sheet(&MONSTER_HEADER, &[]);
        let err = resolve_columns("monster", &Monster::schema(), &range, &SheetLayout::default())
            .unwrap_err();
        assert!(matches!(err, SheetError::TooSmall { rows: 3, .. }));
    }

    #[derive(Default)]
    struct Shared {
        first: i32,
        second: i32,
    }

    #[test]
    fn shared_column_binds_last_declared_field() {
        let schema = Schema::<Shared>::new("Shared")
            .int("first", "value", |r, v| r.first = v)
            .int("second", "value", |r, v| r.second = v);
        let range = standard_sheet(&["value"], &[&["5"]]);
        let cols = resolve_columns("shared", &schema, &range, &SheetLayout::default()).unwrap();

        assert_eq!(cols.bindings.get(&1), Some(&1));

        let mut record = Shared::default();
        schema.fields()[cols.bindings[&1]]
            .setter
            .apply(&mut record, "5")
            .unwrap();
        assert_eq!((record.first, record.second), (0, 5));
    }

    #[test]
    fn error_cell_in_header_fails() {
        let mut range = standard_sheet(&MONSTER_HEADER, &[&["1", "Slime", "", "", "", "", "", ""]]);
        range.set_value((2, 3), Data::Error(calamine::CellErrorType::Ref));
        let err = resolve_columns("monster", &Monster::schema(), &range, &SheetLayout::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SheetError::Header {
                row: 3,
                column: 4,
                source: DecodeError::Unreadable(_),
                ..
            }
        ));
    }

    #[test]
    fn int_setters_reject_values_outside_their_type() {
        #[derive(Default)]
        struct Wide {
            narrow: i32,
            wide: i64,
            count: u32,
        }
        let schema = Schema::<Wide>::new("Wide")
            .int("narrow", "narrow", |r, v| r.narrow = v)
            .long("wide", "wide", |r, v| r.wide = v)
            .uint("count", "count", |r, v| r.count = v);
        let [narrow, wide, count] = schema.fields() else {
            panic!("three fields declared");
        };

        let mut record = Wide::default();
        wide.setter.apply(&mut record, "4294967297").unwrap();
        assert_eq!(record.wide, 4_294_967_297);

        for text in ["4294967297", "1e20", "NaN"] {
            assert!(
                matches!(
                    narrow.setter.apply(&mut record, text),
                    Err(DecodeError::OutOfRange { kind: FieldKind::Int, .. })
                ),
                "{text}"
            );
        }
        assert!(matches!(
            count.setter.apply(&mut record, "4294967296"),
            Err(DecodeError::OutOfRange { kind: FieldKind::Uint, .. })
        ));
        assert_eq!(record.narrow, 0);
    }

    #[test]
    fn setter_kinds_are_tagged() {
        let kinds: Vec<FieldKind> = Monster::schema()
            .fields()
            .iter()
            .map(|f| f.setter.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                FieldKind::Int,
                FieldKind::Str,
                FieldKind::Uint,
                FieldKind::Float,
                FieldKind::Bool,
                FieldKind::Composite,
                FieldKind::Composite,
                FieldKind::Composite,
            ]
        );
    }
}
