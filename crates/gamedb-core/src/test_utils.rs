//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use calamine::{Data, Range};

use crate::decode::{IntList, ItemInfos, PropInfo};
use crate::schema::{KeyAccessor, RecordShape, Schema, SheetLayout};

// ===========================================================================
// Sheet builders
// ===========================================================================

/// Build a sheet from raw rows starting at cell (0, 0). Empty strings become
/// empty cells.
pub fn sheet_from_rows(rows: &[Vec<&str>]) -> Range<Data> {
    let height = rows.len().max(1) as u32;
    let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1) as u32;
    let mut range = Range::new((0, 0), (height - 1, width - 1));
    for (r, row) in rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            if !text.is_empty() {
                range.set_value((r as u32, c as u32), Data::String(text.to_string()));
            }
        }
    }
    range
}

/// Build a sheet in the default layout: two description rows, the header
/// on the third row, and one leading column left blank.
pub fn standard_sheet(header: &[&str], rows: &[&[&str]]) -> Range<Data> {
    let layout = SheetLayout::default();
    let pad = layout.first_column as usize;
    let mut grid: Vec<Vec<&str>> = Vec::new();

    let mut description = vec![""; pad];
    description.extend(header.iter().map(|_| "desc"));
    grid.push(description);
    while grid.len() < layout.header_row as usize {
        grid.push(Vec::new());
    }

    let mut header_row = vec![""; pad];
    header_row.extend_from_slice(header);
    grid.push(header_row);

    for row in rows {
        let mut data = vec![""; pad];
        data.extend_from_slice(row);
        grid.push(data);
    }
    sheet_from_rows(&grid)
}

// ===========================================================================
// A record shape exercising every field kind
// ===========================================================================

pub const MONSTER_HEADER: [&str; 8] =
    ["id", "name", "hp", "speed", "boss", "drops", "tags", "bonus"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Monster {
    pub id: i32,
    pub name: String,
    pub hp: u32,
    pub speed: f64,
    pub boss: bool,
    pub drops: ItemInfos,
    pub tags: IntList,
    pub bonus: PropInfo,
}

impl RecordShape for Monster {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("Monster")
            .int("id", "id", |r, v| r.id = v)
            .string("name", "name", |r, v| r.name = v)
            .uint("hp", "hp", |r, v| r.hp = v)
            .float("speed", "speed", |r, v| r.speed = v)
            .boolean("boss", "boss", |r, v| r.boss = v)
            .composite("drops", "drops", |r, v: ItemInfos| r.drops = v)
            .composite("tags", "tags", |r, v: IntList| r.tags = v)
            .composite("bonus", "bonus", |r, v: PropInfo| r.bonus = v)
    }

    fn id_key() -> Option<KeyAccessor<Self>> {
        Some(KeyAccessor::new("id", |r: &Self| r.id))
    }
}
