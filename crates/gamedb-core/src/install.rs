//! Table installation: moving decoded rows into their destination tables.
//!
//! Two strategies exist. Sequence tables keep row order and reject a repeated
//! identity value; keyed tables index rows by a declared key field and reject
//! a repeated key. Either way the destination's previous contents are
//! replaced wholesale.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

use calamine::{Data, Range};

use crate::error::SheetError;
use crate::schema::{KeyAccessor, RecordShape, SheetLayout};
use crate::sheet::read_sheet;

// ===========================================================================
// Strategies
// ===========================================================================

/// Replace `dest` with `rows`, enforcing identity uniqueness.
///
/// Identity is the shape's primary id field, or its level field when the
/// shape has no id. Shapes with neither are not checked.
pub fn install_sequence<R: RecordShape>(
    table: &str,
    dest: &mut Vec<R>,
    rows: Vec<R>,
) -> Result<(), SheetError> {
    if let Some(identity) = R::id_key().or_else(R::level_key) {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            let value = (identity.get)(row);
            if !seen.insert(value) {
                return Err(SheetError::DuplicateKey {
                    table: table.to_string(),
                    field: identity.field,
                    value,
                });
            }
        }
    }
    *dest = rows;
    Ok(())
}

/// Replace `dest` with `rows` indexed by `key`. A repeated key fails.
pub fn install_keyed<R>(
    table: &str,
    dest: &mut BTreeMap<i32, R>,
    key: KeyAccessor<R>,
    rows: Vec<R>,
) -> Result<(), SheetError> {
    let mut staged = BTreeMap::new();
    for row in rows {
        let value = (key.get)(&row);
        match staged.entry(value) {
            Entry::Occupied(_) => {
                return Err(SheetError::DuplicateKey {
                    table: table.to_string(),
                    field: key.field,
                    value,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
        }
    }
    *dest = staged;
    Ok(())
}

// ===========================================================================
// Sheet definitions
// ===========================================================================

/// Where a sheet's rows go inside a database of type `Db`.
pub enum Destination<Db, R> {
    Sequence(fn(&mut Db) -> &mut Vec<R>),
    Keyed {
        key: KeyAccessor<R>,
        table: fn(&mut Db) -> &mut BTreeMap<i32, R>,
    },
}

/// Type-erased loader for one sheet of a source file.
pub trait SheetLoader<Db>: Send + Sync {
    fn sheet_name(&self) -> &str;

    fn table_name(&self) -> &str;

    /// Read the sheet and install its rows into `staging`. Returns the row
    /// count.
    fn load(
        &self,
        range: &Range<Data>,
        layout: &SheetLayout,
        staging: &mut Db,
    ) -> Result<usize, SheetError>;

    /// Move this sheet's table from `staging` into `live`.
    fn commit(&self, staging: &mut Db, live: &mut Db);
}

/// A sheet bound to a record shape and a destination table.
pub struct SheetDef<Db, R> {
    sheet: &'static str,
    table: &'static str,
    destination: Destination<Db, R>,
}

impl<Db, R> SheetDef<Db, R> {
    pub fn sequence(
        sheet: &'static str,
        table: &'static str,
        dest: fn(&mut Db) -> &mut Vec<R>,
    ) -> Self {
        Self {
            sheet,
            table,
            destination: Destination::Sequence(dest),
        }
    }

    pub fn keyed(
        sheet: &'static str,
        table: &'static str,
        key: KeyAccessor<R>,
        dest: fn(&mut Db) -> &mut BTreeMap<i32, R>,
    ) -> Self {
        Self {
            sheet,
            table,
            destination: Destination::Keyed { key, table: dest },
        }
    }
}

impl<Db: 'static, R: RecordShape> SheetLoader<Db> for SheetDef<Db, R> {
    fn sheet_name(&self) -> &str {
        self.sheet
    }

    fn table_name(&self) -> &str {
        self.table
    }

    fn load(
        &self,
        range: &Range<Data>,
        layout: &SheetLayout,
        staging: &mut Db,
    ) -> Result<usize, SheetError> {
        let rows: Vec<R> = read_sheet(self.sheet, range, layout)?;
        let count = rows.len();
        match &self.destination {
            Destination::Sequence(dest) => install_sequence(self.table, dest(staging), rows)?,
            Destination::Keyed { key, table } => {
                install_keyed(self.table, table(staging), *key, rows)?
            }
        }
        Ok(count)
    }

    fn commit(&self, staging: &mut Db, live: &mut Db) {
        match &self.destination {
            Destination::Sequence(dest) => *dest(live) = std::mem::take(dest(staging)),
            Destination::Keyed { table, .. } => *table(live) = std::mem::take(table(staging)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::test_utils::*;

    #[derive(Debug, Default, PartialEq)]
    struct Level {
        lvl: i32,
        exp: i64,
    }

    impl RecordShape for Level {
        fn schema() -> Schema<Self> {
            Schema::<Self>::new("Level")
                .int("lvl", "lvl", |r, v| r.lvl = v)
                .long("exp", "exp", |r, v| r.exp = v)
        }

        fn level_key() -> Option<KeyAccessor<Self>> {
            Some(KeyAccessor::new("lvl", |r: &Self| r.lvl))
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Note {
        text: String,
    }

    impl RecordShape for Note {
        fn schema() -> Schema<Self> {
            Schema::<Self>::new("Note").string("text", "text", |r, v| r.text = v)
        }
    }

    #[derive(Default)]
    struct Db {
        monsters: BTreeMap<i32, Monster>,
        levels: Vec<Level>,
    }

    fn monster(id: i32) -> Monster {
        Monster {
            id,
            ..Monster::default()
        }
    }

    #[test]
    fn keyed_rejects_duplicate_key() {
        let mut dest = BTreeMap::new();
        let err = install_keyed(
            "monsters",
            &mut dest,
            KeyAccessor::new("id", |m: &Monster| m.id),
            vec![monster(1), monster(2), monster(1)],
        )
        .unwrap_err();

        assert_eq!(
            err,
            SheetError::DuplicateKey {
                table: "monsters".to_string(),
                field: "id",
                value: 1,
            }
        );
        assert!(dest.is_empty());
    }

    #[test]
    fn keyed_replaces_previous_contents() {
        let mut dest = BTreeMap::new();
        dest.insert(9, monster(9));
        install_keyed(
            "monsters",
            &mut dest,
            KeyAccessor::new("id", |m: &Monster| m.id),
            vec![monster(1), monster(2)],
        )
        .unwrap();
        assert_eq!(dest.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn sequence_checks_primary_identity() {
        let mut dest = Vec::new();
        let err = install_sequence("monsters", &mut dest, vec![monster(4), monster(4)]).unwrap_err();
        assert!(matches!(err, SheetError::DuplicateKey { field: "id", value: 4, .. }));
    }

    #[test]
    fn sequence_falls_back_to_level() {
        let mut dest = Vec::new();
        let rows = vec![Level { lvl: 1, exp: 0 }, Level { lvl: 1, exp: 10 }];
        let err = install_sequence("levels", &mut dest, rows).unwrap_err();
        assert!(matches!(err, SheetError::DuplicateKey { field: "lvl", value: 1, .. }));
    }

    #[test]
    fn sequence_without_identity_is_unchecked() {
        let mut dest = Vec::new();
        let rows = vec![
            Note { text: "a".into() },
            Note { text: "a".into() },
        ];
        install_sequence("notes", &mut dest, rows).unwrap();
        assert_eq!(dest.len(), 2);
    }

    #[test]
    fn sheet_def_loads_then_commits() {
        let def = SheetDef::<Db, Monster>::keyed(
            "monster",
            "monsters",
            KeyAccessor::new("id", |m: &Monster| m.id),
            |db: &mut Db| &mut db.monsters,
        );
        let range = standard_sheet(
            &MONSTER_HEADER,
            &[
                &["1", "Slime", "", "", "", "", "", ""],
                &["2", "Bat", "", "", "", "", "", ""],
            ],
        );

        let mut staging = Db::default();
        let count = def.load(&range, &SheetLayout::default(), &mut staging).unwrap();
        assert_eq!(count, 2);

        let mut live = Db::default();
        live.monsters.insert(7, monster(7));
        def.commit(&mut staging, &mut live);

        assert!(staging.monsters.is_empty());
        assert_eq!(live.monsters.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(live.monsters[&2].name, "Bat");
    }

    #[test]
    fn sequence_sheet_def_reports_duplicate_level() {
        let def = SheetDef::<Db, Level>::sequence("level", "levels", |db: &mut Db| &mut db.levels);
        let range = standard_sheet(&["lvl", "exp"], &[&["1", "0"], &["2", "10"], &["2", "20"]]);

        let mut staging = Db::default();
        let err = def
            .load(&range, &SheetLayout::default(), &mut staging)
            .unwrap_err();
        assert!(err.to_string().contains("levels"));
        assert!(staging.levels.is_empty());
        assert_eq!(def.table_name(), "levels");
        assert_eq!(def.sheet_name(), "level");
    }
}
