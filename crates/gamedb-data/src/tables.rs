//! Source-file registry: which workbook feeds which tables.

use gamedb_core::install::{SheetDef, SheetLoader};

use crate::db::GameDb;
use crate::records::{Item, OtherData, PlayerLevel, Scene, item_id, scene_id};

/// One source workbook and the sheets read from it, in load order.
///
/// Sheets of one file are loaded sequentially by a single task; distinct
/// files must never target the same table.
pub struct SourceFile {
    pub file_name: &'static str,
    pub sheets: Vec<Box<dyn SheetLoader<GameDb>>>,
}

impl SourceFile {
    pub fn new(file_name: &'static str) -> Self {
        Self {
            file_name,
            sheets: Vec::new(),
        }
    }

    pub fn with_sheet(mut self, sheet: impl SheetLoader<GameDb> + 'static) -> Self {
        self.sheets.push(Box::new(sheet));
        self
    }

    /// Names of the tables this file installs.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|sheet| sheet.table_name())
    }
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("file_name", &self.file_name)
            .field("tables", &self.table_names().collect::<Vec<_>>())
            .finish()
    }
}

/// The game's standard workbook set.
pub fn default_sources() -> Vec<SourceFile> {
    vec![
        SourceFile::new("item.xlsx").with_sheet(SheetDef::<GameDb, Item>::keyed(
            "item",
            "items",
            item_id(),
            |db: &mut GameDb| &mut db.items,
        )),
        SourceFile::new("scene.xlsx").with_sheet(SheetDef::<GameDb, Scene>::keyed(
            "scene",
            "scenes",
            scene_id(),
            |db: &mut GameDb| &mut db.scenes,
        )),
        SourceFile::new("otherData.xlsx")
            .with_sheet(SheetDef::<GameDb, OtherData>::sequence(
                "otherData",
                "other_datas",
                |db: &mut GameDb| &mut db.other_datas,
            ))
            .with_sheet(SheetDef::<GameDb, PlayerLevel>::sequence(
                "playerLevel",
                "player_levels",
                |db: &mut GameDb| &mut db.player_levels,
            )),
    ]
}
