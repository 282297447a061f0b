//! Workbook fixtures shared by the integration tests.
//!
//! Every fixture follows the standard layout: a description row, an empty
//! row, the header on the third row, and data from the fourth row, all
//! starting in the second column.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

pub const ITEM_HEADER: [&str; 24] = [
    "id", "name", "note", "iconId", "itemLvl", "level", "vip", "color", "type", "bagTag", "count",
    "canSell", "sellGet", "dropId", "useType", "useTypePrams", "getSource", "price", "cherish",
    "inFly", "border", "purpose", "usefor", "isAction",
];
pub const SCENE_HEADER: [&str; 2] = ["id", "mapId"];
pub const OTHER_DATA_HEADER: [&str; 2] = ["id", "data"];
pub const PLAYER_LEVEL_HEADER: [&str; 3] = ["lvl", "exp", "reward"];

/// One sheet of a fixture workbook.
pub struct SheetFixture {
    pub name: &'static str,
    pub header: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl SheetFixture {
    pub fn new(name: &'static str, header: &[&'static str]) -> Self {
        Self {
            name,
            header: header.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, cells: &[&str]) -> Self {
        self.rows.push(cells.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn rows(mut self, rows: Vec<Vec<String>>) -> Self {
        self.rows.extend(rows);
        self
    }
}

/// A full item row with every unspecified column left empty.
pub fn item_row(id: i32, name: &str, sell_get: &str) -> Vec<String> {
    let mut row = vec![String::new(); ITEM_HEADER.len()];
    row[0] = id.to_string();
    row[1] = name.to_string();
    row[8] = "1".to_string();
    row[10] = "99".to_string();
    row[12] = sell_get.to_string();
    row[15] = "5,,6".to_string();
    row[17] = "1,30".to_string();
    row
}

pub fn default_items() -> SheetFixture {
    SheetFixture::new("item", &ITEM_HEADER).rows(vec![
        item_row(1001, "Potion", "1002,1"),
        item_row(1002, "Gold", ""),
    ])
}

pub fn default_scenes() -> SheetFixture {
    SheetFixture::new("scene", &SCENE_HEADER)
        .row(&["1", "10"])
        .row(&["2", "20"])
        .row(&["3", "10"])
}

pub fn default_other_data() -> Vec<SheetFixture> {
    vec![
        SheetFixture::new("otherData", &OTHER_DATA_HEADER)
            .row(&["1", "first"])
            .row(&["2", "second"]),
        SheetFixture::new("playerLevel", &PLAYER_LEVEL_HEADER)
            .row(&["1", "0", ""])
            .row(&["2", "150", "1001,2;1002,10"]),
    ]
}

/// A temporary base directory holding a complete, loadable data set.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        std::fs::create_dir_all(fixture.tables_dir()).unwrap();
        fixture.write_workbook("item.xlsx", &[default_items()]);
        fixture.write_workbook("scene.xlsx", &[default_scenes()]);
        fixture.write_workbook("otherData.xlsx", &default_other_data());
        fixture.write_scene_map(10, r#"{"name": "Meadow", "width": 100, "height": 96, "roadFlags": {"2005": 3, "2006": 2}}"#);
        fixture.write_scene_map(20, r#"{"Id": 20, "Width": 144, "Height": 48, "RoadFlags": {"1": 1}}"#);
        fixture.write_on_demand(r#"{"events": {"double_exp": true, "rate": 2}, "version": 3}"#);
        fixture
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.base().join("excels")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.base().join("gamedb.dat")
    }

    /// Write a workbook. Cells holding an integer are stored as numbers so
    /// the numeric read path is exercised too.
    pub fn write_workbook(&self, file: &str, sheets: &[SheetFixture]) {
        let mut workbook = Workbook::new();
        for sheet in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name).unwrap();
            for (i, column) in sheet.header.iter().enumerate() {
                let col = i as u16 + 1;
                worksheet.write_string(0, col, format!("{column} description")).unwrap();
                worksheet.write_string(2, col, *column).unwrap();
            }
            for (r, row) in sheet.rows.iter().enumerate() {
                let row_num = r as u32 + 3;
                for (c, text) in row.iter().enumerate() {
                    let col = c as u16 + 1;
                    if text.is_empty() {
                        continue;
                    }
                    match text.parse::<i64>() {
                        Ok(n) => worksheet.write_number(row_num, col, n as f64).unwrap(),
                        Err(_) => worksheet.write_string(row_num, col, text.as_str()).unwrap(),
                    };
                }
            }
        }
        workbook.save(self.tables_dir().join(file)).unwrap();
    }

    /// Rewrite a workbook and move its modification time forward so the
    /// freshness check sees it regardless of timestamp granularity.
    pub fn rewrite_workbook(&self, file: &str, sheets: &[SheetFixture]) {
        let path = self.tables_dir().join(file);
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();
        self.write_workbook(file, sheets);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(before + Duration::from_secs(5))
            .unwrap();
    }

    pub fn write_scene_map(&self, id: i32, json: &str) {
        let path = self.base().join(format!("scenes/map_{id}.json"));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    pub fn write_on_demand(&self, json: &str) {
        std::fs::write(self.base().join("onDemandData.json"), json).unwrap();
    }
}
