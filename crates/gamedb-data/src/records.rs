//! Record shapes decoded from the game's configuration sheets.
//!
//! Each shape declares its columns explicitly through [`RecordShape::schema`].

use gamedb_core::decode::{IntList, ItemInfos, PropInfo};
use gamedb_core::schema::{KeyAccessor, RecordShape, Schema};
use serde::{Deserialize, Serialize};

/// An item definition (`item.xlsx`, sheet `item`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub note: String,
    pub icon_id: i32,
    pub item_lvl: i32,
    /// Required character level.
    pub level: i32,
    pub vip: i32,
    pub color: i32,
    pub item_type: i32,
    pub bag_tag: i32,
    /// Stack limit.
    pub count: i32,
    pub can_sell: i32,
    /// What selling the item to the shop yields.
    pub sell_get: ItemInfos,
    pub drop_id: String,
    pub use_type: i32,
    pub use_type_params: IntList,
    pub get_source: IntList,
    /// Quick-buy currency and price.
    pub price: PropInfo,
    pub cherish: i32,
    pub in_fly: i32,
    pub border: i32,
    pub purpose: String,
    pub usefor: i32,
    pub is_action: i32,
}

impl RecordShape for Item {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("Item")
            .int("id", "id", |r, v| r.id = v)
            .string("name", "name", |r, v| r.name = v)
            .string("note", "note", |r, v| r.note = v)
            .int("icon_id", "iconId", |r, v| r.icon_id = v)
            .int("item_lvl", "itemLvl", |r, v| r.item_lvl = v)
            .int("level", "level", |r, v| r.level = v)
            .int("vip", "vip", |r, v| r.vip = v)
            .int("color", "color", |r, v| r.color = v)
            .int("item_type", "type", |r, v| r.item_type = v)
            .int("bag_tag", "bagTag", |r, v| r.bag_tag = v)
            .int("count", "count", |r, v| r.count = v)
            .int("can_sell", "canSell", |r, v| r.can_sell = v)
            .composite("sell_get", "sellGet", |r, v: ItemInfos| r.sell_get = v)
            .string("drop_id", "dropId", |r, v| r.drop_id = v)
            .int("use_type", "useType", |r, v| r.use_type = v)
            .composite("use_type_params", "useTypePrams", |r, v: IntList| {
                r.use_type_params = v
            })
            .composite("get_source", "getSource", |r, v: IntList| r.get_source = v)
            .composite("price", "price", |r, v: PropInfo| r.price = v)
            .int("cherish", "cherish", |r, v| r.cherish = v)
            .int("in_fly", "inFly", |r, v| r.in_fly = v)
            .int("border", "border", |r, v| r.border = v)
            .string("purpose", "purpose", |r, v| r.purpose = v)
            .int("usefor", "usefor", |r, v| r.usefor = v)
            .int("is_action", "isAction", |r, v| r.is_action = v)
    }

    fn id_key() -> Option<KeyAccessor<Self>> {
        Some(item_id())
    }
}

pub fn item_id() -> KeyAccessor<Item> {
    KeyAccessor::new("id", |r: &Item| r.id)
}

/// A scene and the grid map it is played on (`scene.xlsx`, sheet `scene`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: i32,
    pub map_id: i32,
}

impl RecordShape for Scene {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("Scene")
            .int("id", "id", |r, v| r.id = v)
            .int("map_id", "mapId", |r, v| r.map_id = v)
    }

    fn id_key() -> Option<KeyAccessor<Self>> {
        Some(scene_id())
    }
}

pub fn scene_id() -> KeyAccessor<Scene> {
    KeyAccessor::new("id", |r: &Scene| r.id)
}

/// Free-form data rows (`otherData.xlsx`, sheet `otherData`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherData {
    pub id: i32,
    pub data: String,
}

impl RecordShape for OtherData {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("OtherData")
            .int("id", "id", |r, v| r.id = v)
            .string("data", "data", |r, v| r.data = v)
    }

    fn id_key() -> Option<KeyAccessor<Self>> {
        Some(KeyAccessor::new("id", |r: &Self| r.id))
    }
}

/// Experience curve (`otherData.xlsx`, sheet `playerLevel`). Rows are
/// identified by level, not by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLevel {
    pub lvl: i32,
    pub exp: i64,
    pub reward: ItemInfos,
}

impl RecordShape for PlayerLevel {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("PlayerLevel")
            .int("lvl", "lvl", |r, v| r.lvl = v)
            .long("exp", "exp", |r, v| r.exp = v)
            .composite("reward", "reward", |r, v: ItemInfos| r.reward = v)
    }

    fn level_key() -> Option<KeyAccessor<Self>> {
        Some(KeyAccessor::new("lvl", |r: &Self| r.lvl))
    }
}
