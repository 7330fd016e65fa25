//! Player data tree as returned by the `player` endpoint.
//!
//! The tree is kept as JSON so push updates can be merged into it verbatim;
//! typed views such as [CharacterDto] are decoded from it on demand.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::crew::CrewDto;

/// One collection or starbase buff: `stat` is a `<skill>_<stat>` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffEntry {
    pub stat: String,
    pub operator: String,
    pub value: f64,
}

impl BuffEntry {
    pub fn new(stat: &str, operator: &str, value: f64) -> Self {
        Self {
            stat: stat.to_string(),
            operator: operator.to_string(),
            value,
        }
    }
}

/// A frozen crew entry in the stasis vault: archetype id and copy count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImmortal {
    pub id: i64,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDto {
    #[serde(default)]
    pub id: i64,
    pub archetype_id: i64,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterDto {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub crew: Vec<CrewDto>,
    #[serde(default)]
    pub stored_immortals: Vec<StoredImmortal>,
    #[serde(default)]
    pub crew_collection_buffs: Vec<BuffEntry>,
    #[serde(default)]
    pub starbase_buffs: Vec<BuffEntry>,
    #[serde(default)]
    pub items: Vec<ItemDto>,
    #[serde(default)]
    pub events: Vec<Value>,
}

/// The `player` object of a player response.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerData {
    tree: Value,
}

impl PlayerData {
    pub fn new(tree: Value) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Value {
        &mut self.tree
    }

    pub fn character(&self) -> Result<CharacterDto, serde_json::Error> {
        match self.tree.get("character") {
            Some(character) => serde_json::from_value(character.clone()),
            None => Ok(CharacterDto::default()),
        }
    }

    pub fn character_mut(&mut self) -> Option<&mut Value> {
        self.tree.get_mut("character")
    }
}
