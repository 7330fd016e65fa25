//! Crew records: the raw shape the game server sends and the derived roster view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::skills::Skill;

/// A `{core, range_min, range_max}` triple as sent by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillDto {
    #[serde(default)]
    pub core: f64,
    #[serde(default)]
    pub range_min: f64,
    #[serde(default)]
    pub range_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSlotDto {
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub archetype: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw crew record. Unknown server fields are kept in `extra` so a record can be
/// cached and read back without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub archetype_id: i64,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_body: Option<Value>,
    #[serde(default)]
    pub in_buy_back_state: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<f64>,
    #[serde(default)]
    pub rarity: u32,
    #[serde(default)]
    pub max_rarity: u32,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub max_level: u32,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub flavor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_battle: Option<Value>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub traits_hidden: Vec<String>,
    #[serde(default)]
    pub equipment_slots: Vec<EquipmentSlotDto>,
    /// Owned equipment; the first element of each entry is a slot index.
    #[serde(default)]
    pub equipment: Vec<Vec<i64>>,
    #[serde(default)]
    pub skills: BTreeMap<String, SkillDto>,
    #[serde(default)]
    pub base_skills: BTreeMap<String, SkillDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetypes: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized per-skill view. `voy = core + (min + max) / 2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillData {
    pub core: f64,
    pub min: f64,
    pub max: f64,
    pub voy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewEquipmentSlot {
    pub level: u32,
    pub archetype: i64,
    pub have: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewStatus {
    pub frozen: u32,
    pub buyback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<f64>,
    pub active: bool,
    pub external: bool,
}

/// One roster row as handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewData {
    pub id: i64,
    pub avatar_id: i64,
    /// Server instance id; negative for frozen crew that have none.
    pub crew_id: i64,
    pub symbol: String,
    pub name: String,
    pub short_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portrait: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_body: Option<Value>,

    pub buyback: bool,
    pub frozen: u32,
    #[serde(rename = "isExternal")]
    pub is_external: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<f64>,
    pub status: CrewStatus,

    pub rarity: u32,
    pub max_rarity: u32,
    pub level: u32,
    pub max_level: u32,
    pub favorite: bool,
    pub flavor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ship_battle: Option<Value>,

    /// Display trait names joined with `,`.
    pub traits: String,
    #[serde(rename = "rawTraits")]
    pub raw_traits: Vec<String>,
    pub equipment_slots: Vec<CrewEquipmentSlot>,
    pub skills: BTreeMap<Skill, SkillData>,

    pub voyage_score: f64,
    pub gauntlet_score: f64,
    pub usage_value: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub archetypes: Option<Value>,
}

impl CrewData {
    pub fn skill(&self, skill: Skill) -> SkillData {
        self.skills.get(&skill).copied().unwrap_or_default()
    }
}
