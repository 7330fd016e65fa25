//! Static game catalogs: crew avatars, platform trait names, craft config and item archetypes.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewAvatar {
    pub id: i64,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub max_rarity: u32,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Avatar list with id and symbol indexes. Built once per `crew_avatars` load.
#[derive(Debug, Clone, Default)]
pub struct AvatarCatalog {
    avatars: Vec<CrewAvatar>,
    by_id: HashMap<i64, usize>,
    by_symbol: HashMap<String, usize>,
}

impl AvatarCatalog {
    pub fn from_avatars(avatars: Vec<CrewAvatar>) -> Self {
        let mut by_id = HashMap::with_capacity(avatars.len());
        let mut by_symbol = HashMap::with_capacity(avatars.len());
        for (index, avatar) in avatars.iter().enumerate() {
            by_id.entry(avatar.id).or_insert(index);
            by_symbol.entry(avatar.symbol.clone()).or_insert(index);
        }
        Self {
            avatars,
            by_id,
            by_symbol,
        }
    }

    pub fn by_id(&self, id: i64) -> Option<&CrewAvatar> {
        self.by_id.get(&id).map(|&index| &self.avatars[index])
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&CrewAvatar> {
        self.by_symbol.get(symbol).map(|&index| &self.avatars[index])
    }

    pub fn avatars(&self) -> &[CrewAvatar] {
        &self.avatars
    }

    pub fn len(&self) -> usize {
        self.avatars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.avatars.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub trait_names: HashMap<String, String>,
    #[serde(default)]
    pub ship_trait_names: HashMap<String, String>,
}

impl PlatformConfig {
    /// Display name for a trait, falling back to the raw trait key.
    pub fn trait_name<'a>(&'a self, raw: &'a str) -> &'a str {
        self.trait_names
            .get(raw)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChanceFormula {
    pub steepness: f64,
    pub midpoint: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostAmount {
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftConfig {
    pub specialist_challenge_rating: f64,
    pub specialist_chance_formula: ChanceFormula,
    pub specialist_maximum_success_chance: f64,
    #[serde(default)]
    pub cost_by_rarity_for_component: Vec<CostAmount>,
    #[serde(default)]
    pub cost_by_rarity_for_equipment: Vec<CostAmount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub craft_config: Option<CraftConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDemand {
    pub archetype_id: i64,
    #[serde(default)]
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeJackpot {
    /// One entry `"a"` or `"a,b"`, or two alternative entries.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Present only on event recipes; absent and empty are different.
    #[serde(default)]
    pub trait_bonuses: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub demands: Vec<RecipeDemand>,
    #[serde(default)]
    pub jackpot: Option<RecipeJackpot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemArchetype {
    pub id: i64,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rarity: usize,
    #[serde(rename = "type", default)]
    pub item_type: i64,
    #[serde(default)]
    pub recipe: Option<Recipe>,
}
