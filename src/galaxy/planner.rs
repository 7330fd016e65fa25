use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::data::catalog::{CraftConfig, ItemArchetype};
use crate::data::crew::CrewData;
use crate::data::player::ItemDto;
use crate::data::skills::Skill;

/// Server craft config plus the player's item archetype cache and inventory.
#[derive(Debug, Clone, Copy)]
pub struct GalaxyContext<'a> {
    pub craft: &'a CraftConfig,
    pub archetypes: &'a [ItemArchetype],
    pub items: &'a [ItemDto],
}

impl GalaxyContext<'_> {
    fn archetype(&self, id: i64) -> Option<&ItemArchetype> {
        self.archetypes.iter().find(|archetype| archetype.id == id)
    }

    fn owned(&self, archetype_id: i64) -> u32 {
        self.items
            .iter()
            .find(|item| item.archetype_id == archetype_id)
            .map_or(0, |item| item.quantity)
    }
}

/// A roster crew with its core skills scaled by the event bonus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusCrew {
    pub crew_id: i64,
    pub symbol: String,
    pub name: String,
    #[serde(skip)]
    pub raw_traits: Vec<String>,
    pub skills: BTreeMap<Skill, f64>,
}

impl BonusCrew {
    fn skill_value(&self, key: Option<&String>) -> f64 {
        key.and_then(|key| Skill::from_key(key))
            .and_then(|skill| self.skills.get(&skill))
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotKind {
    Single,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCrew {
    pub crew_id: i64,
    pub symbol: String,
    pub name: String,
    pub total: f64,
    /// Success chance as an integer percent, at most 100.
    pub chance: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalcSlot {
    pub kind: SlotKind,
    pub skills: Vec<String>,
    pub best_crew: Vec<RankedCrew>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandLine {
    pub archetype_id: i64,
    pub count: u32,
    pub name: String,
    pub have: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDemand {
    pub equipment_id: i64,
    pub symbol: String,
    pub name: String,
    pub best_crew_chance: u32,
    pub slot: CalcSlot,
    pub craft_cost: f64,
    pub have: u32,
    pub demands: Vec<DemandLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmEntry {
    pub archetype_id: i64,
    pub symbol: String,
    pub name: String,
    /// Counts per recipe using the item, e.g. `2x,1x`.
    pub uses: String,
    pub have: u32,
}

/// Non-buyback crew with each skill's core multiplied by the event bonus for
/// that crew (1 when the crew has none).
pub fn roster_with_bonuses(roster: &[CrewData], crew_bonuses: &HashMap<String, f64>) -> Vec<BonusCrew> {
    roster
        .iter()
        .filter(|crew| !crew.buyback)
        .map(|crew| {
            let bonus = crew_bonuses
                .get(&crew.symbol)
                .copied()
                .filter(|bonus| *bonus != 0.0)
                .unwrap_or(1.0);
            BonusCrew {
                crew_id: crew.id,
                symbol: crew.symbol.clone(),
                name: crew.name.clone(),
                raw_traits: crew.raw_traits.clone(),
                skills: Skill::ALL
                    .iter()
                    .map(|&skill| (skill, crew.skill(skill).core * bonus))
                    .collect(),
            }
        })
        .collect()
}

/// Logistic craft success chance for a skill value, capped at the server's maximum.
pub fn calc_chance(skill: f64, craft: &CraftConfig) -> f64 {
    let formula = craft.specialist_chance_formula;
    let offset = skill / craft.specialist_challenge_rating;
    let percent = (100.0 / (1.0 + (-formula.steepness * (offset - formula.midpoint)).exp())).floor();
    (percent / 100.0).min(craft.specialist_maximum_success_chance)
}

/// Ranks `best_crew` for one jackpot recipe. `None` for archetypes without one.
pub fn process_archetype(
    archetype: &ItemArchetype,
    best_crew: &[BonusCrew],
    ctx: GalaxyContext<'_>,
) -> Option<ItemDemand> {
    let recipe = archetype.recipe.as_ref()?;
    let jackpot = recipe.jackpot.as_ref()?;

    let (kind, skills) = match jackpot.skills.as_slice() {
        [single] => {
            let parts: Vec<String> = single.split(',').map(str::to_owned).collect();
            let kind = if parts.len() == 1 {
                SlotKind::Single
            } else {
                SlotKind::And
            };
            (kind, parts)
        }
        _ => (SlotKind::Or, jackpot.skills.clone()),
    };
    let total = |crew: &BonusCrew| {
        let first = crew.skill_value(skills.first());
        let second = crew.skill_value(skills.get(1));
        match kind {
            SlotKind::Single => first,
            SlotKind::And => ((first + second) / 2.0).floor(),
            SlotKind::Or => first.max(second),
        }
    };

    let mut seen = HashSet::new();
    let mut scored: Vec<(&BonusCrew, f64, f64)> = best_crew
        .iter()
        .map(|crew| (crew, total(crew)))
        .filter(|(_, total)| *total > 0.0)
        .filter(|(crew, _)| seen.insert(crew.crew_id))
        .map(|(crew, total)| {
            let bonus: f64 = jackpot
                .trait_bonuses
                .iter()
                .flatten()
                .filter(|(name, _)| crew.raw_traits.iter().any(|raw| raw == *name))
                .map(|(_, bonus)| bonus)
                .sum();
            (crew, total, calc_chance(total, ctx.craft) + bonus)
        })
        .collect();
    scored.sort_by(|a, b| a.2.total_cmp(&b.2));
    scored.reverse();

    let ranked: Vec<RankedCrew> = scored
        .into_iter()
        .map(|(crew, total, chance)| RankedCrew {
            crew_id: crew.crew_id,
            symbol: crew.symbol.clone(),
            name: crew.name.clone(),
            total,
            chance: (chance.min(1.0) * 100.0).floor() as u32,
            label: format!("{} ({})", crew.name, total),
        })
        .collect();
    let best_crew_chance = ranked.first().map_or(0, |crew| crew.chance);

    let demands = recipe
        .demands
        .iter()
        .map(|demand| DemandLine {
            archetype_id: demand.archetype_id,
            count: demand.count,
            name: ctx
                .archetype(demand.archetype_id)
                .map(|archetype| archetype.name.clone())
                .unwrap_or_default(),
            have: ctx.owned(demand.archetype_id),
        })
        .collect();

    Some(ItemDemand {
        equipment_id: archetype.id,
        symbol: archetype.symbol.clone(),
        name: archetype.name.clone(),
        best_crew_chance,
        slot: CalcSlot {
            kind,
            skills,
            best_crew: ranked,
        },
        craft_cost: craft_cost(archetype, ctx.craft),
        have: ctx.owned(archetype.id),
        demands,
    })
}

fn craft_cost(archetype: &ItemArchetype, craft: &CraftConfig) -> f64 {
    let costs = match archetype.item_type {
        3 => &craft.cost_by_rarity_for_component,
        2 => &craft.cost_by_rarity_for_equipment,
        item_type => {
            warn!(id = archetype.id, item_type, "equipment of unknown type");
            return 0.0;
        }
    };
    match costs.get(archetype.rarity) {
        Some(cost) => cost.amount,
        None => {
            warn!(id = archetype.id, rarity = archetype.rarity, "no craft cost for rarity");
            0.0
        }
    }
}

/// Whether an archetype is crafted for the event: its jackpot carries trait bonuses.
pub fn is_event_recipe(archetype: &ItemArchetype) -> bool {
    archetype
        .recipe
        .as_ref()
        .and_then(|recipe| recipe.jackpot.as_ref())
        .is_some_and(|jackpot| jackpot.trait_bonuses.is_some())
}

/// Every event recipe in the archetype cache, ranked against the roster.
pub fn plan_galaxy_event(
    roster: &[CrewData],
    crew_bonuses: &HashMap<String, f64>,
    ctx: GalaxyContext<'_>,
) -> Vec<ItemDemand> {
    let bonus_crew = roster_with_bonuses(roster, crew_bonuses);
    ctx.archetypes
        .iter()
        .filter(|archetype| is_event_recipe(archetype))
        .filter_map(|archetype| process_archetype(archetype, &bonus_crew, ctx))
        .collect()
}

/// The `content.crew_bonuses` map of an event.
pub fn event_crew_bonuses(event: &Value) -> HashMap<String, f64> {
    event
        .pointer("/content/crew_bonuses")
        .and_then(Value::as_object)
        .map(|bonuses| {
            bonuses
                .iter()
                .filter_map(|(symbol, bonus)| Some((symbol.clone(), bonus.as_f64()?)))
                .collect()
        })
        .unwrap_or_default()
}

/// VP awarded for a full set of rare turn-ins.
pub const RARE_TURNIN_VP: f64 = 4850.0;

/// Where the player stands against the event's top threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventProgress {
    pub victory_points: f64,
    pub top_threshold: Option<f64>,
    /// Owned units of the item the rare (golden octopus) adventure demands.
    pub rare_count: u32,
    pub rare_turnin_count: Option<u32>,
    pub vp_per_turnin: Option<f64>,
    pub rare_vp: Option<f64>,
    pub turnins_to_top: Option<f64>,
    pub turnins_to_top_with_rares: Option<f64>,
}

/// Turn-in arithmetic for a gather event. The turn-in fields stay `None` once
/// the top threshold is reached or when the pool lists no turn-in reward.
pub fn event_progress(event: &Value, items: &[ItemDto]) -> EventProgress {
    let victory_points = event
        .get("victory_points")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let top_threshold = event
        .get("threshold_rewards")
        .and_then(Value::as_array)
        .and_then(|thresholds| thresholds.last())
        .and_then(|threshold| threshold.get("points"))
        .and_then(Value::as_f64);
    let pool = event.pointer("/content/gather_pools/0");
    let vp_per_turnin = pool
        .and_then(|pool| pool.pointer("/rewards/0/quantity"))
        .and_then(Value::as_f64)
        .filter(|vp| *vp > 0.0);

    let rare_demand = pool
        .and_then(|pool| pool.get("adventures"))
        .and_then(Value::as_array)
        .and_then(|adventures| {
            adventures.iter().find(|adventure| {
                adventure
                    .get("golden_octopus")
                    .is_some_and(|flag| flag.as_bool().unwrap_or(!flag.is_null()))
            })
        })
        .and_then(|adventure| adventure.pointer("/demands/0"));
    let rare_archetype = rare_demand
        .and_then(|demand| demand.get("archetype_id"))
        .and_then(Value::as_i64);
    let rare_turnin_count = rare_demand
        .and_then(|demand| demand.get("count"))
        .and_then(Value::as_u64)
        .and_then(|count| u32::try_from(count).ok())
        .filter(|count| *count > 0);
    let rare_count = rare_archetype
        .and_then(|id| items.iter().find(|item| item.archetype_id == id))
        .map_or(0, |item| item.quantity);

    let rare_vp = match (rare_turnin_count, vp_per_turnin) {
        (Some(count), Some(_)) => Some(f64::from(rare_count) / f64::from(count) * RARE_TURNIN_VP),
        _ => None,
    };

    let mut progress = EventProgress {
        victory_points,
        top_threshold,
        rare_count,
        rare_turnin_count,
        vp_per_turnin,
        rare_vp,
        ..EventProgress::default()
    };
    if let (Some(top), Some(per_turnin)) = (top_threshold, vp_per_turnin) {
        if top > victory_points {
            let remaining = top - victory_points;
            progress.turnins_to_top = Some(remaining / per_turnin);
            progress.turnins_to_top_with_rares = rare_vp
                .filter(|vp| *vp > 0.0)
                .map(|vp| (remaining - vp) / per_turnin);
        }
    }
    progress
}

/// Items the planned recipes consume, in first-use order.
pub fn farming_list(plan: &[ItemDemand], ctx: GalaxyContext<'_>) -> Vec<FarmEntry> {
    let mut entries: Vec<FarmEntry> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();
    for demand in plan.iter().flat_map(|item| &item.demands) {
        match index.get(&demand.archetype_id) {
            Some(&position) => {
                let uses = &mut entries[position].uses;
                uses.push_str(&format!(",{}x", demand.count));
            }
            None => {
                let archetype = ctx.archetype(demand.archetype_id);
                index.insert(demand.archetype_id, entries.len());
                entries.push(FarmEntry {
                    archetype_id: demand.archetype_id,
                    symbol: archetype.map(|a| a.symbol.clone()).unwrap_or_default(),
                    name: archetype.map(|a| a.name.clone()).unwrap_or_default(),
                    uses: format!("{}x", demand.count),
                    have: ctx.owned(demand.archetype_id),
                });
            }
        }
    }
    entries
}
