//! Builds roster rows from the three crew sources: the active roster, the
//! stasis vault (frozen crew) and imported all-crew catalogs.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;

use futures_util::future::try_join_all;
use tracing::{error, info, warn};

use crate::crew::buffs::BuffConfig;
use crate::crew::usage::rank_usage;
use crate::data::catalog::{AvatarCatalog, PlatformConfig};
use crate::data::crew::{CrewData, CrewDto, CrewEquipmentSlot, CrewStatus, SkillData};
use crate::data::player::CharacterDto;
use crate::data::skills::Skill;

/// Raw trait rewritten so searching for aliens finds non-human crew. The value
/// is what the game client has always shipped, misspelling included.
pub const NONHUMAN_TRAIT: &str = "nonhuman";
pub const NONHUMAN_TRAIT_REPLACEMENT: &str = "alient";

/// Level and rarity every frozen crew is shown at.
pub const FROZEN_CREW_LEVEL: u32 = 100;

/// Everything the roster build reads besides the crew records themselves.
#[derive(Debug, Clone, Copy)]
pub struct RosterContext<'a> {
    pub buffs: &'a BuffConfig,
    pub avatars: &'a AvatarCatalog,
    pub platform: &'a PlatformConfig,
}

/// Where frozen crew records come from. Implementations return records that
/// already carry the current buffs.
pub trait FrozenCrewSource {
    type Error;

    fn frozen_crew(&self, symbol: &str) -> impl Future<Output = Result<CrewDto, Self::Error>> + Send;
}

/// Per-crew transform shared by every source.
pub fn crew_to_roster(dto: &CrewDto, platform: &PlatformConfig) -> CrewData {
    let mut voyage_score = 0.0;
    let mut gauntlet_score = 0.0;
    let mut skills = BTreeMap::new();
    for skill in Skill::ALL {
        let raw = dto.skills.get(skill.key()).copied().unwrap_or_default();
        let proficiency_avg = (raw.range_max + raw.range_min) / 2.0;
        let data = SkillData {
            core: raw.core,
            min: raw.range_min,
            max: raw.range_max,
            voy: raw.core + proficiency_avg,
        };
        voyage_score += data.voy;
        gauntlet_score += proficiency_avg;
        skills.insert(skill, data);
    }

    let mut equipment_slots: Vec<CrewEquipmentSlot> = dto
        .equipment_slots
        .iter()
        .map(|slot| CrewEquipmentSlot {
            level: slot.level,
            archetype: slot.archetype,
            have: false,
        })
        .collect();
    for owned in &dto.equipment {
        let Some(&index) = owned.first() else {
            continue;
        };
        match usize::try_from(index)
            .ok()
            .and_then(|index| equipment_slots.get_mut(index))
        {
            Some(slot) => slot.have = true,
            None => warn!(symbol = %dto.symbol, index, "equipment index outside slot list"),
        }
    }

    let mut raw_traits: Vec<String> = dto
        .traits
        .iter()
        .chain(&dto.traits_hidden)
        .cloned()
        .collect();
    let traits = raw_traits
        .iter()
        .map(|raw| platform.trait_name(raw))
        .collect::<Vec<_>>()
        .join(",");
    if let Some(position) = raw_traits.iter().position(|t| t == NONHUMAN_TRAIT) {
        raw_traits[position] = NONHUMAN_TRAIT_REPLACEMENT.to_string();
    }

    CrewData {
        id: dto.archetype_id,
        avatar_id: dto.archetype_id,
        crew_id: dto.id.unwrap_or(0),
        symbol: dto.symbol.clone(),
        name: dto.name.clone(),
        short_name: dto.short_name.clone(),
        portrait: dto.portrait.clone(),
        full_body: dto.full_body.clone(),

        buyback: dto.in_buy_back_state,
        frozen: 0,
        is_external: false,
        expires_in: dto.expires_in,
        status: CrewStatus {
            frozen: 0,
            buyback: dto.in_buy_back_state,
            expires_in: dto.expires_in,
            active: !dto.in_buy_back_state,
            external: false,
        },

        rarity: dto.rarity,
        max_rarity: dto.max_rarity,
        level: dto.level,
        max_level: dto.max_level,
        favorite: dto.favorite,
        flavor: dto.flavor.clone(),
        active_id: dto.active_id,
        action: dto.action.clone(),
        ship_battle: dto.ship_battle.clone(),

        traits,
        raw_traits,
        equipment_slots,
        skills,

        voyage_score,
        gauntlet_score,
        usage_value: 0,
        archetypes: None,
    }
}

/// Active roster rows. The server already applied buffs to these records.
pub fn build_active_roster(crew: &[CrewDto], ctx: RosterContext<'_>) -> Vec<CrewData> {
    crew.iter()
        .filter(|dto| {
            let known = ctx.avatars.by_id(dto.archetype_id).is_some();
            if !known {
                error!(archetype_id = dto.archetype_id, "no crew avatar for archetype");
            }
            known
        })
        .map(|dto| crew_to_roster(dto, ctx.platform))
        .collect()
}

/// Hands out ids for frozen rows that have no server instance id.
#[derive(Debug)]
pub struct SyntheticIds {
    next: i64,
}

impl Default for SyntheticIds {
    fn default() -> Self {
        Self { next: -1 }
    }
}

impl SyntheticIds {
    pub fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next -= 1;
        id
    }
}

/// Roster row for a frozen crew with `quantity` copies in the vault.
pub fn frozen_roster_entry(
    dto: &CrewDto,
    quantity: u32,
    platform: &PlatformConfig,
    ids: &mut SyntheticIds,
) -> CrewData {
    let mut entry = crew_to_roster(dto, platform);
    if entry.crew_id <= 0 {
        entry.crew_id = ids.next_id();
    }
    entry.frozen = quantity;
    entry.status.frozen = quantity;
    entry.status.active = false;
    entry.status.buyback = false;
    entry.level = FROZEN_CREW_LEVEL;
    entry.rarity = entry.max_rarity;
    entry
}

/// Active plus frozen roster with usage ranking applied.
///
/// Frozen records are fetched concurrently; any failed fetch fails the build.
pub async fn build_crew_data<S>(
    character: &CharacterDto,
    ctx: RosterContext<'_>,
    source: &S,
) -> Result<Vec<CrewData>, S::Error>
where
    S: FrozenCrewSource + Sync,
{
    let mut roster = build_active_roster(&character.crew, ctx);

    let mut pending = Vec::with_capacity(character.stored_immortals.len());
    for immortal in &character.stored_immortals {
        let Some(avatar) = ctx.avatars.by_id(immortal.id) else {
            error!(archetype_id = immortal.id, "no crew avatar for frozen archetype");
            continue;
        };
        let quantity = immortal.quantity;
        let symbol = avatar.symbol.as_str();
        pending.push(async move {
            source
                .frozen_crew(symbol)
                .await
                .map(|dto| (dto, quantity))
        });
    }

    let frozen = try_join_all(pending).await?;
    let mut ids = SyntheticIds::default();
    roster.extend(
        frozen
            .iter()
            .map(|(dto, quantity)| frozen_roster_entry(dto, *quantity, ctx.platform, &mut ids)),
    );

    rank_usage(&mut roster);
    info!(
        active = character.crew.len(),
        frozen = frozen.len(),
        total = roster.len(),
        "roster built"
    );
    Ok(roster)
}

/// Roster rows for an imported catalog, normalized with the local player's buffs.
/// Records repeating an earlier `(symbol, level, rarity)` are dropped.
pub fn build_crew_data_all(all_crew: &[CrewDto], ctx: RosterContext<'_>) -> Vec<CrewData> {
    let mut seen = HashSet::new();
    let mut roster = Vec::new();
    for crew in all_crew {
        let key = format!("{}.{}.{}", crew.symbol, crew.level, crew.rarity);
        if !seen.insert(key) {
            continue;
        }
        if ctx.avatars.by_symbol(&crew.symbol).is_none() {
            error!(archetype_id = crew.archetype_id, symbol = %crew.symbol, "no crew avatar for catalog entry");
            continue;
        }
        let mut crew = crew.clone();
        ctx.buffs.apply_to(&mut crew);
        let mut entry = crew_to_roster(&crew, ctx.platform);
        entry.is_external = true;
        entry.status.external = true;
        entry.archetypes = crew.archetypes.clone();
        roster.push(entry);
    }
    roster
}
