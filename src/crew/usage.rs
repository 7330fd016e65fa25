//! Usage ranking: how often a crew member lands in the top picks across skills.

use crate::data::crew::{CrewData, SkillData};
use crate::data::skills::Skill;

pub const TOP_CORE: usize = 6;
pub const TOP_PROFICIENCY_MAX: usize = 3;
pub const TOP_VOYAGE: usize = 9;
pub const TOP_ROSTER_SCORE: usize = 9;

/// A value a ranking pass sorts crew by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankField {
    Core(Skill),
    Max(Skill),
    Voy(Skill),
    VoyageScore,
    GauntletScore,
}

impl RankField {
    pub fn value(self, crew: &CrewData) -> f64 {
        let skill = |skill: Skill, pick: fn(SkillData) -> f64| pick(crew.skill(skill));
        match self {
            RankField::Core(s) => skill(s, |d| d.core),
            RankField::Max(s) => skill(s, |d| d.max),
            RankField::Voy(s) => skill(s, |d| d.voy),
            RankField::VoyageScore => crew.voyage_score,
            RankField::GauntletScore => crew.gauntlet_score,
        }
    }
}

/// Every ranking pass with its cutoff, in the order they run.
pub fn ranking_passes() -> Vec<(RankField, usize)> {
    let mut passes = Vec::with_capacity(Skill::ALL.len() * 3 + 2);
    for skill in Skill::ALL {
        passes.push((RankField::Core(skill), TOP_CORE));
        passes.push((RankField::Max(skill), TOP_PROFICIENCY_MAX));
        passes.push((RankField::Voy(skill), TOP_VOYAGE));
    }
    passes.push((RankField::VoyageScore, TOP_ROSTER_SCORE));
    passes.push((RankField::GauntletScore, TOP_ROSTER_SCORE));
    passes
}

/// Bumps `usage_value` for the top `cutoff` non-buyback crew with a positive value.
///
/// Frozen crew are counted but extend the cutoff by one each, so they never
/// push an active crew out of the top picks.
pub fn collect_usage(roster: &mut [CrewData], field: RankField, cutoff: usize) {
    let mut ranked: Vec<(usize, f64)> = roster
        .iter()
        .enumerate()
        .filter(|(_, crew)| !crew.buyback)
        .map(|(index, crew)| (index, field.value(crew)))
        .filter(|(_, value)| *value > 0.0)
        .collect();
    ranked.sort_by(|left, right| right.1.total_cmp(&left.1));

    let mut cutoff = cutoff;
    let mut position = 0;
    while position < cutoff && position < ranked.len() {
        let crew = &mut roster[ranked[position].0];
        if crew.frozen > 0 {
            cutoff += 1;
        }
        crew.usage_value += 1;
        position += 1;
    }
}

/// Runs every ranking pass over the roster.
pub fn rank_usage(roster: &mut [CrewData]) {
    for (field, cutoff) in ranking_passes() {
        collect_usage(roster, field, cutoff);
    }
}
