//! Collection and starbase buffs folded into a per `<skill>_<stat>` table, and
//! the normalizer that applies that table to a crew record's base skills.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::crew::{CrewDto, SkillDto};
use crate::data::player::BuffEntry;
use crate::data::skills::{skill_stat_key, Skill, SkillStat};

/// Accumulated buff for one `<skill>_<stat>` key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuffStat {
    pub multiplier: f64,
    pub percent_increase: f64,
}

impl Default for BuffStat {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            percent_increase: 0.0,
        }
    }
}

impl BuffStat {
    /// `multiplier + percent_increase`. The game adds the two; it does not compound them.
    pub fn effective_multiplier(self) -> f64 {
        self.multiplier + self.percent_increase
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuffOperator {
    PercentIncrease,
    Multiplier,
}

impl BuffOperator {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "percent_increase" => Some(Self::PercentIncrease),
            "multiplier" => Some(Self::Multiplier),
            _ => None,
        }
    }
}

/// The full buff table. Every skill/stat key is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuffConfig {
    stats: BTreeMap<String, BuffStat>,
}

impl Default for BuffConfig {
    fn default() -> Self {
        let mut stats = BTreeMap::new();
        for skill in Skill::ALL {
            for stat in SkillStat::ALL {
                stats.insert(skill_stat_key(skill.key(), stat), BuffStat::default());
            }
        }
        Self { stats }
    }
}

impl BuffConfig {
    /// Folds collection buffs then starbase buffs over the identity table.
    pub fn calculate(collection_buffs: &[BuffEntry], starbase_buffs: &[BuffEntry]) -> Self {
        let mut config = Self::default();
        for buff in collection_buffs.iter().chain(starbase_buffs) {
            config.apply(buff);
        }
        config
    }

    fn apply(&mut self, buff: &BuffEntry) {
        let Some(entry) = self.stats.get_mut(&buff.stat) else {
            warn!(stat = %buff.stat, "ignoring buff for unknown stat");
            return;
        };
        match BuffOperator::parse(&buff.operator) {
            Some(BuffOperator::PercentIncrease) => entry.percent_increase += buff.value,
            Some(BuffOperator::Multiplier) => entry.multiplier = buff.value,
            None => warn!(
                operator = %buff.operator,
                stat = %buff.stat,
                "unknown buff operator"
            ),
        }
    }

    pub fn get(&self, skill: &str, stat: SkillStat) -> Option<BuffStat> {
        self.stats.get(&skill_stat_key(skill, stat)).copied()
    }

    pub fn effective_multiplier(&self, skill: &str, stat: SkillStat) -> Option<f64> {
        self.get(skill, stat).map(BuffStat::effective_multiplier)
    }

    pub fn stats(&self) -> &BTreeMap<String, BuffStat> {
        &self.stats
    }

    /// Recomputes `crew.skills` from `crew.base_skills` in place.
    ///
    /// Skills without a base entry keep whatever the record already had. A base
    /// skill the table does not know is left alone.
    pub fn apply_to(&self, crew: &mut CrewDto) {
        for (skill, base) in &crew.base_skills {
            let (Some(core), Some(min), Some(max)) = (
                self.effective_multiplier(skill, SkillStat::Core),
                self.effective_multiplier(skill, SkillStat::RangeMin),
                self.effective_multiplier(skill, SkillStat::RangeMax),
            ) else {
                warn!(skill = %skill, symbol = %crew.symbol, "no buff entry for base skill");
                continue;
            };
            crew.skills.insert(
                skill.clone(),
                SkillDto {
                    core: (base.core * core).round(),
                    range_min: (base.range_min * min).round(),
                    range_max: (base.range_max * max).round(),
                },
            );
        }
    }
}
