//! The fixed skill vocabulary used by crew stats, buffs and labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the six crew skills. Serialized with the server's key names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    CommandSkill,
    DiplomacySkill,
    SecuritySkill,
    EngineeringSkill,
    ScienceSkill,
    MedicineSkill,
}

impl Skill {
    pub const ALL: [Skill; 6] = [
        Skill::CommandSkill,
        Skill::DiplomacySkill,
        Skill::SecuritySkill,
        Skill::EngineeringSkill,
        Skill::ScienceSkill,
        Skill::MedicineSkill,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Skill::CommandSkill => "command_skill",
            Skill::DiplomacySkill => "diplomacy_skill",
            Skill::SecuritySkill => "security_skill",
            Skill::EngineeringSkill => "engineering_skill",
            Skill::ScienceSkill => "science_skill",
            Skill::MedicineSkill => "medicine_skill",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Skill::CommandSkill => "CMD",
            Skill::DiplomacySkill => "DIP",
            Skill::SecuritySkill => "SEC",
            Skill::EngineeringSkill => "ENG",
            Skill::ScienceSkill => "SCI",
            Skill::MedicineSkill => "MED",
        }
    }

    pub fn from_key(key: &str) -> Option<Skill> {
        Skill::ALL.into_iter().find(|skill| skill.key() == key)
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The per-skill stat a buff can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillStat {
    Core,
    RangeMin,
    RangeMax,
}

impl SkillStat {
    pub const ALL: [SkillStat; 3] = [SkillStat::Core, SkillStat::RangeMin, SkillStat::RangeMax];

    pub fn key(self) -> &'static str {
        match self {
            SkillStat::Core => "core",
            SkillStat::RangeMin => "range_min",
            SkillStat::RangeMax => "range_max",
        }
    }
}

/// Buff table key, e.g. `command_skill_range_min`.
pub fn skill_stat_key(skill: &str, stat: SkillStat) -> String {
    format!("{skill}_{}", stat.key())
}
