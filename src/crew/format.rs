use std::fmt::Write as _;

use crate::data::crew::CrewData;
use crate::data::skills::Skill;

/// Compact tooltip label: `"CMD (123) SCI (98) "` for every skill with a positive core.
pub fn format_crew_stats(crew: &CrewData) -> String {
    let mut label = String::new();
    for skill in Skill::ALL {
        let Some(data) = crew.skills.get(&skill) else {
            continue;
        };
        if data.core > 0.0 {
            let value = (data.core + (data.min + data.max) / 2.0).floor() as i64;
            let _ = write!(label, "{} ({}) ", skill.short_label(), value);
        }
    }
    label
}
