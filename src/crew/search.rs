//! Roster text filter.
//!
//! `;` separates alternatives; inside one alternative every space-separated
//! term must match the crew name, display traits or a raw trait.

use crate::data::crew::CrewData;

pub fn crew_matches(crew: &CrewData, query: &str) -> bool {
    let query = query.to_lowercase();
    query.split(';').any(|segment| {
        if segment.trim().is_empty() {
            return false;
        }
        segment.split(' ').all(|term| {
            if term.trim().is_empty() {
                return false;
            }
            crew.name.to_lowercase().contains(term)
                || crew.traits.to_lowercase().contains(term)
                || crew
                    .raw_traits
                    .iter()
                    .any(|raw| raw.to_lowercase().contains(term))
        })
    })
}

pub fn filter_crew<'a>(roster: &'a [CrewData], query: &str) -> Vec<&'a CrewData> {
    roster
        .iter()
        .filter(|crew| crew_matches(crew, query))
        .collect()
}
