//! Roster export as CSV, one row per crew.

use std::io::Write;

use thiserror::Error;

use crate::data::crew::CrewData;
use crate::data::skills::Skill;

#[derive(Debug, Error)]
pub enum CsvExportError {
    #[error("failed to write roster csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush roster csv: {0}")]
    Io(#[from] std::io::Error),
}

pub fn roster_csv_header() -> Vec<String> {
    let mut header: Vec<String> = [
        "id",
        "crew_id",
        "symbol",
        "name",
        "rarity",
        "max_rarity",
        "level",
        "frozen",
        "buyback",
        "favorite",
    ]
    .iter()
    .map(|column| column.to_string())
    .collect();
    for skill in Skill::ALL {
        for stat in ["core", "min", "max"] {
            header.push(format!("{}_{stat}", skill.key()));
        }
    }
    header.extend(
        ["voyage_score", "gauntlet_score", "usage_value", "traits"]
            .iter()
            .map(|column| column.to_string()),
    );
    header
}

fn roster_csv_row(crew: &CrewData) -> Vec<String> {
    let mut row = vec![
        crew.id.to_string(),
        crew.crew_id.to_string(),
        crew.symbol.clone(),
        crew.name.clone(),
        crew.rarity.to_string(),
        crew.max_rarity.to_string(),
        crew.level.to_string(),
        crew.frozen.to_string(),
        crew.buyback.to_string(),
        crew.favorite.to_string(),
    ];
    for skill in Skill::ALL {
        let data = crew.skill(skill);
        row.push(data.core.to_string());
        row.push(data.min.to_string());
        row.push(data.max.to_string());
    }
    row.push(crew.voyage_score.to_string());
    row.push(crew.gauntlet_score.to_string());
    row.push(crew.usage_value.to_string());
    row.push(crew.traits.clone());
    row
}

pub fn write_roster_csv<W: Write>(roster: &[CrewData], writer: W) -> Result<(), CsvExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(roster_csv_header())?;
    for crew in roster {
        csv.write_record(roster_csv_row(crew))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn roster_csv_string(roster: &[CrewData]) -> Result<String, CsvExportError> {
    let mut buffer = Vec::new();
    write_roster_csv(roster, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
