use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use ready_room::crew::usage::{collect_usage, RankField, TOP_CORE};
use ready_room::crew::{
    build_crew_data, build_crew_data_all, crew_to_roster, BuffConfig, BuffStat, FrozenCrewSource,
    RosterContext,
};
use ready_room::data::catalog::{AvatarCatalog, CrewAvatar, PlatformConfig};
use ready_room::data::crew::{CrewData, CrewDto};
use ready_room::data::player::{BuffEntry, CharacterDto};
use ready_room::data::skills::{Skill, SkillStat};
use serde_json::json;

fn dto(value: serde_json::Value) -> CrewDto {
    serde_json::from_value(value).expect("crew record should decode")
}

fn avatar(id: i64, symbol: &str) -> CrewAvatar {
    serde_json::from_value(json!({ "id": id, "symbol": symbol, "name": symbol }))
        .expect("avatar should decode")
}

fn command_crew(crew_id: i64, core: f64) -> CrewData {
    let record = dto(json!({
        "id": crew_id,
        "archetype_id": crew_id,
        "symbol": format!("crew_{crew_id}"),
        "skills": { "command_skill": { "core": core, "range_min": 0, "range_max": 0 } }
    }));
    crew_to_roster(&record, &PlatformConfig::default())
}

struct CountingSource {
    crew: HashMap<String, CrewDto>,
    calls: AtomicUsize,
}

impl FrozenCrewSource for CountingSource {
    type Error = String;

    async fn frozen_crew(&self, symbol: &str) -> Result<CrewDto, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.crew
            .get(symbol)
            .cloned()
            .ok_or_else(|| format!("no frozen record for {symbol}"))
    }
}

#[test]
fn untouched_skill_stats_keep_identity_buffs() {
    let buffs = BuffConfig::calculate(
        &[BuffEntry::new("command_skill_core", "multiplier", 3.0)],
        &[BuffEntry::new("medicine_skill_range_max", "percent_increase", 0.2)],
    );
    for skill in Skill::ALL {
        for stat in SkillStat::ALL {
            let touched = matches!(
                (skill, stat),
                (Skill::CommandSkill, SkillStat::Core) | (Skill::MedicineSkill, SkillStat::RangeMax)
            );
            if !touched {
                assert_eq!(buffs.get(skill.key(), stat), Some(BuffStat::default()));
            }
        }
    }
}

#[test]
fn multiplier_buff_doubles_base_core() {
    let buffs = BuffConfig::calculate(&[BuffEntry::new("command_skill_core", "multiplier", 2.0)], &[]);
    let mut crew = dto(json!({
        "archetype_id": 1, "symbol": "kirk",
        "base_skills": { "command_skill": { "core": 10, "range_min": 5, "range_max": 15 } }
    }));
    buffs.apply_to(&mut crew);
    assert_eq!(crew.skills["command_skill"].core, 20.0);
    assert_eq!(crew.skills["command_skill"].range_min, 5.0);
}

#[test]
fn catalog_duplicates_collapse_to_first_entry() {
    let buffs = BuffConfig::default();
    let avatars = AvatarCatalog::from_avatars(vec![avatar(1, "kirk"), avatar(2, "spock")]);
    let platform = PlatformConfig::default();
    let ctx = RosterContext {
        buffs: &buffs,
        avatars: &avatars,
        platform: &platform,
    };
    let records = vec![
        dto(json!({ "archetype_id": 1, "symbol": "kirk", "name": "First", "level": 50, "rarity": 2 })),
        dto(json!({ "archetype_id": 1, "symbol": "kirk", "name": "Second", "level": 50, "rarity": 2 })),
        dto(json!({ "archetype_id": 1, "symbol": "kirk", "name": "Higher", "level": 60, "rarity": 2 })),
        dto(json!({ "archetype_id": 2, "symbol": "spock", "name": "Spock", "level": 50, "rarity": 2 })),
        dto(json!({ "archetype_id": 9, "symbol": "nobody", "name": "Nobody", "level": 1, "rarity": 1 })),
    ];

    let roster = build_crew_data_all(&records, ctx);
    let names: Vec<&str> = roster.iter().map(|crew| crew.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Higher", "Spock"]);
    assert!(roster.iter().all(|crew| crew.is_external && crew.status.external));
}

#[test]
fn catalog_records_are_normalized_with_local_buffs() {
    let buffs = BuffConfig::calculate(&[BuffEntry::new("science_skill_core", "percent_increase", 0.5)], &[]);
    let avatars = AvatarCatalog::from_avatars(vec![avatar(2, "spock")]);
    let platform = PlatformConfig::default();
    let ctx = RosterContext {
        buffs: &buffs,
        avatars: &avatars,
        platform: &platform,
    };
    let records = vec![dto(json!({
        "archetype_id": 2, "symbol": "spock",
        "skills": { "science_skill": { "core": 1, "range_min": 1, "range_max": 1 } },
        "base_skills": { "science_skill": { "core": 100, "range_min": 10, "range_max": 30 } }
    }))];

    let roster = build_crew_data_all(&records, ctx);
    let science = roster[0].skill(Skill::ScienceSkill);
    assert_eq!(science.core, 150.0);
    assert_eq!(science.voy, 170.0);
}

#[test]
fn top_six_by_core_and_frozen_overflow() {
    let mut roster: Vec<CrewData> = (1..=10)
        .map(|index| command_crew(index, 100.0 * index as f64))
        .collect();
    let mut frozen = command_crew(11, 750.0);
    frozen.frozen = 1;
    roster.push(frozen);

    collect_usage(&mut roster, RankField::Core(Skill::CommandSkill), TOP_CORE);

    let picked: Vec<i64> = roster
        .iter()
        .filter(|crew| crew.usage_value >= 1)
        .map(|crew| crew.crew_id)
        .collect();
    // 1000..=500 by core plus the frozen crew at 750
    assert_eq!(picked, vec![5, 6, 7, 8, 9, 10, 11]);
    assert_eq!(roster[3].usage_value, 0);
}

#[test]
fn nonhuman_trait_becomes_alient() {
    let crew = crew_to_roster(
        &dto(json!({
            "archetype_id": 3, "symbol": "worf",
            "traits": ["klingon", "nonhuman"], "traits_hidden": ["nonhuman"]
        })),
        &PlatformConfig::default(),
    );
    assert_eq!(crew.raw_traits, vec!["klingon", "alient", "nonhuman"]);
    assert_eq!(crew.traits, "klingon,nonhuman,nonhuman");
}

#[tokio::test]
async fn roster_build_is_deterministic_and_fetches_frozen_crew() {
    let buffs = BuffConfig::default();
    let avatars = AvatarCatalog::from_avatars(vec![avatar(1, "kirk"), avatar(4, "data")]);
    let platform = PlatformConfig::default();
    let ctx = RosterContext {
        buffs: &buffs,
        avatars: &avatars,
        platform: &platform,
    };
    let character: CharacterDto = serde_json::from_value(json!({
        "crew": [{
            "id": 10, "archetype_id": 1, "symbol": "kirk",
            "skills": { "command_skill": { "core": 1200, "range_min": 200, "range_max": 400 } }
        }],
        "stored_immortals": [{ "id": 4, "quantity": 2 }, { "id": 77, "quantity": 1 }]
    }))
    .expect("character should decode");
    let source = CountingSource {
        crew: HashMap::from([(
            "data".to_string(),
            dto(json!({
                "archetype_id": 4, "symbol": "data", "rarity": 1, "max_rarity": 5,
                "skills": { "science_skill": { "core": 1000, "range_min": 250, "range_max": 500 } }
            })),
        )]),
        calls: AtomicUsize::new(0),
    };

    let first = build_crew_data(&character, ctx, &source).await.expect("first build");
    let second = build_crew_data(&character, ctx, &source).await.expect("second build");

    assert_eq!(first.len(), 2);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.voyage_score, b.voyage_score);
        assert_eq!(a.gauntlet_score, b.gauntlet_score);
        assert_eq!(a.usage_value, b.usage_value);
    }

    let data = &first[1];
    assert_eq!(data.frozen, 2);
    assert_eq!(data.level, 100);
    assert_eq!(data.rarity, 5);
    assert_eq!(data.crew_id, -1);
    assert!(!data.status.active);
    assert_eq!(data.voyage_score, 1375.0);
}

#[tokio::test]
async fn failed_frozen_fetch_fails_the_build() {
    let buffs = BuffConfig::default();
    let avatars = AvatarCatalog::from_avatars(vec![avatar(4, "data")]);
    let platform = PlatformConfig::default();
    let ctx = RosterContext {
        buffs: &buffs,
        avatars: &avatars,
        platform: &platform,
    };
    let character: CharacterDto =
        serde_json::from_value(json!({ "stored_immortals": [{ "id": 4, "quantity": 1 }] }))
            .expect("character should decode");
    let source = CountingSource {
        crew: HashMap::new(),
        calls: AtomicUsize::new(0),
    };

    let result = build_crew_data(&character, ctx, &source).await;
    assert_eq!(result.unwrap_err(), "no frozen record for data");
}
