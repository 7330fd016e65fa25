use std::path::PathBuf;

use ready_room::api::cache::{CONFIG_ACCESS_TOKEN, CONFIG_AUTO_LOGIN};
use ready_room::api::{
    ApiError, ApiSettings, CrewCache, FixtureTransport, JsonFileCache, MemoryCache,
    MemoryTransport, SttApi,
};
use ready_room::data::crew::CrewDto;
use ready_room::data::skills::{Skill, SkillStat};
use serde_json::{json, Value};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/fixtures")
}

fn fixture_session() -> SttApi<FixtureTransport, MemoryCache> {
    SttApi::new(
        FixtureTransport::new(fixture_dir()),
        MemoryCache::new(),
        ApiSettings::default(),
    )
}

async fn loaded_session() -> SttApi<FixtureTransport, MemoryCache> {
    let mut api = fixture_session();
    api.login("picard", "engage", true).await.expect("login");
    api.load_server_config().await.expect("server config");
    api.load_crew_archetypes().await.expect("avatars");
    api.load_platform_config().await.expect("platform config");
    api.load_player_data().await.expect("player");
    api.refresh_roster().await.expect("roster");
    api
}

#[tokio::test]
async fn login_stores_token_and_auto_login_rows() {
    let mut api = fixture_session();
    assert!(!api.logged_in());
    api.login("picard", "engage", true).await.expect("login");

    assert!(api.logged_in());
    assert_eq!(
        api.cache().config(CONFIG_AUTO_LOGIN).await.unwrap(),
        Some(Value::Bool(true))
    );
    assert_eq!(
        api.cache().config(CONFIG_ACCESS_TOKEN).await.unwrap(),
        Some(json!("fixture-access-token"))
    );
}

#[tokio::test]
async fn login_error_description_is_reported() {
    let transport = MemoryTransport::new().with_response(
        "oauth2/token",
        json!({ "error": "invalid_grant", "error_description": "Invalid credentials" }),
    );
    let mut api = SttApi::new(transport, MemoryCache::new(), ApiSettings::default());
    let err = api.login("picard", "wrong", false).await.unwrap_err();
    assert!(matches!(err, ApiError::Login(ref message) if message == "Invalid credentials"));
    assert!(!api.logged_in());
}

#[tokio::test]
async fn login_without_token_is_an_invalid_payload() {
    let transport = MemoryTransport::new().with_response("oauth2/token", json!({ "ok": true }));
    let mut api = SttApi::new(transport, MemoryCache::new(), ApiSettings::default());
    let err = api.login("picard", "engage", false).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidPayload { what: "login" }));
}

#[tokio::test]
async fn cached_token_requires_auto_login() {
    let cache = MemoryCache::new();
    cache.put_config(CONFIG_ACCESS_TOKEN, json!("saved")).await.unwrap();
    let mut api = SttApi::new(MemoryTransport::new(), cache, ApiSettings::default());
    assert!(!api.login_with_cached_access_token().await.unwrap());

    api.cache().put_config(CONFIG_AUTO_LOGIN, json!(true)).await.unwrap();
    assert!(api.login_with_cached_access_token().await.unwrap());
    assert!(api.logged_in());

    api.refresh_everything(true).await.unwrap();
    assert!(!api.logged_in());
    assert_eq!(api.cache().config(CONFIG_ACCESS_TOKEN).await.unwrap(), None);
    assert!(!api.login_with_cached_access_token().await.unwrap());
}

#[tokio::test]
async fn missing_top_level_key_fails_fast() {
    let transport = MemoryTransport::new()
        .with_response("player", json!({ "unexpected": {} }))
        .with_response("ship_schematic", json!({ "ships": [] }));
    let mut api = SttApi::new(transport, MemoryCache::new(), ApiSettings::default());
    api.login_with_access_token("token", false).await.unwrap();

    assert!(matches!(
        api.load_player_data().await,
        Err(ApiError::InvalidPayload { what: "player" })
    ));
    assert!(matches!(
        api.load_ship_schematics().await,
        Err(ApiError::InvalidPayload { what: "ship schematics" })
    ));
    assert!(matches!(api.refresh_roster().await, Err(ApiError::NotLoaded("player"))));
}

#[tokio::test]
async fn fixture_session_builds_buffed_roster() {
    let api = loaded_session().await;

    let science = api
        .buff_config()
        .effective_multiplier("science_skill", SkillStat::Core)
        .expect("science core buff");
    assert!((science - 1.1).abs() < 1e-9);
    assert!(api.last_sync().is_some());
    assert_eq!(api.item_archetypes().len(), 4);
    assert!(api.server_config().and_then(|c| c.craft_config.as_ref()).is_some());

    let roster = api.roster();
    let symbols: Vec<&str> = roster.iter().map(|crew| crew.symbol.as_str()).collect();
    assert_eq!(
        symbols,
        vec!["kirk_captain_crew", "worf_klingon_crew", "sulu_helmsman_crew", "data_android_crew"]
    );

    let kirk = &roster[0];
    assert_eq!(kirk.voyage_score, 3615.0);
    assert_eq!(kirk.gauntlet_score, 705.0);
    assert_eq!(kirk.usage_value, 11);
    let have: Vec<bool> = kirk.equipment_slots.iter().map(|slot| slot.have).collect();
    assert_eq!(have, vec![true, true, false, true]);

    let worf = &roster[1];
    assert_eq!(worf.traits, "Klingon,Nonhuman,Diplomat");
    assert_eq!(worf.raw_traits, vec!["klingon", "alient", "diplomat"]);

    let sulu = &roster[2];
    assert!(sulu.buyback);
    assert_eq!(sulu.usage_value, 0);

    let data = &roster[3];
    assert_eq!(data.frozen, 2);
    assert_eq!(data.crew_id, -1);
    assert_eq!(data.skill(Skill::ScienceSkill).core, 1100.0);
    assert_eq!(data.voyage_score, 2425.0);
    assert_eq!(data.usage_value, 8);
}

#[tokio::test]
async fn frozen_crew_is_cached_after_first_fetch() {
    let mut api = loaded_session().await;
    assert_eq!(api.cache().immortal_count(), 1);
    let cached = api
        .cache()
        .immortal("data_android_crew")
        .await
        .unwrap()
        .expect("cached record");
    assert_eq!(cached.skills["science_skill"].core, 1100.0);

    api.refresh_roster().await.expect("rebuild from cache");
    assert_eq!(api.roster().len(), 4);
    assert_eq!(api.roster()[3].skill(Skill::ScienceSkill).core, 1100.0);
}

#[tokio::test]
async fn cached_frozen_record_skips_the_server() {
    let transport = MemoryTransport::new()
        .with_response(
            "character/get_avatar_crew_archetypes",
            json!({ "crew_avatars": [{ "id": 4, "symbol": "data_android_crew", "name": "Data" }] }),
        )
        .with_response(
            "player",
            json!({ "player": { "character": {
                "stored_immortals": [{ "id": 4, "quantity": 1 }],
                "crew_collection_buffs": [
                    { "stat": "science_skill_core", "operator": "multiplier", "value": 2.0 }
                ]
            } } }),
        );
    let cache = MemoryCache::new();
    let record: CrewDto = serde_json::from_value(json!({
        "archetype_id": 4, "symbol": "data_android_crew", "max_rarity": 5,
        "base_skills": { "science_skill": { "core": 500, "range_min": 0, "range_max": 0 } }
    }))
    .unwrap();
    cache.put_immortal("data_android_crew", &record).await.unwrap();

    let mut api = SttApi::new(transport, cache, ApiSettings::default());
    api.login_with_access_token("token", false).await.unwrap();
    api.load_crew_archetypes().await.unwrap();
    api.load_player_data().await.unwrap();
    let roster = api.refresh_roster().await.unwrap();

    assert_eq!(roster[0].skill(Skill::ScienceSkill).core, 1000.0);
    assert_eq!(
        api.transport()
            .request_count("stasis_vault/immortal_restore_info/data_android_crew"),
        0
    );
}

#[tokio::test]
async fn corrupt_frozen_cache_entry_is_refetched_and_repaired() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let immortals = dir.path().join("immortals");
    std::fs::create_dir_all(&immortals).expect("cache dir should be created");
    std::fs::write(immortals.join("data_android_crew.json"), "{ truncated")
        .expect("corrupt entry should be written");

    let mut api = SttApi::new(
        FixtureTransport::new(fixture_dir()),
        JsonFileCache::new(dir.path()),
        ApiSettings::default(),
    );
    api.login("picard", "engage", false).await.expect("login");
    api.load_crew_archetypes().await.expect("avatars");
    api.load_platform_config().await.expect("platform config");
    api.load_player_data().await.expect("player");

    let roster = api.refresh_roster().await.expect("roster should still build");
    assert_eq!(roster.len(), 4);
    assert_eq!(roster[3].skill(Skill::ScienceSkill).core, 1100.0);

    let repaired = api
        .cache()
        .immortal("data_android_crew")
        .await
        .expect("entry should be readable again")
        .expect("entry should be present");
    assert_eq!(repaired.skills["science_skill"].core, 1100.0);
}

#[tokio::test]
async fn sell_crew_applies_returned_messages() {
    let transport = MemoryTransport::new()
        .with_response(
            "player",
            json!({ "player": { "money": 10, "character": { "crew": [
                { "id": 1, "archetype_id": 1, "symbol": "kirk_captain_crew" },
                { "id": 2, "archetype_id": 3, "symbol": "worf_klingon_crew" }
            ] } } }),
        )
        .with_response(
            "crew/sell",
            json!([
                { "action": "delete", "character": { "crew": [{ "id": 2 }] } },
                { "action": "update", "player": { "money": 60 } },
                { "action": "ephemeral", "sold": 1 }
            ]),
        );
    let mut api = SttApi::new(transport, MemoryCache::new(), ApiSettings::default());
    api.login_with_access_token("token", false).await.unwrap();
    api.load_player_data().await.unwrap();

    let ephemerals = api.sell_crew(2).await.unwrap();
    assert_eq!(ephemerals, vec![json!({ "action": "ephemeral", "sold": 1 })]);
    let tree = api.player().unwrap().tree();
    assert_eq!(tree["money"], 60);
    assert_eq!(
        tree["character"]["crew"],
        json!([{ "id": 1, "archetype_id": 1, "symbol": "kirk_captain_crew" }])
    );

    let request = api
        .transport()
        .requests()
        .into_iter()
        .find(|request| request.resource == "crew/sell")
        .unwrap();
    assert_eq!(request.params["id"], 2);
}

#[tokio::test]
async fn resync_merges_currency_into_player() {
    let transport = MemoryTransport::new()
        .with_response("player", json!({ "player": { "money": 10, "premium_purchasable": 3 } }))
        .with_response("player/resync_currency", json!({ "player": { "money": 99 } }));
    let mut api = SttApi::new(transport, MemoryCache::new(), ApiSettings::default());
    api.login_with_access_token("token", false).await.unwrap();
    assert!(matches!(
        api.resync_player_currency().await,
        Err(ApiError::NotLoaded("player"))
    ));

    api.load_player_data().await.unwrap();
    api.resync_player_currency().await.unwrap();
    let tree = api.player().unwrap().tree();
    assert_eq!(tree["money"], 99);
    assert_eq!(tree["premium_purchasable"], 3);
}

#[tokio::test]
async fn fleet_and_inspect_validate_their_keys() {
    let transport = MemoryTransport::new()
        .with_response("fleet/77", json!({ "fleet": { "id": 77, "name": "Armada" } }))
        .with_response("player/inspect/5", json!({ "player": { "display_name": "Riker" } }));
    let mut api = SttApi::new(transport, MemoryCache::new(), ApiSettings::default());
    api.login_with_access_token("token", false).await.unwrap();

    api.load_fleet_data("77").await.unwrap();
    assert_eq!(api.fleet().unwrap()["name"], "Armada");
    let other = api.inspect_player("5").await.unwrap();
    assert_eq!(other["display_name"], "Riker");
}

#[tokio::test]
async fn import_uses_local_buffs_and_avatar_catalog() {
    let api_records: Vec<CrewDto> = vec![
        serde_json::from_value(json!({
            "archetype_id": 1, "symbol": "kirk_captain_crew", "name": "Kirk", "level": 100, "rarity": 4,
            "base_skills": { "command_skill": { "core": 1000, "range_min": 100, "range_max": 200 } }
        }))
        .unwrap(),
        serde_json::from_value(json!({
            "archetype_id": 1, "symbol": "kirk_captain_crew", "name": "Kirk copy", "level": 100, "rarity": 4
        }))
        .unwrap(),
    ];
    let mut api = loaded_session().await;
    let imported = api.import_all_crew(&api_records);
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].skill(Skill::CommandSkill).core, 1100.0);
    assert!(imported[0].is_external);
    assert_eq!(api.all_crew().len(), 1);
}
