use tracing::{info, warn};

use crate::api::{ApiError, CrewCache, FixtureTransport, GameTransport, JsonFileCache, SttApi};
use crate::config::AppConfig;

pub mod api;
pub mod routes;

pub type LocalSession = SttApi<FixtureTransport, JsonFileCache>;

pub const PASSWORD_ENV: &str = "READY_ROOM_PASSWORD";

/// Session replaying captured responses from `fixture_dir` and caching under `cache_dir`.
pub fn local_session(config: &AppConfig) -> LocalSession {
    SttApi::new(
        FixtureTransport::new(&config.fixture_dir),
        JsonFileCache::new(&config.cache_dir),
        config.api_settings(),
    )
}

/// Signs in (saved token first, then the configured credentials) and loads
/// everything the roster needs.
pub async fn connect<T, C>(api: &mut SttApi<T, C>, config: &AppConfig) -> Result<(), ApiError>
where
    T: GameTransport + Sync,
    C: CrewCache + Sync,
{
    if !api.login_with_cached_access_token().await? {
        let password = std::env::var(PASSWORD_ENV).unwrap_or_default();
        api.login(&config.username, &password, config.auto_login).await?;
    }
    api.load_server_config().await?;
    api.load_crew_archetypes().await?;
    api.load_platform_config().await?;
    api.load_player_data().await?;
    let roster = api.refresh_roster().await?;
    info!(crew = roster.len(), "session ready");
    Ok(())
}

pub async fn run_server(config: &AppConfig) -> std::io::Result<()> {
    let mut session = local_session(config);
    if let Err(err) = connect(&mut session, config).await {
        warn!(error = %err, "starting without player data");
    }

    let router = routes::build_router(routes::AppState::new(session), &config.static_dir);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("ready room server listening on http://{}", config.bind_addr);
    axum::serve(listener, router).await
}
