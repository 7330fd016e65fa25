//! The API context: login state, everything loaded from the game servers, and
//! the rosters built from it. One value per signed-in player.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::cache::{CacheError, CrewCache, CONFIG_ACCESS_TOKEN, CONFIG_AUTO_LOGIN};
use crate::api::merge::merge_deep;
use crate::api::transport::{GameRequest, GameTransport, Method, TransportError};
use crate::api::updates::{apply_messages, parse_messages};
use crate::crew::buffs::BuffConfig;
use crate::crew::builder::{build_crew_data, build_crew_data_all, FrozenCrewSource, RosterContext};
use crate::data::catalog::{AvatarCatalog, CrewAvatar, ItemArchetype, PlatformConfig, ServerConfig};
use crate::data::crew::{CrewData, CrewDto};
use crate::data::player::PlayerData;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("login failed: {0}")]
    Login(String),
    #[error("invalid data for {what}; refresh and retry")]
    InvalidPayload { what: &'static str },
    #[error("{0} has not been loaded")]
    NotLoaded(&'static str),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("could not decode server data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Server endpoints and client identity sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub server_url: String,
    pub platform_url: String,
    pub client_id: String,
    pub client_api_version: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            server_url: "https://stt.disruptorbeam.com/".to_string(),
            platform_url: "https://thorium.disruptorbeam.com/".to_string(),
            client_id: String::new(),
            client_api_version: 15,
        }
    }
}

pub struct SttApi<T, C> {
    transport: T,
    cache: C,
    settings: ApiSettings,
    access_token: Option<String>,

    player: Option<PlayerData>,
    item_archetypes: Vec<ItemArchetype>,
    buff_config: BuffConfig,
    avatars: AvatarCatalog,
    platform: PlatformConfig,
    server_config: Option<ServerConfig>,
    ship_schematics: Vec<Value>,
    fleet: Option<Value>,

    roster: Vec<CrewData>,
    all_crew: Vec<CrewData>,
    last_sync: Option<DateTime<Utc>>,
}

/// Pulls a required top-level key out of a response body.
fn take_key(body: Value, key: &str, what: &'static str) -> Result<Value, ApiError> {
    match body {
        Value::Object(mut map) => match map.remove(key) {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(ApiError::InvalidPayload { what }),
        },
        _ => Err(ApiError::InvalidPayload { what }),
    }
}

/// The `config` object of an unvalidated config response, or its default.
fn config_section<D: serde::de::DeserializeOwned + Default>(body: &Value) -> Result<D, ApiError> {
    match body.get("config") {
        Some(config) if !config.is_null() => Ok(serde_json::from_value(config.clone())?),
        _ => Ok(D::default()),
    }
}

impl<T, C> SttApi<T, C>
where
    T: GameTransport + Sync,
    C: CrewCache + Sync,
{
    pub fn new(transport: T, cache: C, settings: ApiSettings) -> Self {
        Self {
            transport,
            cache,
            settings,
            access_token: None,
            player: None,
            item_archetypes: Vec::new(),
            buff_config: BuffConfig::default(),
            avatars: AvatarCatalog::default(),
            platform: PlatformConfig::default(),
            server_config: None,
            ship_schematics: Vec::new(),
            fleet: None,
            roster: Vec::new(),
            all_crew: Vec::new(),
            last_sync: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn logged_in(&self) -> bool {
        self.access_token.is_some()
    }

    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        auto_login: bool,
    ) -> Result<(), ApiError> {
        let mut params = Map::new();
        params.insert("username".to_string(), Value::from(username));
        params.insert("password".to_string(), Value::from(password));
        params.insert("client_id".to_string(), Value::from(self.settings.client_id.as_str()));
        params.insert("grant_type".to_string(), Value::from("password"));
        let request = GameRequest {
            method: Method::Post,
            base: self.settings.platform_url.clone(),
            resource: "oauth2/token".to_string(),
            params,
            access_token: None,
        };
        let body = self.transport.send(request).await?;

        if let Some(description) = body.get("error_description").and_then(Value::as_str) {
            return Err(ApiError::Login(description.to_string()));
        }
        match body.get("access_token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => {
                self.login_with_access_token(token, auto_login).await
            }
            _ => Err(ApiError::InvalidPayload { what: "login" }),
        }
    }

    pub async fn login_with_access_token(
        &mut self,
        access_token: &str,
        auto_login: bool,
    ) -> Result<(), ApiError> {
        self.access_token = Some(access_token.to_string());
        self.cache
            .put_config(CONFIG_AUTO_LOGIN, Value::Bool(auto_login))
            .await?;
        if auto_login {
            self.cache
                .put_config(CONFIG_ACCESS_TOKEN, Value::from(access_token))
                .await?;
        }
        info!(auto_login, "logged in");
        Ok(())
    }

    /// Restores a session saved with auto-login. Returns whether a token was found.
    pub async fn login_with_cached_access_token(&mut self) -> Result<bool, ApiError> {
        if self.cache.config(CONFIG_AUTO_LOGIN).await? != Some(Value::Bool(true)) {
            return Ok(false);
        }
        let token = self.cache.config(CONFIG_ACCESS_TOKEN).await?;
        match token.as_ref().and_then(Value::as_str) {
            Some(token) if !token.is_empty() => {
                self.access_token = Some(token.to_string());
                info!("logged in with cached access token");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Drops every loaded collection. On logout the token and both saved login
    /// rows go too.
    pub async fn refresh_everything(&mut self, logout: bool) -> Result<(), ApiError> {
        self.player = None;
        self.item_archetypes.clear();
        self.buff_config = BuffConfig::default();
        self.avatars = AvatarCatalog::default();
        self.platform = PlatformConfig::default();
        self.server_config = None;
        self.ship_schematics.clear();
        self.fleet = None;
        self.roster.clear();
        self.last_sync = None;

        if logout {
            self.access_token = None;
            self.cache.delete_config(CONFIG_AUTO_LOGIN).await?;
            self.cache.delete_config(CONFIG_ACCESS_TOKEN).await?;
            info!("logged out");
        }
        Ok(())
    }

    fn server_request(
        &self,
        method: Method,
        resource: &str,
        params: Map<String, Value>,
    ) -> Result<GameRequest, ApiError> {
        let token = self.access_token.clone().ok_or(ApiError::NotLoggedIn)?;
        let mut all = Map::new();
        all.insert(
            "client_api".to_string(),
            Value::from(self.settings.client_api_version),
        );
        if method == Method::Get {
            all.insert("access_token".to_string(), Value::from(token.as_str()));
        }
        all.extend(params);
        Ok(GameRequest {
            method,
            base: self.settings.server_url.clone(),
            resource: resource.to_string(),
            params: all,
            access_token: (method == Method::Post).then_some(token),
        })
    }

    async fn execute(
        &self,
        method: Method,
        resource: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ApiError> {
        let request = self.server_request(method, resource, params)?;
        debug!(resource, "server request");
        Ok(self.transport.send(request).await?)
    }

    pub async fn load_server_config(&mut self) -> Result<(), ApiError> {
        let mut params = Map::new();
        params.insert("platform".to_string(), Value::from("WebGLPlayer"));
        params.insert("device_type".to_string(), Value::from("Desktop"));
        let body = self.execute(Method::Get, "config", params).await?;
        self.server_config = Some(config_section(&body)?);
        Ok(())
    }

    pub async fn load_crew_archetypes(&mut self) -> Result<(), ApiError> {
        let body = self
            .execute(Method::Get, "character/get_avatar_crew_archetypes", Map::new())
            .await?;
        let avatars: Vec<CrewAvatar> =
            serde_json::from_value(take_key(body, "crew_avatars", "crew avatars")?)?;
        info!(avatars = avatars.len(), "crew avatars loaded");
        self.avatars = AvatarCatalog::from_avatars(avatars);
        Ok(())
    }

    pub async fn load_platform_config(&mut self) -> Result<(), ApiError> {
        let body = self.execute(Method::Get, "config/platform", Map::new()).await?;
        self.platform = config_section(&body)?;
        Ok(())
    }

    /// Loads the player tree and recomputes the buff table from its
    /// collection and starbase buffs.
    pub async fn load_player_data(&mut self) -> Result<(), ApiError> {
        let mut body = self.execute(Method::Get, "player", Map::new()).await?;
        let archetypes = body
            .pointer_mut("/item_archetype_cache/archetypes")
            .map(Value::take);
        let player = PlayerData::new(take_key(body, "player", "player")?);
        let character = player.character()?;

        self.buff_config =
            BuffConfig::calculate(&character.crew_collection_buffs, &character.starbase_buffs);
        self.item_archetypes = match archetypes {
            Some(archetypes) => serde_json::from_value(archetypes)?,
            None => Vec::new(),
        };
        self.player = Some(player);
        self.last_sync = Some(Utc::now());
        info!(
            player = %character.display_name,
            crew = character.crew.len(),
            frozen = character.stored_immortals.len(),
            "player data loaded"
        );
        Ok(())
    }

    /// Merges a currency resync into the loaded player tree.
    pub async fn resync_player_currency(&mut self) -> Result<(), ApiError> {
        if self.player.is_none() {
            return Err(ApiError::NotLoaded("player"));
        }
        let body = self
            .execute(Method::Get, "player/resync_currency", Map::new())
            .await?;
        let update = take_key(body, "player", "player")?;
        let player = self.player.as_mut().ok_or(ApiError::NotLoaded("player"))?;
        merge_deep(player.tree_mut(), update);
        Ok(())
    }

    pub async fn load_ship_schematics(&mut self) -> Result<(), ApiError> {
        let body = self.execute(Method::Get, "ship_schematic", Map::new()).await?;
        self.ship_schematics =
            serde_json::from_value(take_key(body, "schematics", "ship schematics")?)?;
        Ok(())
    }

    /// Raw frozen-crew record, exactly as the stasis vault returns it.
    pub async fn load_frozen_crew(&self, symbol: &str) -> Result<CrewDto, ApiError> {
        let mut params = Map::new();
        params.insert("symbol".to_string(), Value::from(symbol));
        let body = self
            .execute(Method::Post, "stasis_vault/immortal_restore_info", params)
            .await?;
        Ok(serde_json::from_value(take_key(body, "crew", "frozen crew")?)?)
    }

    pub async fn load_fleet_data(&mut self, guild_id: &str) -> Result<(), ApiError> {
        let body = self
            .execute(Method::Get, &format!("fleet/{guild_id}"), Map::new())
            .await?;
        self.fleet = Some(take_key(body, "fleet", "fleet")?);
        Ok(())
    }

    pub async fn inspect_player(&self, player_id: &str) -> Result<Value, ApiError> {
        let body = self
            .execute(Method::Get, &format!("player/inspect/{player_id}"), Map::new())
            .await?;
        take_key(body, "player", "player")
    }

    /// Folds push messages into the player tree and returns the ephemerals.
    pub fn apply_updates(&mut self, body: Value) -> Result<Vec<Value>, ApiError> {
        let player = self.player.as_mut().ok_or(ApiError::NotLoaded("player"))?;
        Ok(apply_messages(player, parse_messages(body)))
    }

    async fn post_with_updates(
        &mut self,
        resource: &str,
        params: Map<String, Value>,
    ) -> Result<Vec<Value>, ApiError> {
        let body = self.execute(Method::Post, resource, params).await?;
        self.apply_updates(body)
    }

    pub async fn sell_crew(&mut self, id: i64) -> Result<Vec<Value>, ApiError> {
        let mut params = Map::new();
        params.insert("id".to_string(), Value::from(id));
        self.post_with_updates("crew/sell", params).await
    }

    pub async fn sell_many_crew(&mut self, ids: &[i64]) -> Result<Vec<Value>, ApiError> {
        let mut params = Map::new();
        params.insert("ids".to_string(), Value::from(ids.to_vec()));
        self.post_with_updates("crew/sell_many", params).await
    }

    fn roster_context(&self) -> RosterContext<'_> {
        RosterContext {
            buffs: &self.buff_config,
            avatars: &self.avatars,
            platform: &self.platform,
        }
    }

    /// Rebuilds the roster (active and frozen) from the loaded character.
    pub async fn refresh_roster(&mut self) -> Result<&[CrewData], ApiError> {
        let character = self
            .player
            .as_ref()
            .ok_or(ApiError::NotLoaded("player"))?
            .character()?;
        let roster = build_crew_data(&character, self.roster_context(), &*self).await?;
        self.roster = roster;
        Ok(&self.roster)
    }

    /// Normalizes an imported catalog with the local buff table.
    pub fn import_all_crew(&mut self, records: &[CrewDto]) -> &[CrewData] {
        self.all_crew = build_crew_data_all(records, self.roster_context());
        info!(
            records = records.len(),
            imported = self.all_crew.len(),
            "crew catalog imported"
        );
        &self.all_crew
    }

    pub fn buff_config(&self) -> &BuffConfig {
        &self.buff_config
    }

    pub fn roster(&self) -> &[CrewData] {
        &self.roster
    }

    pub fn all_crew(&self) -> &[CrewData] {
        &self.all_crew
    }

    pub fn player(&self) -> Option<&PlayerData> {
        self.player.as_ref()
    }

    pub fn item_archetypes(&self) -> &[ItemArchetype] {
        &self.item_archetypes
    }

    pub fn server_config(&self) -> Option<&ServerConfig> {
        self.server_config.as_ref()
    }

    pub fn platform_config(&self) -> &PlatformConfig {
        &self.platform
    }

    pub fn ship_schematics(&self) -> &[Value] {
        &self.ship_schematics
    }

    pub fn fleet(&self) -> Option<&Value> {
        self.fleet.as_ref()
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    pub fn trait_name<'a>(&'a self, raw: &'a str) -> &'a str {
        self.platform.trait_name(raw)
    }

    pub fn crew_avatars(&self) -> &AvatarCatalog {
        &self.avatars
    }

    pub fn crew_avatar_by_id(&self, id: i64) -> Option<&CrewAvatar> {
        self.avatars.by_id(id)
    }

    pub fn crew_avatar_by_symbol(&self, symbol: &str) -> Option<&CrewAvatar> {
        self.avatars.by_symbol(symbol)
    }
}

impl<T, C> FrozenCrewSource for SttApi<T, C>
where
    T: GameTransport + Sync,
    C: CrewCache + Sync,
{
    type Error = ApiError;

    /// Cached record if there is one, otherwise the stasis vault's. Either way
    /// the result carries the current buffs; fresh fetches are cached.
    async fn frozen_crew(&self, symbol: &str) -> Result<CrewDto, ApiError> {
        match self.cache.immortal(symbol).await {
            Ok(Some(mut crew)) => {
                debug!(symbol, "frozen crew cache hit");
                self.buff_config.apply_to(&mut crew);
                return Ok(crew);
            }
            Ok(None) => {}
            // a bad entry is refetched and overwritten below
            Err(err) => warn!(symbol, error = %err, "unreadable frozen crew cache entry"),
        }

        let mut crew = self.load_frozen_crew(symbol).await?;
        self.buff_config.apply_to(&mut crew);
        if let Err(err) = self.cache.put_immortal(symbol, &crew).await {
            warn!(symbol, error = %err, "could not cache frozen crew");
        }
        Ok(crew)
    }
}
