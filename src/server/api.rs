use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::api::{ApiError, CrewCache, GameTransport, SttApi};
use crate::crew::export_csv::{roster_csv_string, CsvExportError};
use crate::crew::{filter_crew, format_crew_stats};
use crate::data::crew::{CrewData, CrewDto};
use crate::galaxy::{
    event_crew_bonuses, event_progress, farming_list, plan_galaxy_event, GalaxyContext,
};

/// Error body shared by every endpoint: `{"status":"error","message":...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerError {
    pub status: StatusCode,
    pub message: String,
}

impl ServerError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ApiError> for ServerError {
    fn from(err: ApiError) -> Self {
        let status = match &err {
            ApiError::NotLoggedIn | ApiError::NotLoaded(_) => StatusCode::CONFLICT,
            ApiError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Login(_)
            | ApiError::InvalidPayload { .. }
            | ApiError::Transport(_)
            | ApiError::Decode(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<CsvExportError> for ServerError {
    fn from(err: CsvExportError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, message = %self.message, "request failed");
        }
        let body = Json(json!({ "status": "error", "message": self.message }));
        (self.status, body).into_response()
    }
}

pub fn health_payload() -> Value {
    json!({
        "status": "ok",
        "service": "ready-room-api",
        "version": env!("CARGO_PKG_VERSION")
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CrewLabel {
    pub id: i64,
    pub crew_id: i64,
    pub symbol: String,
    pub name: String,
    pub label: String,
}

pub fn crew_labels(roster: &[CrewData]) -> Vec<CrewLabel> {
    roster
        .iter()
        .map(|crew| CrewLabel {
            id: crew.id,
            crew_id: crew.crew_id,
            symbol: crew.symbol.clone(),
            name: crew.name.clone(),
            label: format_crew_stats(crew),
        })
        .collect()
}

pub fn search_payload(roster: &[CrewData], query: &str) -> Value {
    let matches = filter_crew(roster, query);
    json!({
        "query": query,
        "count": matches.len(),
        "crew": matches
    })
}

pub fn roster_csv_payload(roster: &[CrewData]) -> Result<String, ServerError> {
    Ok(roster_csv_string(roster)?)
}

pub fn parse_crew_records(body: &str) -> Result<Vec<CrewDto>, ServerError> {
    serde_json::from_str(body)
        .map_err(|err| ServerError::bad_request(format!("Invalid crew records: {err}")))
}

pub fn parse_messages_body(body: &str) -> Result<Value, ServerError> {
    serde_json::from_str(body)
        .map_err(|err| ServerError::bad_request(format!("Invalid update messages: {err}")))
}

/// Applies posted push messages, rebuilds the roster and returns the ephemerals.
///
/// Once the messages are applied the ephemerals are always returned; a failed
/// rebuild keeps the previous roster and is reported in `roster_error`.
pub async fn updates_payload<T, C>(api: &mut SttApi<T, C>, body: &str) -> Result<Value, ServerError>
where
    T: GameTransport + Sync,
    C: CrewCache + Sync,
{
    let messages = parse_messages_body(body)?;
    let ephemerals = api.apply_updates(messages)?;
    match api.refresh_roster().await.map(<[CrewData]>::len) {
        Ok(roster_size) => Ok(json!({
            "status": "ok",
            "ephemerals": ephemerals,
            "roster_size": roster_size
        })),
        Err(err) => {
            warn!(error = %err, "roster rebuild failed after applying updates");
            Ok(json!({
                "status": "ok",
                "ephemerals": ephemerals,
                "roster_size": api.roster().len(),
                "roster_error": err.to_string()
            }))
        }
    }
}

/// Reloads the player and rebuilds the roster.
pub async fn refresh_payload<T, C>(api: &mut SttApi<T, C>) -> Result<Value, ServerError>
where
    T: GameTransport + Sync,
    C: CrewCache + Sync,
{
    api.load_player_data().await?;
    let roster_size = api.refresh_roster().await?.len();
    Ok(json!({
        "status": "ok",
        "roster_size": roster_size,
        "last_sync": api.last_sync().map(|at| at.to_rfc3339())
    }))
}

/// Crafting plan for the loaded galaxy event, if the player is in exactly one.
pub fn galaxy_payload<T, C>(api: &SttApi<T, C>) -> Result<Value, ServerError>
where
    T: GameTransport + Sync,
    C: CrewCache + Sync,
{
    let craft = api
        .server_config()
        .and_then(|config| config.craft_config.as_ref())
        .ok_or(ApiError::NotLoaded("server craft config"))?;
    let player = api.player().ok_or(ApiError::NotLoaded("player"))?;
    let character = player.character().map_err(ApiError::from)?;

    let Some(event) = character
        .events
        .iter()
        .find(|event| event.pointer("/content/gather_pools").is_some())
    else {
        return Ok(json!({
            "status": "ok",
            "event": null,
            "progress": null,
            "plan": [],
            "farming": []
        }));
    };

    let ctx = GalaxyContext {
        craft,
        archetypes: api.item_archetypes(),
        items: &character.items,
    };
    let plan = plan_galaxy_event(api.roster(), &event_crew_bonuses(event), ctx);
    let farming = farming_list(&plan, ctx);
    Ok(json!({
        "status": "ok",
        "event": event.get("name"),
        "progress": event_progress(event, &character.items),
        "plan": plan,
        "farming": farming
    }))
}
