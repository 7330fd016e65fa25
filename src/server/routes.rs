use std::path::Path;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower_http::services::ServeDir;

use crate::api::{CrewCache, GameTransport, SttApi};
use crate::server::api::{self, ServerError};

/// Router state: the one session every request reads or updates.
pub struct AppState<T, C> {
    pub api: Arc<RwLock<SttApi<T, C>>>,
}

impl<T, C> AppState<T, C> {
    pub fn new(api: SttApi<T, C>) -> Self {
        Self {
            api: Arc::new(RwLock::new(api)),
        }
    }
}

impl<T, C> Clone for AppState<T, C> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub fn build_router<T, C>(state: AppState<T, C>, static_dir: &Path) -> Router
where
    T: GameTransport + Send + Sync + 'static,
    C: CrewCache + Send + Sync + 'static,
{
    Router::new()
        .route("/api/health", get(health))
        .route("/api/roster", get(roster::<T, C>))
        .route("/api/roster/labels", get(roster_labels::<T, C>))
        .route("/api/roster/search", get(roster_search::<T, C>))
        .route("/api/roster.csv", get(roster_csv::<T, C>))
        .route("/api/buffs", get(buffs::<T, C>))
        .route("/api/allcrew", get(all_crew::<T, C>))
        .route("/api/allcrew/import", post(import_all_crew::<T, C>))
        .route("/api/updates", post(updates::<T, C>))
        .route("/api/refresh", post(refresh::<T, C>))
        .route("/api/galaxy", get(galaxy::<T, C>))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(api::health_payload())
}

async fn roster<T, C>(State(state): State<AppState<T, C>>) -> Json<Value>
where
    T: GameTransport + Send + Sync + 'static,
    C: CrewCache + Send + Sync + 'static,
{
    let session = state.api.read().await;
    Json(json!(session.roster()))
}

async fn roster_labels<T, C>(State(state): State<AppState<T, C>>) -> Json<Vec<api::CrewLabel>>
where
    T: GameTransport + Send + Sync + 'static,
    C: CrewCache + Send + Sync + 'static,
{
    let session = state.api.read().await;
    Json(api::crew_labels(session.roster()))
}

async fn roster_search<T, C>(
    State(state): State<AppState<T, C>>,
    Query(query): Query<SearchQuery>,
) -> Json<Value>
where
    T: GameTransport + Send + Sync + 'static,
    C: CrewCache + Send + Sync + 'static,
{
    let session = state.api.read().await;
    Json(api::search_payload(session.roster(), &query.q))
}

async fn roster_csv<T, C>(State(state): State<AppState<T, C>>) -> Result<Response, ServerError>
where
    T: GameTransport + Send + Sync + 'static,
    C: CrewCache + Send + Sync + 'static,
{
    let session = state.api.read().await;
    let csv = api::roster_csv_payload(session.roster())?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv).into_response())
}

async fn buffs<T, C>(State(state): State<AppState<T, C>>) -> Json<Value>
where
    T: GameTransport + Send + Sync + 'static,
    C: CrewCache + Send + Sync + 'static,
{
    let session = state.api.read().await;
    Json(json!(session.buff_config()))
}

async fn all_crew<T, C>(State(state): State<AppState<T, C>>) -> Json<Value>
where
    T: GameTransport + Send + Sync + 'static,
    C: CrewCache + Send + Sync + 'static,
{
    let session = state.api.read().await;
    Json(json!(session.all_crew()))
}

async fn import_all_crew<T, C>(
    State(state): State<AppState<T, C>>,
    body: String,
) -> Result<Json<Value>, ServerError>
where
    T: GameTransport + Send + Sync + 'static,
    C: CrewCache + Send + Sync + 'static,
{
    let records = api::parse_crew_records(&body)?;
    let mut session = state.api.write().await;
    Ok(Json(json!(session.import_all_crew(&records))))
}

async fn updates<T, C>(
    State(state): State<AppState<T, C>>,
    body: String,
) -> Result<Json<Value>, ServerError>
where
    T: GameTransport + Send + Sync + 'static,
    C: CrewCache + Send + Sync + 'static,
{
    let mut session = state.api.write().await;
    Ok(Json(api::updates_payload(&mut *session, &body).await?))
}

async fn refresh<T, C>(State(state): State<AppState<T, C>>) -> Result<Json<Value>, ServerError>
where
    T: GameTransport + Send + Sync + 'static,
    C: CrewCache + Send + Sync + 'static,
{
    let mut session = state.api.write().await;
    Ok(Json(api::refresh_payload(&mut *session).await?))
}

async fn galaxy<T, C>(State(state): State<AppState<T, C>>) -> Result<Json<Value>, ServerError>
where
    T: GameTransport + Send + Sync + 'static,
    C: CrewCache + Send + Sync + 'static,
{
    let session = state.api.read().await;
    Ok(Json(api::galaxy_payload(&*session)?))
}
