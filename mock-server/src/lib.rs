use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub name: String,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loadout: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    pub code: String,
    pub name: String,
    pub host: String,
    pub players: Vec<Player>,
    pub started: bool,
    #[serde(skip)]
    pub events: u64,
}

#[derive(Deserialize)]
pub struct CreateRoom {
    pub name: String,
    pub player: String,
}

#[derive(Deserialize)]
pub struct PlayerAction {
    pub player: String,
}

#[derive(Deserialize)]
pub struct SetLoadout {
    pub player: String,
    pub loadout: Value,
}

#[derive(Deserialize)]
pub struct SetReady {
    pub player: String,
    pub ready: bool,
}

#[derive(Deserialize)]
pub struct GameEvent {
    pub player: String,
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub body: String,
}

pub type Db = Arc<RwLock<HashMap<String, Room>>>;

/// Error response: status plus a plain-text reason.
type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/api/rooms", get(list_rooms).post(create_room))
        .route("/api/rooms/{code}", axum::routing::delete(disband_room))
        .route("/api/rooms/{code}/join", post(join_room))
        .route("/api/rooms/{code}/leave", post(leave_room))
        .route("/api/rooms/{code}/loadout", put(set_loadout))
        .route("/api/rooms/{code}/ready", post(set_ready))
        .route("/api/rooms/{code}/start", post(start_game))
        .route("/api/rooms/{code}/events", post(post_event))
        .route("/debug/status/{status}", get(debug_status))
        .route("/debug/delay/{ms}", get(debug_delay))
        .route("/debug/malformed", get(debug_malformed))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn not_found(code: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("no room {code}"))
}

fn new_code() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_ascii_uppercase()
}

async fn list_rooms(State(db): State<Db>) -> Json<Vec<Room>> {
    let rooms = db.read().await;
    let mut list: Vec<Room> = rooms.values().cloned().collect();
    list.sort_by(|a, b| a.code.cmp(&b.code));
    Json(list)
}

async fn create_room(
    State(db): State<Db>,
    Json(input): Json<CreateRoom>,
) -> ApiResult<(StatusCode, Json<Room>)> {
    if input.name.trim().is_empty() || input.player.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name and player are required".to_string()));
    }
    let mut rooms = db.write().await;
    let mut code = new_code();
    while rooms.contains_key(&code) {
        code = new_code();
    }
    let room = Room {
        code: code.clone(),
        name: input.name,
        host: input.player.clone(),
        players: vec![Player {
            name: input.player,
            ready: false,
            loadout: None,
        }],
        started: false,
        events: 0,
    };
    rooms.insert(code, room.clone());
    tracing::info!(code = %room.code, host = %room.host, "room created");
    Ok((StatusCode::CREATED, Json(room)))
}

async fn join_room(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<PlayerAction>,
) -> ApiResult<Json<Room>> {
    let mut rooms = db.write().await;
    let room = rooms.get_mut(&code).ok_or_else(|| not_found(&code))?;
    if room.started {
        return Err((StatusCode::CONFLICT, "game already started".to_string()));
    }
    if room.players.iter().any(|p| p.name == input.player) {
        return Err((StatusCode::CONFLICT, format!("{} already joined", input.player)));
    }
    room.players.push(Player {
        name: input.player,
        ready: false,
        loadout: None,
    });
    Ok(Json(room.clone()))
}

async fn leave_room(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<PlayerAction>,
) -> ApiResult<Json<Room>> {
    let mut rooms = db.write().await;
    let room = rooms.get_mut(&code).ok_or_else(|| not_found(&code))?;
    let before = room.players.len();
    room.players.retain(|p| p.name != input.player);
    if room.players.len() == before {
        return Err((StatusCode::NOT_FOUND, format!("{} is not in the room", input.player)));
    }
    if room.host == input.player {
        if let Some(next) = room.players.first() {
            room.host = next.name.clone();
        }
    }
    Ok(Json(room.clone()))
}

async fn set_loadout(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<SetLoadout>,
) -> ApiResult<Json<Room>> {
    let mut rooms = db.write().await;
    let room = rooms.get_mut(&code).ok_or_else(|| not_found(&code))?;
    let player = room
        .players
        .iter_mut()
        .find(|p| p.name == input.player)
        .ok_or((StatusCode::FORBIDDEN, "not a member".to_string()))?;
    player.loadout = Some(input.loadout);
    Ok(Json(room.clone()))
}

async fn set_ready(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<SetReady>,
) -> ApiResult<Json<Room>> {
    let mut rooms = db.write().await;
    let room = rooms.get_mut(&code).ok_or_else(|| not_found(&code))?;
    let player = room
        .players
        .iter_mut()
        .find(|p| p.name == input.player)
        .ok_or((StatusCode::FORBIDDEN, "not a member".to_string()))?;
    player.ready = input.ready;
    Ok(Json(room.clone()))
}

async fn start_game(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<PlayerAction>,
) -> ApiResult<Json<Room>> {
    let mut rooms = db.write().await;
    let room = rooms.get_mut(&code).ok_or_else(|| not_found(&code))?;
    if room.host != input.player {
        return Err((StatusCode::FORBIDDEN, "only the host can start".to_string()));
    }
    if room.started {
        return Err((StatusCode::CONFLICT, "game already started".to_string()));
    }
    if !room.players.iter().all(|p| p.ready) {
        return Err((StatusCode::CONFLICT, "not everyone is ready".to_string()));
    }
    room.started = true;
    tracing::info!(%code, players = room.players.len(), "game started");
    Ok(Json(room.clone()))
}

async fn post_event(
    State(db): State<Db>,
    Path(code): Path<String>,
    Json(input): Json<GameEvent>,
) -> ApiResult<Json<Value>> {
    let mut rooms = db.write().await;
    let room = rooms.get_mut(&code).ok_or_else(|| not_found(&code))?;
    if !room.started {
        return Err((StatusCode::CONFLICT, "game not started".to_string()));
    }
    if !room.players.iter().any(|p| p.name == input.player) {
        return Err((StatusCode::FORBIDDEN, "not a member".to_string()));
    }
    room.events += 1;
    tracing::debug!(%code, kind = %input.kind, data = %input.data, seq = room.events, "event");
    Ok(Json(json!({ "ok": true, "seq": room.events })))
}

async fn disband_room(
    State(db): State<Db>,
    Path(code): Path<String>,
    Query(input): Query<PlayerAction>,
) -> ApiResult<Json<Value>> {
    let mut rooms = db.write().await;
    let room = rooms.get(&code).ok_or_else(|| not_found(&code))?;
    if room.host != input.player {
        return Err((StatusCode::FORBIDDEN, "only the host can disband".to_string()));
    }
    rooms.remove(&code);
    tracing::info!(%code, "room disbanded");
    Ok(Json(json!({ "ok": true, "code": code })))
}

async fn debug_status(Path(status): Path<u16>, Query(query): Query<StatusQuery>) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, query.body).into_response()
}

async fn debug_delay(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "ok": true, "images": ["a.png"] }))
}

async fn debug_malformed() -> (StatusCode, &'static str) {
    (StatusCode::OK, "{\"ok\": tru")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_serializes_without_event_counter() {
        let room = Room {
            code: "AB12CD".to_string(),
            name: "Test".to_string(),
            host: "ana".to_string(),
            players: vec![Player {
                name: "ana".to_string(),
                ready: true,
                loadout: None,
            }],
            started: false,
            events: 7,
        };
        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["code"], "AB12CD");
        assert_eq!(json["players"][0]["ready"], true);
        assert!(json["players"][0].get("loadout").is_none());
        assert!(json.get("events").is_none());
    }

    #[test]
    fn new_codes_are_six_uppercase_hex() {
        let code = new_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn game_event_defaults_data_to_null() {
        let input: GameEvent = serde_json::from_str(r#"{"player":"ana","kind":"ping"}"#).unwrap();
        assert_eq!(input.data, Value::Null);
    }

    #[test]
    fn create_room_rejects_missing_player() {
        let result: Result<CreateRoom, _> = serde_json::from_str(r#"{"name":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn status_query_body_is_optional() {
        let query: StatusQuery = serde_json::from_str("{}").unwrap();
        assert!(query.body.is_empty());
    }
}
