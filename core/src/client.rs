//! Named room and gameplay operations over the request executor.
//!
//! # Design
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` descriptor and an async method that executes it and decodes
//! the JSON into a DTO. The builders are pure, so request shapes are tested
//! without a network. Callers that need their own cancellation take a built
//! descriptor, attach a token with `HttpRequest::with_cancel`, and pass it
//! to `send`.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::executor::RequestExecutor;
use crate::http::{HttpMethod, HttpRequest};
use crate::types::{
    CreateRoom, Disbanded, EventAck, GameEvent, PlayerAction, Room, SetLoadout, SetReady,
};

static ROOM_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,32}$").expect("room code pattern is valid"));

#[derive(Debug, Clone)]
pub struct ArcadeClient {
    executor: RequestExecutor,
}

impl ArcadeClient {
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    pub fn build_list_rooms(&self) -> HttpRequest {
        HttpRequest::get("/api/rooms")
    }

    pub fn build_create_room(&self, name: &str, player: &str) -> Result<HttpRequest, ApiError> {
        json_request(
            HttpMethod::Post,
            "/api/rooms".to_string(),
            &CreateRoom {
                name: name.to_string(),
                player: player.to_string(),
            },
        )
    }

    pub fn build_join_room(&self, code: &str, player: &str) -> Result<HttpRequest, ApiError> {
        json_request(HttpMethod::Post, room_path(code, "join")?, &player_action(player))
    }

    pub fn build_leave_room(&self, code: &str, player: &str) -> Result<HttpRequest, ApiError> {
        json_request(HttpMethod::Post, room_path(code, "leave")?, &player_action(player))
    }

    pub fn build_set_loadout(
        &self,
        code: &str,
        player: &str,
        loadout: Value,
    ) -> Result<HttpRequest, ApiError> {
        json_request(
            HttpMethod::Put,
            room_path(code, "loadout")?,
            &SetLoadout {
                player: player.to_string(),
                loadout,
            },
        )
    }

    pub fn build_start_game(&self, code: &str, player: &str) -> Result<HttpRequest, ApiError> {
        json_request(HttpMethod::Post, room_path(code, "start")?, &player_action(player))
    }

    pub fn build_set_ready(
        &self,
        code: &str,
        player: &str,
        ready: bool,
    ) -> Result<HttpRequest, ApiError> {
        json_request(
            HttpMethod::Post,
            room_path(code, "ready")?,
            &SetReady {
                player: player.to_string(),
                ready,
            },
        )
    }

    pub fn build_post_event(
        &self,
        code: &str,
        player: &str,
        kind: &str,
        data: Value,
    ) -> Result<HttpRequest, ApiError> {
        json_request(
            HttpMethod::Post,
            room_path(code, "events")?,
            &GameEvent {
                player: player.to_string(),
                kind: kind.to_string(),
                data,
            },
        )
    }

    pub fn build_disband_room(&self, code: &str, player: &str) -> Result<HttpRequest, ApiError> {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("player", player)
            .finish();
        Ok(HttpRequest::new(
            HttpMethod::Delete,
            format!("/api/rooms/{}?{query}", valid_code(code)?),
        ))
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Execute any descriptor and decode the JSON response into `T`.
    pub async fn send<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ApiError> {
        let value = self.executor.execute(request).await?;
        serde_json::from_value(value).map_err(|e| ApiError::UnexpectedResponse(e.to_string()))
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>, ApiError> {
        self.send(self.build_list_rooms()).await
    }

    pub async fn create_room(&self, name: &str, player: &str) -> Result<Room, ApiError> {
        self.send(self.build_create_room(name, player)?).await
    }

    pub async fn join_room(&self, code: &str, player: &str) -> Result<Room, ApiError> {
        self.send(self.build_join_room(code, player)?).await
    }

    pub async fn leave_room(&self, code: &str, player: &str) -> Result<Room, ApiError> {
        self.send(self.build_leave_room(code, player)?).await
    }

    pub async fn set_loadout(
        &self,
        code: &str,
        player: &str,
        loadout: Value,
    ) -> Result<Room, ApiError> {
        self.send(self.build_set_loadout(code, player, loadout)?).await
    }

    pub async fn start_game(&self, code: &str, player: &str) -> Result<Room, ApiError> {
        self.send(self.build_start_game(code, player)?).await
    }

    pub async fn set_ready(&self, code: &str, player: &str, ready: bool) -> Result<Room, ApiError> {
        self.send(self.build_set_ready(code, player, ready)?).await
    }

    pub async fn post_event(
        &self,
        code: &str,
        player: &str,
        kind: &str,
        data: Value,
    ) -> Result<EventAck, ApiError> {
        self.send(self.build_post_event(code, player, kind, data)?).await
    }

    pub async fn disband_room(&self, code: &str, player: &str) -> Result<Disbanded, ApiError> {
        self.send(self.build_disband_room(code, player)?).await
    }
}

fn player_action(player: &str) -> PlayerAction {
    PlayerAction {
        player: player.to_string(),
    }
}

fn valid_code(code: &str) -> Result<&str, ApiError> {
    if ROOM_CODE.is_match(code) {
        Ok(code)
    } else {
        Err(ApiError::InvalidInput(format!("invalid room code {code:?}")))
    }
}

fn room_path(code: &str, action: &str) -> Result<String, ApiError> {
    Ok(format!("/api/rooms/{}/{action}", valid_code(code)?))
}

fn json_request(
    method: HttpMethod,
    path: String,
    payload: &impl Serialize,
) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok(HttpRequest::new(method, path).with_json_body(body))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::device::{DeviceClass, DeviceClassifier};
    use crate::health::HealthBus;
    use crate::origin::BaseLocation;
    use crate::transport::ReqwestTransport;

    fn client() -> ArcadeClient {
        let executor = RequestExecutor::new(
            Arc::new(ReqwestTransport::default()),
            BaseLocation::parse("http://localhost:3000").unwrap(),
            Arc::new(DeviceClassifier::fixed(DeviceClass::Standard)),
            HealthBus::new(),
        );
        ArcadeClient::new(executor)
    }

    fn body(req: &HttpRequest) -> Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn build_list_rooms_produces_correct_request() {
        let req = client().build_list_rooms();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "/api/rooms");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_create_room_produces_correct_request() {
        let req = client().build_create_room("Friday night", "ana").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "/api/rooms");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        assert_eq!(body(&req), json!({"name": "Friday night", "player": "ana"}));
    }

    #[test]
    fn build_room_actions_target_the_room() {
        let c = client();
        let cases = [
            (c.build_join_room("AB12", "bo").unwrap(), HttpMethod::Post, "/api/rooms/AB12/join"),
            (c.build_leave_room("AB12", "bo").unwrap(), HttpMethod::Post, "/api/rooms/AB12/leave"),
            (c.build_start_game("AB12", "bo").unwrap(), HttpMethod::Post, "/api/rooms/AB12/start"),
        ];
        for (req, method, path) in cases {
            assert_eq!(req.method, method);
            assert_eq!(req.path, path);
            assert_eq!(body(&req), json!({"player": "bo"}));
        }
    }

    #[test]
    fn build_set_loadout_keeps_loadout_opaque() {
        let loadout = json!({"ship": "wasp", "perks": ["dash", 3]});
        let req = client().build_set_loadout("AB12", "bo", loadout.clone()).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "/api/rooms/AB12/loadout");
        assert_eq!(body(&req), json!({"player": "bo", "loadout": loadout}));
    }

    #[test]
    fn build_set_ready_produces_correct_request() {
        let req = client().build_set_ready("AB12", "bo", true).unwrap();
        assert_eq!(req.path, "/api/rooms/AB12/ready");
        assert_eq!(body(&req), json!({"player": "bo", "ready": true}));
    }

    #[test]
    fn build_post_event_produces_correct_request() {
        let req = client()
            .build_post_event("AB12", "bo", "score", json!({"points": 40}))
            .unwrap();
        assert_eq!(req.path, "/api/rooms/AB12/events");
        assert_eq!(
            body(&req),
            json!({"player": "bo", "kind": "score", "data": {"points": 40}})
        );
    }

    #[test]
    fn build_disband_room_encodes_player_in_query() {
        let req = client().build_disband_room("AB12", "bo & co").unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "/api/rooms/AB12?player=bo+%26+co");
        assert!(req.body.is_none());
    }

    #[test]
    fn room_codes_cannot_escape_the_path() {
        let c = client();
        for code in ["", "../admin", "a/b", "//evil.example", "AB12?x=1", "a b"] {
            assert!(
                matches!(c.build_join_room(code, "bo"), Err(ApiError::InvalidInput(_))),
                "{code:?}"
            );
            assert!(c.build_disband_room(code, "bo").is_err(), "{code:?}");
        }
    }
}
