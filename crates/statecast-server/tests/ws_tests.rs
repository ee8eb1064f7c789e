//! End-to-end tests over real `WebSocket` connections.
//!
//! Each test stands up the full stack — coordinator, arena simulation,
//! Axum router — on an ephemeral port and drives it with
//! `tokio-tungstenite` clients. Coalesced frames are split and decoded
//! exactly as a production client would.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use statecast_game::{Game, GameConfig};
use statecast_hub::config::{ConnectionConfig, HubConfig};
use statecast_server::router::build_router;
use statecast_server::state::AppState;
use statecast_types::{Envelope, MessageType, split_frame};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Per-await ceiling so a wedged test fails instead of hanging.
const WAIT: Duration = Duration::from_secs(5);

fn fast_hub_config() -> HubConfig {
    HubConfig {
        tick_rate_hz: 100,
        ..HubConfig::default()
    }
}

fn small_game_config() -> GameConfig {
    GameConfig {
        width: 100.0,
        height: 100.0,
        step: 10.0,
    }
}

async fn start_server(
    hub_config: HubConfig,
    connection: ConnectionConfig,
    game_config: GameConfig,
) -> SocketAddr {
    let (hub, _coordinator_task) =
        statecast_hub::spawn(Game::new(game_config), &hub_config).unwrap();
    let state = Arc::new(AppState::new(
        hub,
        connection,
        hub_config.outbound_queue_capacity,
    ));
    let router = build_router(state, Path::new("client/dist"));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// A test client that splits coalesced frames and decodes envelopes.
struct Client {
    ws: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    pending: VecDeque<Envelope>,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let (ws, _response) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .unwrap();
        Self {
            ws,
            pending: VecDeque::new(),
        }
    }

    async fn next_envelope(&mut self) -> Envelope {
        loop {
            if let Some(envelope) = self.pending.pop_front() {
                return envelope;
            }
            let message = timeout(WAIT, self.ws.next()).await.unwrap().unwrap().unwrap();
            if let Message::Text(text) = message {
                for segment in split_frame(&text) {
                    self.pending.push_back(Envelope::decode(segment).unwrap());
                }
            }
        }
    }

    /// Skip ahead to the next `gState` payload.
    async fn next_snapshot(&mut self) -> Value {
        loop {
            let envelope = self.next_envelope().await;
            if envelope.msg_type == MessageType::GameState {
                return envelope.payload;
            }
        }
    }

    async fn send_text(&mut self, text: String) {
        self.ws.send(Message::text(text)).await.unwrap();
    }

    /// Wait until this client observes the named player at the arena
    /// origin; panics (via timeout) if it never happens.
    async fn wait_for_player_at_origin(&mut self, player: &str) -> Value {
        for _ in 0..500u32 {
            let snapshot = self.next_snapshot().await;
            let position = &snapshot["players"][player];
            if position.is_object()
                && position["x"].as_f64().unwrap() < f64::EPSILON
                && position["y"].as_f64().unwrap() < f64::EPSILON
            {
                return snapshot;
            }
        }
        panic!("player {player} never reached the origin");
    }
}

fn move_event(player: &str, action: &str) -> String {
    format!(r#"{{"playerId":"{player}","action":"{action}"}}"#)
}

#[tokio::test]
async fn identity_arrives_before_any_snapshot() {
    let addr = start_server(
        fast_hub_config(),
        ConnectionConfig::default(),
        small_game_config(),
    )
    .await;
    let mut client = Client::connect(addr).await;

    let first = client.next_envelope().await;
    assert_eq!(first.msg_type, MessageType::PlayerId);
    let id = first.payload["playerId"].as_str().unwrap().to_owned();

    // Quiet cycles broadcast byte-identical snapshots.
    let s1 = client.next_snapshot().await;
    let s2 = client.next_snapshot().await;
    let s3 = client.next_snapshot().await;
    assert_eq!(s1, s2);
    assert_eq!(s2, s3);

    let players = s1["players"].as_object().unwrap();
    assert_eq!(players.len(), 1);
    assert!(players.contains_key(&id));
}

#[tokio::test]
async fn one_event_reaches_every_peer_identically() {
    let addr = start_server(
        fast_hub_config(),
        ConnectionConfig::default(),
        small_game_config(),
    )
    .await;

    let mut a = Client::connect(addr).await;
    let id_a = a.next_envelope().await.payload["playerId"]
        .as_str()
        .unwrap()
        .to_owned();
    let mut b = Client::connect(addr).await;
    let _id_b = b.next_envelope().await;

    // Drive peer A into the top-left corner; clamping makes the final
    // position deterministic regardless of the random spawn point.
    for _ in 0..20 {
        a.send_text(move_event(&id_a, "left")).await;
        a.send_text(move_event(&id_a, "up")).await;
    }

    let snap_a = a.wait_for_player_at_origin(&id_a).await;
    let snap_b = b.wait_for_player_at_origin(&id_a).await;

    // Both peers converge on the same state, with both players present.
    assert_eq!(snap_a["players"].as_object().unwrap().len(), 2);
    assert_eq!(snap_b["players"].as_object().unwrap().len(), 2);
    assert_eq!(snap_a["players"][&id_a], snap_b["players"][&id_a]);
}

#[tokio::test]
async fn malformed_event_is_discarded_not_fatal() {
    let addr = start_server(
        fast_hub_config(),
        ConnectionConfig::default(),
        small_game_config(),
    )
    .await;

    let mut client = Client::connect(addr).await;
    let id = client.next_envelope().await.payload["playerId"]
        .as_str()
        .unwrap()
        .to_owned();

    // One invalid message sandwiched between valid ones: the invalid
    // one is dropped, the stream and the valid events survive.
    client.send_text(move_event(&id, "left")).await;
    client.send_text(String::from("this is not json")).await;
    for _ in 0..20 {
        client.send_text(move_event(&id, "left")).await;
        client.send_text(move_event(&id, "up")).await;
    }

    let snapshot = client.wait_for_player_at_origin(&id).await;
    assert_eq!(snapshot["players"].as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn oversized_message_closes_the_connection() {
    let addr = start_server(
        fast_hub_config(),
        ConnectionConfig::default(),
        small_game_config(),
    )
    .await;

    let mut client = Client::connect(addr).await;
    let _identity = client.next_envelope().await;

    // Default limit is 512 bytes.
    client.send_text("x".repeat(600)).await;

    // The server tears the connection down; in-flight snapshots drain
    // first, then the stream ends (close frame or reset).
    loop {
        match timeout(WAIT, client.ws.next()).await.unwrap() {
            None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
            Some(Ok(_)) => {}
        }
    }
}

#[tokio::test]
async fn silent_peer_is_closed_after_liveness_window() {
    let connection = ConnectionConfig {
        liveness_window_ms: 300,
        ..ConnectionConfig::default()
    };
    let addr = start_server(fast_hub_config(), connection, small_game_config()).await;

    let mut client = Client::connect(addr).await;
    let _identity = client.next_envelope().await;

    // Go silent: no reads means no pong replies, no writes means no
    // traffic at all. The read deadline must fire.
    tokio::time::sleep(Duration::from_millis(900)).await;

    loop {
        match timeout(WAIT, client.ws.next()).await.unwrap() {
            None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
            Some(Ok(_)) => {}
        }
    }
}
