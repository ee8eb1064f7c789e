//! The connection endpoint: one read task and one write task per peer.
//!
//! On upgrade the peer gets an identity, a bounded outbound queue, and a
//! registration with the coordinator. The socket is then split:
//!
//! - the **read path** turns transport frames into normalized inbound
//!   events and enforces the liveness window;
//! - the **write path** drains the outbound queue onto the socket,
//!   coalescing whatever is already queued into one newline-delimited
//!   frame, and sends periodic liveness probes.
//!
//! The two tasks are supervised together: whichever exits first takes
//! the other down with it, and the coordinator hears about the departure
//! exactly once. Lifecycle is strictly `Open -> Closing -> Closed`; no
//! error here ever reaches the coordinator or another connection.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt as _, StreamExt as _};
use statecast_hub::config::ConnectionConfig;
use statecast_hub::coordinator::HubHandle;
use statecast_hub::registry::ConnectionHandle;
use statecast_types::{InboundEvent, PeerId, coalesce};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and hand it to
/// the per-connection task pair.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Run one connection's lifecycle from registration to teardown.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let id = PeerId::new();

    let (outbound_tx, outbound_rx) = mpsc::channel(state.outbound_queue_capacity);
    if state
        .hub
        .register(ConnectionHandle::new(id, outbound_tx))
        .await
        .is_err()
    {
        warn!(peer = %id, "coordinator unavailable, dropping connection");
        return;
    }
    info!(peer = %id, "peer connected");

    let (sink, stream) = socket.split();
    let mut write_task = tokio::spawn(write_path(sink, outbound_rx, id, state.connection.clone()));
    let mut read_task = tokio::spawn(read_path(
        stream,
        id,
        state.hub.clone(),
        state.connection.clone(),
    ));

    // Structured teardown: failure of either path unwinds both, then
    // the coordinator is notified once.
    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }

    if state.hub.unregister(id).await.is_err() {
        debug!(peer = %id, "coordinator already gone during teardown");
    }
    info!(peer = %id, "peer disconnected");
}

/// Read transport frames, normalize them, and forward them to the
/// coordinator's ingress queue.
///
/// Every successful read — a pong included — restarts the liveness
/// window; a window with no traffic at all closes the connection.
async fn read_path(
    mut stream: SplitStream<WebSocket>,
    id: PeerId,
    hub: HubHandle,
    config: ConnectionConfig,
) {
    let window = config.liveness_window();
    loop {
        let message = match timeout(window, stream.next()).await {
            Err(_elapsed) => {
                warn!(peer = %id, "liveness window expired, closing connection");
                return;
            }
            // Transport closed under us.
            Ok(None) => return,
            Ok(Some(Err(error))) => {
                warn!(peer = %id, %error, "read error, closing connection");
                return;
            }
            Ok(Some(Ok(message))) => message,
        };

        match message {
            Message::Text(text) => {
                if text.len() > config.max_message_size {
                    warn!(
                        peer = %id,
                        size = text.len(),
                        limit = config.max_message_size,
                        "inbound message exceeds size limit, closing connection"
                    );
                    return;
                }
                // One transport frame maps to one logical line.
                let normalized = text.as_str().replace('\n', " ").trim().to_owned();
                if normalized.is_empty() {
                    continue;
                }
                if hub.submit_event(InboundEvent::new(id, normalized)).await.is_err() {
                    warn!(peer = %id, "coordinator gone, closing connection");
                    return;
                }
            }
            // Any control traffic keeps the connection alive; pongs are
            // exactly what the timed read above is waiting for.
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Binary(_) => {
                debug!(peer = %id, "ignoring binary frame");
            }
            // Expected peer-initiated close: quiet teardown.
            Message::Close(_) => return,
        }
    }
}

/// Drain the outbound queue onto the socket and send liveness probes.
///
/// On each wakeup the backlog length is snapshotted *before* draining,
/// so a producer racing to enqueue more cannot extend the batch
/// unboundedly. The batch is coalesced into one newline-delimited
/// frame. Queue closure means the coordinator dropped us: send a close
/// frame and unwind.
async fn write_path(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<String>,
    id: PeerId,
    config: ConnectionConfig,
) {
    let mut probe = interval(config.probe_period());
    probe.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // An interval's first tick completes immediately; consume it so the
    // first real probe fires one full period from now.
    probe.tick().await;

    loop {
        tokio::select! {
            maybe = outbound.recv() => match maybe {
                Some(first) => {
                    let frame = drain_batch(&mut outbound, first);
                    match timeout(config.write_wait(), sink.send(Message::Text(frame.into()))).await {
                        Ok(Ok(())) => {}
                        Ok(Err(error)) => {
                            debug!(peer = %id, %error, "write failed, closing connection");
                            return;
                        }
                        Err(_elapsed) => {
                            warn!(peer = %id, "write deadline exceeded, closing connection");
                            return;
                        }
                    }
                }
                None => {
                    // The coordinator closed the queue (unregistration or
                    // backpressure eviction).
                    let _ = timeout(config.write_wait(), sink.send(Message::Close(None))).await;
                    return;
                }
            },
            _ = probe.tick() => {
                let ping = Message::Ping(Bytes::new());
                match timeout(config.write_wait(), sink.send(ping)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(error)) => {
                        debug!(peer = %id, %error, "liveness probe failed, closing connection");
                        return;
                    }
                    Err(_elapsed) => {
                        warn!(peer = %id, "liveness probe deadline exceeded, closing connection");
                        return;
                    }
                }
            }
        }
    }
}

/// Join `first` with everything already queued into one coalesced frame.
///
/// The backlog length is snapshotted before draining, so a producer
/// racing to enqueue more cannot extend the batch unboundedly; anything
/// arriving mid-drain waits for the next wakeup.
fn drain_batch(outbound: &mut mpsc::Receiver<String>, first: String) -> String {
    let pending = outbound.len();
    let mut batch = Vec::with_capacity(pending.saturating_add(1));
    batch.push(first);
    for _ in 0..pending {
        match outbound.try_recv() {
            Ok(next) => batch.push(next),
            Err(_empty) => break,
        }
    }
    coalesce(&batch)
}
