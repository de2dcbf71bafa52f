//! The WebSocket/HTTP transport task — the sole async boundary in the
//! system. Talks to the [`SimulationController`](crate::controller) only
//! through the two bounded queues; never touches `World` directly.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::controller::{ActionQueue, SignalQueue};
use crate::protocol::{is_valid_action_name, ActionMessage, SignalMessage};

/// Outbound broadcast channel capacity. A lagging connection drops the
/// oldest signals rather than stalling every other connection — each
/// `tick.end` still lets a client resync state via `state.request`.
const BROADCAST_CAPACITY: usize = 1024;

/// How often the broadcast loop polls the (synchronous) signal queue.
const SIGNAL_POLL_INTERVAL: Duration = Duration::from_millis(25);

struct AppState {
    actions: Arc<ActionQueue>,
    broadcast_tx: broadcast::Sender<String>,
}

/// Build the router and spawn the background task that drains `signals` and
/// fans every entry out to all connected sockets. Caller awaits the returned
/// future to serve on `listener`.
pub fn build_app(actions: Arc<ActionQueue>, signals: Arc<SignalQueue>) -> Router {
    let (broadcast_tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);
    let state = Arc::new(AppState { actions, broadcast_tx: broadcast_tx.clone() });

    tokio::spawn(broadcast_loop(signals, broadcast_tx));

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "dt-transport listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "service": "dt-transport" }))
}

/// The only bridge between the controller's synchronous `SignalQueue` and
/// the async broadcast channel: blocking-poll it on a dedicated task so the
/// Tokio runtime's worker threads are never blocked by `recv_timeout`.
async fn broadcast_loop(signals: Arc<SignalQueue>, tx: broadcast::Sender<String>) {
    loop {
        let signals = signals.clone();
        let batch = tokio::task::spawn_blocking(move || {
            let mut out = Vec::new();
            if let Some(first) = signals.pop_timeout(SIGNAL_POLL_INTERVAL) {
                out.push(first);
                out.extend(signals.drain());
            }
            out
        })
        .await
        .unwrap_or_default();

        for signal in batch {
            match serde_json::to_string(&signal) {
                Ok(text) => {
                    // Err only means no receivers are currently subscribed.
                    let _ = tx.send(text);
                }
                Err(err) => warn!(%err, "failed to serialize outbound signal"),
            }
        }
    }
}

async fn ws_upgrade(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let mut broadcast_rx = state.broadcast_tx.subscribe();
    // Replies meant for this connection only — never fanned out through `broadcast_tx`.
    let (local_tx, mut local_rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                local = local_rx.recv() => {
                    match local {
                        Some(text) => if sink.send(Message::Text(text)).await.is_err() { break },
                        None => break,
                    }
                }
                broadcast = broadcast_rx.recv() => {
                    match broadcast {
                        Ok(text) => if sink.send(Message::Text(text)).await.is_err() { break },
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "connection lagged behind signal stream");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
    });

    let actions = state.actions.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            let Message::Text(text) = msg else { continue };
            handle_inbound_frame(&text, &actions, &local_tx);
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    debug!("websocket connection closed");
}

/// Parse and enqueue one inbound frame. A parse or name-validation failure
/// replies only on `reply` (this connection), never through the broadcast
/// channel; a valid action that cannot be enqueued because the queue
/// is full gets the same treatment.
fn handle_inbound_frame(text: &str, actions: &Arc<ActionQueue>, reply: &tokio::sync::mpsc::UnboundedSender<String>) {
    let send_error = |code: &str, message: String| {
        if let Ok(text) = serde_json::to_string(&SignalMessage::error(code, message)) {
            let _ = reply.send(text);
        }
    };

    let action: ActionMessage = match serde_json::from_str(text) {
        Ok(action) => action,
        Err(err) => {
            send_error("malformed_action", err.to_string());
            return;
        }
    };

    if !is_valid_action_name(&action.action) {
        send_error("malformed_action", format!("invalid action name '{}'", action.action));
        return;
    }

    if actions.try_push(action).is_err() {
        send_error("queue_full", "action queue is full, action dropped".to_string());
    }
}
