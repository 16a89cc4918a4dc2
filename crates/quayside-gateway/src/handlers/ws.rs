//! WebSocket channel handler.
//!
//! One socket per participant, user or agent alike; the distinction is made
//! by the first meaningful frame (`start_chat` vs `agent_join`), not by the
//! route. Each connection gets a fresh [`ConnectionId`], an outbound queue in
//! the [`ConnectionRegistry`], and a writer task draining that queue; the
//! reader loop decodes frames and dispatches them into the routing engine.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use quayside_core::ConnectionId;
use quayside_routing::ChatRouter;
use quayside_store::Store;

use crate::protocol::{ClientFrame, ServerFrame};
use crate::state::GatewayState;

/// WebSocket connection handler.
///
/// Upgrades the request and runs the channel loop until either side hangs
/// up. Connection teardown unregisters presence and channel bindings but
/// never closes sessions; a user may reconnect and resume.
pub async fn websocket_handler<R, S>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState<R, S>>>,
) -> Response
where
    R: ChatRouter + 'static,
    S: Store + 'static,
{
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

/// Run one connection's read and write loops.
async fn handle_socket<R, S>(state: Arc<GatewayState<R, S>>, socket: WebSocket)
where
    R: ChatRouter + 'static,
    S: Store + 'static,
{
    let connection_id = ConnectionId::generate();
    let rx = state.connections.register(connection_id);

    tracing::info!(connection_id = %connection_id, "Channel connected");

    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(write_loop(sink, rx, connection_id));

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(frame) => {
                    state.router.dispatch(connection_id, frame.into_inbound()).await;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        "Undecodable frame"
                    );
                    state.connections.send(
                        connection_id,
                        ServerFrame::Error {
                            kind: "invalid_frame".to_string(),
                            message: format!("undecodable frame: {e}"),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => break,
            // axum answers pings itself; binary frames are not part of the protocol
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "Channel read error");
                break;
            }
        }
    }

    state.router.disconnect(connection_id).await;
    state.connections.unregister(connection_id);
    writer.abort();

    tracing::info!(connection_id = %connection_id, "Channel disconnected");
}

/// Drain the outbound queue into the socket until either end closes.
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerFrame>,
    connection_id: ConnectionId,
) {
    while let Some(frame) = rx.recv().await {
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "Frame encode failed");
                continue;
            }
        };
        if sink.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
}
