use super::state::AppState;
use crate::session::{
    ClientMessage, ConnectionDispatcher, ConnectionId, EventReceiver, EventSender, TranslationEvent,
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tracing::{error, info, warn};

/// GET /translator/ws
/// Upgrade to the streaming translation protocol
pub async fn translator_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::new();
    info!("Client connected: {}", connection_id);

    let (ws_tx, mut ws_rx) = socket.split();
    let (events, event_rx) = EventSender::channel(connection_id.clone());
    let writer = tokio::spawn(write_events(ws_tx, event_rx));

    let mut dispatcher = ConnectionDispatcher::new(
        state.sessions,
        state.collaborators,
        state.defaults,
        events.clone(),
    );

    loop {
        tokio::select! {
            message = ws_rx.next() => match message {
                Some(Ok(Message::Binary(chunk))) => dispatcher.push_audio(chunk).await,
                Some(Ok(Message::Text(text))) => match ClientMessage::parse(&text) {
                    Ok(message) => dispatcher.handle_client_message(message).await,
                    Err(e) => {
                        warn!("[{}] {:#}", connection_id, e);
                        events.emit(TranslationEvent::error(format!("{:#}", e)));
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("[{}] WebSocket error: {}", connection_id, e);
                    break;
                }
            },
            event = dispatcher.next_recognition_event() => {
                dispatcher.handle_recognition_event(event).await;
            }
        }
    }

    dispatcher.disconnect().await;

    // Workers finishing in-flight calls may still hold senders
    writer.abort();
}

/// Serialize events onto the socket in production order
async fn write_events(mut ws_tx: SplitSink<WebSocket, Message>, mut event_rx: EventReceiver) {
    while let Some(event) = event_rx.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize event: {}", e);
                continue;
            }
        };

        if ws_tx.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
}
