use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use bwallet_core::events::WalletNotice;
use bwallet_core::wallet::WalletView;
use bwallet_sdk::objects::{WsCloseCode, WsServerMessage};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(wallet_ws))
}

/// `GET /ws`: WebSocket stream of the brand's wallet notices.
///
/// The first frame is the current balance. Each notice is followed by the
/// balance it was reconciled into. The stream ends when the client closes
/// or the server shuts the brand's watch down.
async fn wallet_ws(
    state: State<AppState>,
    Path(brand_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let app_state = state.0.clone();
    ws.on_upgrade(move |socket| handle_wallet_ws(socket, app_state, brand_id))
}

async fn handle_wallet_ws(mut socket: WebSocket, state: AppState, brand_id: Uuid) {
    // Only the receiver and the view are kept, so shutting the watch down
    // closes the stream.
    let (mut notices, view) = {
        let entry = state.brand(brand_id).await;
        (entry.watch.subscribe(), entry.watch.view().clone())
    };

    // A freshly started watch has not read the ledger yet.
    let balance = view.fresh_balance().await;
    if send_json(&mut socket, &WsServerMessage::Balance { balance })
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            result = notices.recv() => {
                match result {
                    Ok(notice) => {
                        if send_json(&mut socket, &WsServerMessage::from(notice)).await.is_err() {
                            return;
                        }
                        if send_balance(&mut socket, &view).await.is_err() {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(%brand_id, skipped = n, "WS: notice receiver lagged");
                        let notice = WalletNotice::info(format!("{n} wallet updates were missed."));
                        if send_json(&mut socket, &WsServerMessage::from(notice)).await.is_err() {
                            return;
                        }
                        if send_balance(&mut socket, &view).await.is_err() {
                            return;
                        }
                    }
                    Err(RecvError::Closed) => {
                        close_with(&mut socket, WsCloseCode::GOING_AWAY, "server shutting down").await;
                        return;
                    }
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

async fn send_balance(socket: &mut WebSocket, view: &Arc<WalletView>) -> Result<(), ()> {
    let balance = view.snapshot().await.balance;
    send_json(socket, &WsServerMessage::Balance { balance }).await
}

async fn close_with(socket: &mut WebSocket, code: u16, reason: &'static str) {
    let _ = send_json(
        socket,
        &WsServerMessage::Error {
            code,
            reason: reason.into(),
        },
    )
    .await;
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await;
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
