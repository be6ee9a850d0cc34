//! WebSocket client helpers

use super::auth_helpers::token_for;
use super::test_server::TestServer;
use futures_util::{SinkExt, StreamExt};
use social_realtime::shared::codec::decode_frame;
use social_realtime::shared::ServerFrame;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long `next_frame` waits before failing
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(3);

/// How long `assert_silent` listens
pub const SILENCE: Duration = Duration::from_millis(300);

/// Connect as `username` with a valid token
pub async fn connect_as(server: &TestServer, username: &str) -> Client {
    let (client, _response) = connect_async(server.ws_url(&token_for(username)))
        .await
        .expect("WebSocket handshake failed");
    client
}

/// Connect `usernames` in order and wait until all are registered
pub async fn connect_all(server: &TestServer, usernames: &[&str]) -> Vec<Client> {
    let mut clients = Vec::new();
    for username in usernames {
        clients.push(connect_as(server, username).await);
    }
    server.wait_for_connections(usernames.len()).await;
    clients
}

pub async fn send_text(client: &mut Client, text: &str) {
    client
        .send(Message::Text(text.to_string().into()))
        .await
        .expect("Failed to send frame");
}

pub async fn send_json(client: &mut Client, value: serde_json::Value) {
    send_text(client, &value.to_string()).await;
}

/// Next data frame from the server, skipping control frames
pub async fn next_frame(client: &mut Client) -> ServerFrame {
    let read = tokio::time::timeout(FRAME_TIMEOUT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => {
                    return decode_frame(text.as_str().as_bytes()).expect("Undecodable server frame")
                }
                Some(Ok(Message::Binary(bytes))) => {
                    return decode_frame(&bytes).expect("Undecodable server frame")
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                other => panic!("Expected a frame, got {:?}", other),
            }
        }
    })
    .await;

    read.expect("Timed out waiting for a frame")
}

/// Next close frame from the server, skipping everything else
pub async fn next_close(client: &mut Client) -> Option<CloseFrame> {
    let read = tokio::time::timeout(FRAME_TIMEOUT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(frame))) => return frame,
                Some(Ok(_)) => continue,
                other => panic!("Expected a close frame, got {:?}", other),
            }
        }
    })
    .await;

    read.expect("Timed out waiting for close")
}

/// Assert no data frame arrives within `SILENCE`
pub async fn assert_silent(client: &mut Client) {
    let read = tokio::time::timeout(SILENCE, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                other => return other,
            }
        }
    })
    .await;

    if let Ok(unexpected) = read {
        panic!("Expected silence, got {:?}", unexpected);
    }
}
