//! Line-delimited JSON over TCP.
//!
//! Each line a client writes is one [`ClientMessage`]; each line the server
//! writes is one [`ServerMessage`]. Closing the socket is the disconnect
//! signal.
use std::net::SocketAddr;

use anyhow::Context;
use duel_runtime::{ClientMessage, LobbyHandle, ServerMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    lobby: LobbyHandle,
) -> anyhow::Result<()> {
    let connection = lobby.connect();
    let session = connection.id();
    let (inbound, outbound) = connection.split();
    let (reader, writer) = stream.into_split();

    let writer_task = tokio::spawn(write_messages(writer, outbound));
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await.context("reading from socket")? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ClientMessage>(&line) {
            Ok(message) => {
                if inbound.send(message).await.is_err() {
                    break;
                }
            }
            Err(error) => {
                warn!(target: "server::transport", %peer, %session, %error, "malformed message");
            }
        }
    }

    debug!(target: "server::transport", %peer, %session, "socket closed");
    drop(inbound);
    writer_task.await.context("joining writer task")?
}

async fn write_messages(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<ServerMessage>,
) -> anyhow::Result<()> {
    while let Some(message) = outbound.recv().await {
        let mut line = serde_json::to_vec(&message).context("encoding message")?;
        line.push(b'\n');
        if writer.write_all(&line).await.is_err() {
            break;
        }
    }
    Ok(())
}
