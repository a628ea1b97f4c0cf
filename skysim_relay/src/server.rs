// skysim_relay/src/server.rs

use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::protocol::{handle_line, COMMANDS};

/// Accept loop: every connection gets its own reader and periodic sender.
/// A failed connection never affects the others; the listener keeps
/// accepting.
pub async fn serve(listener: TcpListener, interval: Duration) -> std::io::Result<()> {
    info!(address = %listener.local_addr()?, "relay listening");
    loop {
        let (socket, peer) = listener.accept().await?;
        info!(%peer, "client connected");
        tokio::spawn(handle_connection(socket, peer.to_string(), interval));
    }
}

async fn handle_connection(socket: TcpStream, peer: String, interval: Duration) {
    let (read_half, write_half) = socket.into_split();

    // All outbound traffic is funneled through one writer task; the
    // periodic sender and the ack path both feed it.
    let (tx, rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(write_loop(write_half, rx, peer.clone()));
    let sender = {
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let message = {
                    let mut rng = rand::thread_rng();
                    COMMANDS
                        .choose(&mut rng)
                        .expect("command table is non-empty")
                        .to_message()
                };
                if tx.send(message.to_string()).is_err() {
                    break; // writer gone: this connection's sender ends
                }
            }
        })
    };

    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(reply) = handle_line(&peer, &line) {
                    if tx.send(reply.to_string()).is_err() {
                        break;
                    }
                }
            }
            Ok(None) => break,
            Err(error) => {
                warn!(%peer, %error, "read error");
                break;
            }
        }
    }

    info!(%peer, "client disconnected");
    sender.abort();
    drop(tx);
    let _ = writer.await;
}

async fn write_loop(
    mut write_half: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<String>,
    peer: String,
) {
    while let Some(message) = rx.recv().await {
        let framed = format!("{message}\n");
        if let Err(error) = write_half.write_all(framed.as_bytes()).await {
            warn!(%peer, %error, "send error");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn start_relay(interval: Duration) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, interval));
        address
    }

    #[tokio::test]
    async fn acks_natural_language_input() {
        let address = start_relay(Duration::from_secs(60)).await;
        let mut socket = TcpStream::connect(address).await.unwrap();
        socket
            .write_all(
                b"{\"type\":\"nl_command\",\"original\":\"go home\",\"command\":{\"action\":\"navigate\"}}\n",
            )
            .await
            .unwrap();

        let (read_half, _write_half) = socket.split();
        let mut lines = BufReader::new(read_half).lines();
        let reply = lines.next_line().await.unwrap().unwrap();
        let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(reply["type"], "ack");
        assert_eq!(reply["message"], "Received NL input: go home");
        assert_eq!(reply["command"]["action"], "navigate");
    }

    #[tokio::test]
    async fn sends_periodic_commands() {
        let address = start_relay(Duration::from_millis(10)).await;
        let socket = TcpStream::connect(address).await.unwrap();
        let mut lines = BufReader::new(socket).lines();
        let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
            .await
            .expect("command within the interval")
            .unwrap()
            .unwrap();
        let message: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(message["type"], "command");
        let action = message["action"].as_str().unwrap();
        assert!(COMMANDS.iter().any(|c| c.action == action));
    }

    #[tokio::test]
    async fn malformed_input_keeps_the_connection_alive() {
        let address = start_relay(Duration::from_secs(60)).await;
        let mut socket = TcpStream::connect(address).await.unwrap();
        socket.write_all(b"garbage that is not json\n").await.unwrap();
        socket
            .write_all(b"{\"type\":\"nl_text\",\"text\":\"hover\",\"command\":null}\n")
            .await
            .unwrap();

        let (read_half, _write_half) = socket.split();
        let mut lines = BufReader::new(read_half).lines();
        // The garbage line is dropped; the next valid message still acks.
        let reply = lines.next_line().await.unwrap().unwrap();
        let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(reply["message"], "Received NL input: hover");
    }

    #[tokio::test]
    async fn one_dropped_client_does_not_stop_the_listener() {
        let address = start_relay(Duration::from_secs(60)).await;
        {
            let mut first = TcpStream::connect(address).await.unwrap();
            first.write_all(b"{\"type\":\"status\"}\n").await.unwrap();
        } // dropped immediately

        let mut second = TcpStream::connect(address).await.unwrap();
        second
            .write_all(
                b"{\"type\":\"nl_command\",\"original\":\"ping\",\"command\":\"pong\"}\n",
            )
            .await
            .unwrap();
        let (read_half, _write_half) = second.split();
        let mut lines = BufReader::new(read_half).lines();
        let reply = lines.next_line().await.unwrap().unwrap();
        assert!(reply.contains("Received NL input: ping"));
    }
}
