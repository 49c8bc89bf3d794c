#![allow(dead_code)]

use std::{future::Future, net::SocketAddr};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use vidcat_recs::transport::{Endpoint, Message};

/// Starts a listener on an ephemeral port and hands every accepted
/// connection to `handler` on its own task
pub async fn spawn_server<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(TcpStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handler(stream));
        }
    });

    addr
}

pub fn endpoint(addr: SocketAddr) -> Endpoint {
    Endpoint::new(addr.ip().to_string(), addr.port())
}

/// Reads one request; requests always end with a newline
pub async fn read_request(stream: &mut TcpStream) -> Message {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    while !buf.ends_with(b"\n") {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Message::decode(&buf)
}

/// Blocks until the client closes its side of the connection
pub async fn wait_for_client_close(stream: &mut TcpStream) {
    let mut chunk = [0u8; 1024];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(_) => continue,
        }
    }
}

/// Behaves like the production recommendation service: answers each
/// request with sorted, newline-terminated lines and keeps the connection
/// open until the client hangs up
pub async fn reference_service(mut stream: TcpStream) {
    let request = read_request(&mut stream).await;

    let response = match request.get("action") {
        Some("view") => Message::new().with("status", "success"),
        Some("recommend") => {
            let user_id = request.get("user_id").unwrap_or_default();
            if user_id == "new_user" {
                Message::new().with("recommendations", "")
            } else {
                Message::new().with("recommendations", format!("{}-a,{}-b", user_id, user_id))
            }
        }
        Some("test") => Message::new()
            .with("message", "Test successful")
            .with("status", "success"),
        _ => Message::new()
            .with("message", "Unknown action")
            .with("status", "error"),
    };

    stream.write_all(&response.encode()).await.unwrap();
    wait_for_client_close(&mut stream).await;
}
