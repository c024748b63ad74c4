//! Minimal local HTTP server for timeout tests.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// How the server answers every request.
#[derive(Clone)]
pub(crate) struct SlowResponse {
    /// Response body
    pub body: &'static [u8],

    /// Pause before the status line is sent
    pub first_byte_delay: Duration,

    /// Body is written in pieces of this many bytes
    pub chunk_size: usize,

    /// Pause between body pieces
    pub chunk_gap: Duration,
}

/// Start a server on an ephemeral loopback port and return its base URL.
pub(crate) async fn serve(response: SlowResponse) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(answer(socket, response.clone()));
        }
    });

    format!("http://{}", addr)
}

async fn answer(mut socket: TcpStream, response: SlowResponse) {
    if read_request(&mut socket).await.is_err() {
        return;
    }

    tokio::time::sleep(response.first_byte_delay).await;

    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.body.len()
    );
    if socket.write_all(head.as_bytes()).await.is_err() {
        return;
    }

    for chunk in response.body.chunks(response.chunk_size.max(1)) {
        if socket.write_all(chunk).await.is_err() || socket.flush().await.is_err() {
            return;
        }
        tokio::time::sleep(response.chunk_gap).await;
    }

    let _ = socket.shutdown().await;
}

/// Consume the request head and any `Content-Length` body.
async fn read_request(socket: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body_read = buf.len() - head_end;
    while body_read < content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body_read += n;
    }
    Ok(())
}
