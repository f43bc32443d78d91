//! Server lifecycle tests over a real socket.
//!
//! Tests:
//! - Requests are served on a bound listener
//! - Graceful shutdown ends open subscription streams instead of hanging

mod common;

use common::wait_for;
use lyricbus::bus::Bus;
use lyricbus::karaoke::KARAOKE_REQUESTED;
use lyricbus::server::serve;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;

/// Send a raw HTTP/1.1 GET and return the connection.
async fn send_get(addr: std::net::SocketAddr, path: &str) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.expect("connect failed");
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write failed");
    stream
}

/// Read from the connection until `needle` appears.
async fn read_until(stream: &mut TcpStream, needle: &str) -> String {
    let mut received = String::new();
    let mut buf = [0u8; 1024];
    while !received.contains(needle) {
        let n = timeout(Duration::from_secs(5), stream.read(&mut buf))
            .await
            .expect("timed out reading response")
            .expect("read failed");
        if n == 0 {
            break;
        }
        received.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    received
}

#[tokio::test]
async fn test_serves_health_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(serve(listener, Bus::default(), shutdown_rx));

    let mut stream = send_get(addr, "/health").await;
    let response = read_until(&mut stream, "OK").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    drop(stream);

    shutdown_tx.send(true).unwrap();
    timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_open_subscriptions() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let bus = Bus::default();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(serve(listener, bus.clone(), shutdown_rx));

    let mut stream = send_get(addr, "/subscriptions/requested").await;
    let headers = read_until(&mut stream, "\r\n\r\n").await;
    assert!(headers.contains("text/event-stream"), "{headers}");
    assert!(wait_for(Duration::from_secs(5), || bus.subscriber_count(KARAOKE_REQUESTED) == 1).await);

    shutdown_tx.send(true).unwrap();

    timeout(Duration::from_secs(5), server)
        .await
        .expect("server hung on open subscription")
        .unwrap()
        .unwrap();
    assert_eq!(bus.subscriber_count(KARAOKE_REQUESTED), 0);

    // A handler that subscribes after shutdown gets an already-ended stream
    let late = bus.subscribe(KARAOKE_REQUESTED);
    assert!(late.is_closed());
    assert_eq!(bus.subscriber_count(KARAOKE_REQUESTED), 0);
}
