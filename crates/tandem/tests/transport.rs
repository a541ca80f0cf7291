//! Transport behaviour over loopback TCP.

use std::time::Duration;

use tandem::net::{kinds, ConnectionState, Frame, FrameKind, Transport, TransportConfig};
use tandem_testkit::{connected_pair, dial_config, free_port, listen_config, wait_for};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_pair_exchanges_frames() {
    let (server, client) = connected_pair().await;

    assert!(server.send_frame(&Frame::hello("reader")).await);
    assert!(client.send_frame(&Frame::ack("ok")).await);

    let at_client = client.recv_frame(TIMEOUT).await.unwrap();
    assert_eq!(at_client.frame_kind(), FrameKind::Hello);
    assert_eq!(&at_client.payload[..], b"reader");

    let at_server = server.recv_frame(TIMEOUT).await.unwrap();
    assert_eq!(at_server.kind, kinds::ACK);

    client.stop().await;
    server.stop().await;
}

#[tokio::test]
async fn test_empty_payload_and_large_payload() {
    let (server, client) = connected_pair().await;

    let large = vec![0xAB; 1024 * 1024];
    assert!(client.send_frame(&Frame::new(9u8, Vec::new())).await);
    assert!(client.send_frame(&Frame::new(10u8, large.clone())).await);

    let empty = server.recv_frame(TIMEOUT).await.unwrap();
    assert_eq!(empty.kind, 9);
    assert!(empty.payload.is_empty());

    let big = server.recv_frame(TIMEOUT).await.unwrap();
    assert_eq!(big.kind, 10);
    assert_eq!(&big.payload[..], &large[..]);

    client.stop().await;
    server.stop().await;
}

#[tokio::test]
async fn test_raw_peer_speaks_the_framing() {
    let port = free_port().await;
    let server = Transport::new(listen_config(port));
    server.start().await.unwrap();

    let mut raw = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    // L = 5: kind 3 (PING) and "ping".
    raw.write_all(&[0, 0, 0, 5, 3, b'p', b'i', b'n', b'g']).await.unwrap();

    let frame = server.recv_frame(TIMEOUT).await.unwrap();
    assert_eq!(frame, Frame::ping());

    server.stop().await;
}

#[tokio::test]
async fn test_dialer_recovers_after_listener_restart() {
    let port = free_port().await;
    let client = Transport::new(dial_config(port));
    client.start().await.unwrap();

    let first = Transport::new(listen_config(port));
    first.start().await.unwrap();
    assert!(wait_for(TIMEOUT, || client.is_connected()).await);

    first.stop().await;
    assert!(wait_for(TIMEOUT, || !client.is_connected()).await);

    let second = Transport::new(listen_config(port));
    second.start().await.unwrap();
    assert!(wait_for(TIMEOUT, || client.is_connected() && second.is_connected()).await);

    assert!(client.send_frame(&Frame::pong()).await);
    assert_eq!(second.recv_frame(TIMEOUT).await, Some(Frame::pong()));

    client.stop().await;
    second.stop().await;
}

#[tokio::test]
async fn test_unreachable_peer_keeps_trying() {
    let port = free_port().await;
    let client = Transport::new(dial_config(port));
    client.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!client.is_connected());
    assert_ne!(client.state(), ConnectionState::Connected);
    assert!(!client.send_frame(&Frame::ping()).await);

    client.stop().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_idle_transport() {
    let transport = Transport::new(TransportConfig::default());
    transport.start().await.unwrap();
    assert!(transport.local_addr().is_none());
    assert_eq!(transport.recv_frame(Duration::from_millis(20)).await, None);
    transport.stop().await;
}
