//! Writer and reader replicas over loopback TCP.

use std::time::Duration;

use tandem::core::wire::encode_op;
use tandem::net::ConnectionState;
use tandem::{
    checksum, Checksum, Document, Frame, Inbound, MemoryOpLog, OpLog, Replica, ReplicaConfig,
    ReplicaError, Role,
};
use tandem_testkit::{dial_config, free_port, listen_config, wait_for, OplogFixture};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn pair() -> (Replica<MemoryOpLog>, Replica<MemoryOpLog>) {
    let port = free_port().await;
    let writer =
        Replica::with_oplog(Role::Writer, MemoryOpLog::new(), listen_config(port)).unwrap();
    let reader =
        Replica::with_oplog(Role::Reader, MemoryOpLog::new(), dial_config(port)).unwrap();
    writer.start().await.unwrap();
    reader.start().await.unwrap();
    assert!(
        wait_for(TIMEOUT, || writer.is_connected() && reader.is_connected()).await,
        "replicas did not connect"
    );
    (writer, reader)
}

/// Pump `replica` until `n` frames have been handled.
async fn receive(replica: &Replica<MemoryOpLog>, n: usize) -> Vec<Inbound> {
    let mut handled = Vec::new();
    while handled.len() < n {
        let frame = replica
            .transport()
            .recv_frame(TIMEOUT)
            .await
            .expect("frame did not arrive");
        handled.push(replica.handle_frame(frame).await.unwrap());
    }
    handled
}

#[tokio::test]
async fn test_writer_edits_reach_reader() {
    let (writer, reader) = pair().await;

    writer.insert(0, b"AB").await.unwrap();
    writer.insert(2, b"C").await.unwrap();
    writer.erase(1, 1).await.unwrap();

    let handled = receive(&reader, 3).await;
    assert!(handled.iter().all(|h| matches!(h, Inbound::Applied(_))));

    let doc = reader.snapshot().await;
    assert_eq!(doc.content(), b"AC");
    assert_eq!(doc.last_seq(), 3);
    assert_eq!(reader.checksum().await, writer.checksum().await);
    assert_eq!(reader.oplog().image(), writer.oplog().image());

    writer.stop().await;
    reader.stop().await;
}

#[tokio::test]
async fn test_hello_and_ping() {
    let (writer, reader) = pair().await;

    assert!(writer.greet().await);
    assert!(reader.ping().await);

    assert_eq!(receive(&reader, 1).await, vec![Inbound::Hello("writer".to_string())]);
    assert_eq!(receive(&writer, 1).await, vec![Inbound::Ping]);
    // The writer answered the ping.
    assert_eq!(receive(&reader, 1).await, vec![Inbound::Pong]);

    writer.stop().await;
    reader.stop().await;
}

#[tokio::test]
async fn test_pump_drains_in_order() {
    let (writer, reader) = pair().await;

    for line in ["one\n", "two\n", "three\n"] {
        writer.append(line.as_bytes()).await.unwrap();
    }
    assert!(wait_for(TIMEOUT, || reader.transport().pending_frames() == 3).await);

    let handled = reader.pump().await.unwrap();
    let seqs: Vec<u64> = handled
        .iter()
        .map(|h| match h {
            Inbound::Applied(op) => op.seq,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    assert_eq!(reader.snapshot().await.as_str(), Some("one\ntwo\nthree\n"));

    writer.stop().await;
    reader.stop().await;
}

#[tokio::test]
async fn test_divergence_detected_over_the_wire() {
    let (writer, reader) = pair().await;

    let mut op = Document::new().make_insert(0, b"abc").unwrap();
    op.checksum = Checksum(op.checksum.value().wrapping_add(1));
    assert!(writer.transport().send_frame(&Frame::op(encode_op(&op).unwrap())).await);

    let frame = reader.transport().recv_frame(TIMEOUT).await.unwrap();
    let err = reader.handle_frame(frame).await.unwrap_err();
    match err {
        ReplicaError::Divergence { seq, actual, .. } => {
            assert_eq!(seq, 1);
            assert_eq!(actual, checksum(b"abc"));
        }
        other => panic!("expected divergence, got {other:?}"),
    }
    assert!(reader.snapshot().await.is_empty());
    assert!(reader.oplog().load().unwrap().is_empty());

    writer.stop().await;
    reader.stop().await;
}

#[tokio::test]
async fn test_edits_while_disconnected_stay_local() {
    let fixture = OplogFixture::new();
    let config = ReplicaConfig::new(Role::Writer)
        .with_oplog_path(fixture.path())
        .with_transport(dial_config(free_port().await));
    let writer = Replica::open(config.clone()).unwrap();
    writer.start().await.unwrap();
    assert_ne!(writer.connection_state(), ConnectionState::Connected);

    writer.insert(0, b"offline").await.unwrap();
    writer.stop().await;

    // Reopening replays what was written.
    let reopened = Replica::open(config).unwrap();
    assert_eq!(reopened.snapshot().await.content(), b"offline");
    assert_eq!(reopened.snapshot().await.next_seq(), 2);
}
