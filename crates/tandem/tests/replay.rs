//! Oplog replay against real files.

use rand::rngs::StdRng;
use rand::SeedableRng;

use tandem::core::record::encode_record;
use tandem::store::{append_to_oplog, load_oplog, replay_from_log, StoreError};
use tandem::{checksum, Document, OpLog};
use tandem_testkit::{random_session, OplogFixture};

#[test]
fn test_replay_concrete_scenario() {
    let fixture = OplogFixture::new();
    let mut doc = Document::new();

    for op in [
        doc.make_insert(0, b"AB").unwrap(),
        doc.make_insert(2, b"C").unwrap(),
        doc.make_erase(1, 1).unwrap(),
    ] {
        append_to_oplog(fixture.path(), &op).unwrap();
    }

    let replayed = replay_from_log(fixture.path()).unwrap();
    assert_eq!(replayed.content(), b"AC");
    assert_eq!(replayed.checksum(), checksum(b"AC"));
    assert_eq!(replayed.next_seq(), 4);

    let ops = load_oplog(fixture.path()).unwrap();
    assert_eq!(ops.iter().map(|op| op.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn test_seeded_session_replays_to_same_checksum() {
    let fixture = OplogFixture::new();
    let mut rng = StdRng::seed_from_u64(42);
    let doc = random_session(&mut rng, 20, &fixture.log());

    let replayed = fixture.log().replay_verified().unwrap();
    assert_eq!(replayed.content(), doc.content());
    assert_eq!(replayed.checksum(), doc.checksum());
    assert_eq!(replayed.last_seq(), 20);
}

#[test]
fn test_missing_log_is_empty_document() {
    let fixture = OplogFixture::new();
    let doc = replay_from_log(fixture.dir().join("never-written.log")).unwrap();
    assert!(doc.is_empty());
    assert_eq!(doc.next_seq(), 1);
}

#[test]
fn test_text_with_delimiters_persists() {
    let fixture = OplogFixture::new();
    let log = fixture.log();
    let mut doc = Document::new();
    log.append(&doc.make_insert(0, b"a|b|c\nnext line\r\n\\").unwrap()).unwrap();
    log.append(&doc.make_replace(1, 1, b"||").unwrap()).unwrap();

    // One physical line per op.
    assert_eq!(fixture.raw().iter().filter(|&&b| b == b'\n').count(), 2);

    let replayed = log.replay_verified().unwrap();
    assert_eq!(replayed.content(), doc.content());
}

#[test]
fn test_verified_replay_reports_divergent_line() {
    let fixture = OplogFixture::new();
    let log = fixture.log();
    let mut doc = Document::new();
    log.append(&doc.make_insert(0, b"abc").unwrap()).unwrap();

    let mut tampered = doc.make_insert(3, b"d").unwrap();
    tampered.checksum = checksum(b"something else");
    log.append(&tampered).unwrap();

    // Unverified replay still applies the bytes.
    assert_eq!(log.replay().unwrap().content(), b"abcd");

    match log.replay_verified() {
        Err(StoreError::Replay { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected replay error, got {other:?}"),
    }
}

#[test]
fn test_corrupt_line_is_reported() {
    let fixture = OplogFixture::new();
    let mut doc = Document::new();
    let mut image = encode_record(&doc.make_insert(0, b"ok").unwrap());
    image.extend_from_slice(b"2|1|0|0|missing checksum\n");
    std::fs::write(fixture.path(), &image).unwrap();

    match load_oplog(fixture.path()) {
        Err(StoreError::Corrupt { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected corrupt error, got {other:?}"),
    }
}
