//! Golden test vectors for deterministic verification.
//!
//! Two replicas agree only if they compute the same checksum over the
//! same bytes, so the checksum is pinned against published CRC-32
//! values. Session vectors pin the result of short edit sequences.

use tandem_core::{checksum, Document, Op};

/// A golden checksum vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Input bytes.
    pub input: &'static [u8],
    /// Expected checksum, big-endian hex.
    pub expected_checksum: &'static str,
}

/// A golden edit session.
#[derive(Debug, Clone)]
pub struct SessionVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Ops to apply in order, unsequenced.
    pub ops: Vec<Op>,
    /// Expected final content.
    pub expected_content: &'static [u8],
}

/// Get all golden checksum vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "empty input",
            input: b"",
            expected_checksum: "00000000",
        },
        GoldenVector {
            name: "single byte",
            input: b"a",
            expected_checksum: "e8b7be43",
        },
        GoldenVector {
            name: "short ascii",
            input: b"abc",
            expected_checksum: "352441c2",
        },
        GoldenVector {
            name: "check value",
            input: b"123456789",
            expected_checksum: "cbf43926",
        },
        GoldenVector {
            name: "pangram",
            input: b"The quick brown fox jumps over the lazy dog",
            expected_checksum: "414fa339",
        },
    ]
}

/// Get all golden edit sessions.
pub fn session_vectors() -> Vec<SessionVector> {
    vec![
        SessionVector {
            name: "insert, append, erase middle",
            ops: vec![Op::insert(0, "AB"), Op::insert(2, "C"), Op::erase(1, 1)],
            expected_content: b"AC",
        },
        SessionVector {
            name: "replace grows and shrinks",
            ops: vec![
                Op::insert(0, "hello world"),
                Op::replace(6, 5, "there"),
                Op::replace(0, 5, "hi"),
            ],
            expected_content: b"hi there",
        },
        SessionVector {
            name: "delimiters in text",
            ops: vec![Op::insert(0, "a|b"), Op::insert(3, "\n"), Op::insert(0, "\\")],
            expected_content: b"\\a|b\n",
        },
        SessionVector {
            name: "erase everything",
            ops: vec![Op::insert(0, "gone"), Op::erase(0, 4)],
            expected_content: b"",
        },
    ]
}

/// Hex form of a checksum as used by the vectors.
pub fn checksum_hex(data: &[u8]) -> String {
    hex::encode(checksum(data).value().to_be_bytes())
}

/// Run a session vector on a fresh document.
pub fn run_session(vector: &SessionVector) -> Result<Document, tandem_core::OpError> {
    let mut doc = Document::new();
    for op in &vector.ops {
        doc.apply(op)?;
    }
    Ok(doc)
}

/// Verify every vector, returning (name, passed, detail) triples.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results = Vec::new();

    for vector in all_vectors() {
        let actual = checksum_hex(vector.input);
        let passed = actual == vector.expected_checksum;
        results.push((
            vector.name.to_string(),
            passed,
            format!("expected {} got {}", vector.expected_checksum, actual),
        ));
    }

    for vector in session_vectors() {
        let (passed, detail) = match run_session(&vector) {
            Ok(doc) => (
                doc.content() == vector.expected_content
                    && doc.last_seq() == vector.ops.len() as u64,
                format!(
                    "content {:?} after {} ops",
                    String::from_utf8_lossy(doc.content()),
                    doc.last_seq()
                ),
            ),
            Err(e) => (false, format!("rejected: {e}")),
        };
        results.push((vector.name.to_string(), passed, detail));
    }

    results
}
