//! Oplog line encoding.
//!
//! One op per line, fields separated by `|`:
//!
//! ```text
//! seq|kind|pos|len|text|checksum\n
//! ```
//!
//! `kind` is the numeric tag (1 insert, 2 erase, 3 replace) and `checksum`
//! is a decimal `u32`. The text field is escaped so it never contains the
//! delimiter or a line break:
//!
//! | byte | escape |
//! |------|--------|
//! | `\`  | `\\`   |
//! | `|`  | `\p`   |
//! | LF   | `\n`   |
//! | CR   | `\r`   |
//!
//! All other bytes are written unchanged, so the text may be arbitrary
//! binary content.

use crate::checksum::Checksum;
use crate::error::{CoreError, Result};
use crate::op::{Op, OpKind};

/// Field separator.
pub const DELIMITER: u8 = b'|';

const FIELD_COUNT: usize = 6;

/// Encode an op as one newline-terminated line.
pub fn encode_record(op: &Op) -> Vec<u8> {
    let mut line = Vec::with_capacity(48 + op.text.len());
    line.extend_from_slice(
        format!("{}|{}|{}|{}|", op.seq, op.kind.as_u8(), op.pos, op.len).as_bytes(),
    );
    escape_into(&op.text, &mut line);
    line.push(DELIMITER);
    line.extend_from_slice(op.checksum.value().to_string().as_bytes());
    line.push(b'\n');
    line
}

/// Decode one line (with or without its trailing newline).
pub fn decode_record(line: &[u8]) -> Result<Op> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    let fields: Vec<&[u8]> = line.split(|&b| b == DELIMITER).collect();
    if fields.len() != FIELD_COUNT {
        return Err(CoreError::MalformedRecord(format!(
            "expected {FIELD_COUNT} fields, found {}",
            fields.len()
        )));
    }

    let seq: u64 = parse_number(fields[0], "seq")?;
    let kind_tag: u8 = parse_number(fields[1], "kind")?;
    let kind = OpKind::try_from(kind_tag)?;
    let pos: u32 = parse_number(fields[2], "pos")?;
    let len: u32 = parse_number(fields[3], "len")?;
    let text = unescape(fields[4])?;
    let checksum: u32 = parse_number(fields[5], "checksum")?;

    Ok(Op {
        seq,
        kind,
        pos,
        len,
        text,
        checksum: Checksum(checksum),
    })
}

fn parse_number<T: std::str::FromStr>(field: &[u8], name: &str) -> Result<T> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            CoreError::MalformedRecord(format!(
                "invalid {name}: {:?}",
                String::from_utf8_lossy(field)
            ))
        })
}

/// Append the escaped form of `text` to `out`.
pub fn escape_into(text: &[u8], out: &mut Vec<u8>) {
    for &b in text {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'|' => out.extend_from_slice(b"\\p"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            other => out.push(other),
        }
    }
}

/// Reverse [`escape_into`].
pub fn unescape(field: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(field.len());
    let mut bytes = field.iter();
    while let Some(&b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(b'\\') => out.push(b'\\'),
            Some(b'p') => out.push(b'|'),
            Some(b'n') => out.push(b'\n'),
            Some(b'r') => out.push(b'\r'),
            Some(&other) => {
                return Err(CoreError::MalformedRecord(format!(
                    "unknown escape \\{}",
                    other as char
                )))
            }
            None => {
                return Err(CoreError::MalformedRecord(
                    "dangling escape at end of text".into(),
                ))
            }
        }
    }
    Ok(out)
}
