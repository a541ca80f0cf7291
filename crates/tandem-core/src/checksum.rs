//! CRC-32 (IEEE 802.3, reflected) over document content.
//!
//! The lookup table is built at compile time, so there is no lazy
//! initialization to race on.

use serde::{Deserialize, Serialize};
use std::fmt;

const POLYNOMIAL: u32 = 0xEDB8_8320;

static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut bit = 0;
        while bit < 8 {
            c = if c & 1 != 0 {
                POLYNOMIAL ^ (c >> 1)
            } else {
                c >> 1
            };
            bit += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// A CRC-32 value stamped on every applied op.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Checksum(pub u32);

impl Checksum {
    /// Checksum of the empty byte sequence.
    pub const EMPTY: Self = Self(0);

    /// Compute the checksum of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let mut c = 0xFFFF_FFFFu32;
        for &byte in data {
            c = TABLE[((c ^ byte as u32) & 0xFF) as usize] ^ (c >> 8);
        }
        Self(c ^ 0xFFFF_FFFF)
    }

    /// Get the raw value.
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({:08x})", self.0)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u32> for Checksum {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Compute the checksum of `data`.
pub fn checksum(data: &[u8]) -> Checksum {
    Checksum::compute(data)
}
