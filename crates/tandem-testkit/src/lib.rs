//! # Tandem Testkit
//!
//! Testing utilities for tandem.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known checksums and edit sessions with expected outputs
//! - **Generators**: Proptest strategies for edit scripts and frames
//! - **Fixtures**: Temporary oplogs, free ports, connected transport pairs
//!
//! ## Golden Vectors
//!
//! ```rust
//! use tandem_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, detail) in verify_all_vectors() {
//!     assert!(ok, "{name}: {detail}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use tandem_testkit::generators::{edit_script, run_script};
//!
//! proptest! {
//!     #[test]
//!     fn replay_is_deterministic(script in edit_script(32)) {
//!         let (a, _) = run_script(&script);
//!         let (b, _) = run_script(&script);
//!         prop_assert_eq!(a.checksum(), b.checksum());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use tandem_store::OpLog;
//! use tandem_testkit::fixtures::OplogFixture;
//!
//! let fixture = OplogFixture::new();
//! let doc = fixture.write_random_session(42, 20);
//! assert_eq!(fixture.log().replay_verified().unwrap().content(), doc.content());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    connected_pair, dial_config, fast_backoff, free_port, listen_config, random_session, wait_for,
    OplogFixture,
};
pub use generators::{edit_script, run_script, EditStep};
pub use vectors::{all_vectors, session_vectors, verify_all_vectors, GoldenVector, SessionVector};
