//! Persistence boundary for taskmate.
//!
//! Sessions are mirrored to plain JSON files under one data directory:
//! whole-file pretty-printed JSON for live state and append-only JSON
//! lines for audit logs. Writes are overwrites, not transactional; a crash
//! mid-write can leave a truncated file behind.

pub mod json_file;
pub mod layout;

pub use json_file::{append_line, ensure_exists, load, save};
pub use layout::{FileLayout, SessionFiles, encode_identity};
