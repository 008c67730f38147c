//! # taskmate Core
//!
//! Domain types, traits, and error definitions for the taskmate
//! conversational task assistant. Everything else in the workspace depends
//! inward on this crate.
//!
//! ## Design Philosophy
//!
//! The two external seams of the assistant are defined as traits here:
//! - [`Provider`]: the text-completion service used as intent classifier
//!   and task extractor
//! - [`Channel`]: a messaging surface that delivers user text and carries
//!   replies back
//!
//! Implementations live in `taskmate-providers` and `taskmate-channels`,
//! which keeps the session logic testable with scripted stand-ins.

pub mod channel;
pub mod error;
pub mod message;
pub mod provider;
pub mod task;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChannelId, ChannelMessage};
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use task::TaskRecord;
