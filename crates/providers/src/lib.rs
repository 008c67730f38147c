//! Text-completion backends for taskmate.
//!
//! One chat-completions client covers hosted and local servers;
//! [`resolve`] builds it from configuration.

pub mod openai_compat;
pub mod resolve;

pub use openai_compat::OpenAiCompatProvider;
pub use resolve::resolve;
