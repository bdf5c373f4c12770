//! Command handlers for the docqa CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod chunks;
pub mod document;
pub mod search;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use chunks::ChunksCommand;
pub use search::SearchCommand;
