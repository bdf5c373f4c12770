//! docqa Core Library
//!
//! This crate provides the foundational utilities shared by the docqa crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Lazy, single-flight loading of heavy resources

pub mod config;
pub mod error;
pub mod lazy;
pub mod logging;

// Re-export commonly used types
pub use config::{AnswerStrategyKind, AppConfig};
pub use error::{AppError, AppResult};
pub use lazy::{LazyResource, LoadState};
