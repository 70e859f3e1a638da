//! Syntax runtime: per-layer syntax trees kept current by an incremental
//! parse scheduler.
//!
//! Hosts build a [`scopeline_tokenizer::LanguageRegistry`], start one
//! [`SyntaxScheduler`] per open document, feed it edits, and consume the
//! [`SyntaxUpdates`] stream to apply highlighting.

pub mod config;
pub mod scheduler;
pub mod tree;

pub use config::{ConfigError, SchedulerCfg, ScopelineConfig};
pub use scheduler::{SchedulerError, SyntaxScheduler, SyntaxUpdate, SyntaxUpdates};
pub use tree::SyntaxTree;
