//! Core value types shared by the grammar, tokenizer and syntax crates.

/// Text edit notifications.
pub mod edit;
/// Scoped syntax nodes produced by tokenization.
pub mod node;
/// Byte range helpers.
pub mod range;
/// Line arithmetic over ropes and string slices.
pub mod rope;
/// Namespaced scope names.
pub mod scope;

pub use edit::TextEdit;
pub use node::{SyntaxNode, pretty_print_nodes};
pub use range::{ByteIdx, ByteRange, ByteRangeExt, shift_offset};
pub use ropey::{Rope, RopeSlice};
pub use scope::Scope;
