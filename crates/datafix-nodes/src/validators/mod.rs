//! Validator nodes
//!
//! Nodes whose operation checks one collected item and fails when the item
//! is invalid.

mod not_empty;
mod path_is_file;
mod string_prefix;

pub use not_empty::NotEmpty;
pub use path_is_file::PathIsFile;
pub use string_prefix::StringPrefix;
