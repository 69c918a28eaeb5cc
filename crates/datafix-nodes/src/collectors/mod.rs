//! Collector nodes
//!
//! Nodes whose operation returns a list of items. Each item becomes a data
//! node under the collector.

mod current_time;
mod literal_items;
mod paths_in_folder;

pub use current_time::CurrentTime;
pub use literal_items::LiteralItems;
pub use paths_in_folder::PathsInFolder;
