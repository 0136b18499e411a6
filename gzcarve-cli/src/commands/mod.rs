//! Command implementations for the gzcarve CLI.

pub mod extract;
pub mod list;

pub use extract::{ExtractOptions, cmd_extract};
pub use list::{ListOptions, cmd_list};
