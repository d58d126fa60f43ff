//! CLI command handlers, one file per command.

mod completions;
mod download;
mod list;

pub use completions::{run_completions, run_man};
pub use download::{run_download, DownloadArgs};
pub use list::run_list;
