//! Output formatting for CLI.

mod json;
mod progress;

pub use json::{FrameRecord, JsonOutput};
pub use progress::ProgressBar;
