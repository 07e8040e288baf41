//! # media-organize CLI
//!
//! Command-line interface for the media organizer.
//!
//! ## Usage
//! ```bash
//! media-organize run ~/Inbox --dest ~/Archive
//! media-organize sessions ~/Archive
//! media-organize undo 20240115-093000123 ~/Archive
//! ```

mod cli;

use media_organizer::Result;

fn main() -> Result<()> {
    cli::run()
}
