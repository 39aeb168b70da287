//! # album-scan CLI
//!
//! Command-line interface for the album scanner.
//!
//! ## Usage
//! ```bash
//! album-scan scan ~/Photos --owner 1
//! album-scan scan ~/Photos --owner 1 --db albums.db --output json
//! ```

mod cli;

use album_scanner::Result;

fn main() -> Result<()> {
    cli::run()
}
