//! # logspool
//!
//! logspool drains a byte stream into append-only log files. Every chunk read
//! from the input becomes one record, `<DD-MM-YYYY HH:MM:SS> <tag> <payload>`,
//! and output moves on to a new file when the current one already exists or
//! reaches its size limit. Files are never overwritten: each one is created
//! exclusively, so a second run against the same path continues in
//! `path.0`, `path.1`, and so on.
//!
//! In deluxe mode, multi-line payloads are re-indented so their continuation
//! lines align under the first one.
//!
//! ## Example
//!
//! ```rust,no_run
//! use logspool::{ConfigBuilder, FormatMode, Roller};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigBuilder::new("./logs/app.log")
//!         .tag("app")
//!         .max_size(1024 * 1024) // Rotate after 1 MiB
//!         .mode(FormatMode::Deluxe)
//!         .build()?;
//!
//!     let summary = Roller::new(&config, std::io::stdin().lock()).run()?;
//!     println!("wrote {} records to {} files", summary.records, summary.files.len());
//!     Ok(())
//! }
//! ```
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod roller;
pub mod session;

pub use {
    config::{Config, ConfigBuilder, FormatMode, TimeZone},
    error::RollError,
    roller::{Roller, RunSummary},
    session::{Outcome, SessionReport},
};
