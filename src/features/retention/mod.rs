//! Permanent removal of trashed files.
//!
//! No HTTP surface: the sweeper is spawned from `main` and runs on a timer.

pub mod workers;

pub use workers::RetentionSweeper;
