//! Cross-crate integration scenarios.

mod daemon_lifecycle;
mod filter_files;
mod level_scenarios;
