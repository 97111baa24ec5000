//! # DLT Daemon Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Filter and readiness table benchmarks
//! └── src/integration/  # Cross-crate scenarios
//!     ├── level_scenarios.rs   # Level changes against live connections
//!     ├── daemon_lifecycle.rs  # Full daemon over real sockets
//!     └── filter_files.rs      # TOML filter configurations
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dlt-tests
//! cargo bench -p dlt-tests
//! ```

pub mod integration;
