//! # Basalt Test Suite
//!
//! Unified test crate exercising the FFI boundary end to end against mock
//! hosts written in Rust.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── mocks.rs          # Mock Db/bank/querier vtables (Go stand-ins)
//! ├── fixtures.rs       # Sample modules, scripts, and messages
//! └── integration/      # Boundary scenarios
//!     ├── boundary.rs   # Entry points, callbacks, error taxonomies
//!     └── buffers.rs    # Owned-buffer lifecycle through the exports
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p basalt-tests
//! ```

pub mod fixtures;
pub mod integration;
pub mod mocks;
