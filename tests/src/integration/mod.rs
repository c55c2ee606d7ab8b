//! # Boundary Integration Tests

pub mod boundary;
pub mod buffers;
