//! # Casino Gateway Test Suite
//!
//! Unified test crate containing cross-component tests:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── correlation.rs   # Registry concurrency properties
//!     └── flows.rs         # Initiator → registry → receiver round trips
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p casino-tests
//!
//! # By area
//! cargo test -p casino-tests integration::correlation::
//! cargo test -p casino-tests integration::flows::
//! ```

#![allow(dead_code)]

pub mod integration;
