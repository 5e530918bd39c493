//! Common test utilities and helpers
//!
//! This module provides shared test infrastructure including:
//! - Test fixtures
//! - A mock remote RPC API

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
