//! Common test utilities and helpers for controller flow tests.
//!
//! This module provides shared functionality across integration tests:
//! - Test fixtures (poll budgets, datasets, sample results)
//! - Custom assertions over event streams

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
