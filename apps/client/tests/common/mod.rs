//! Common test utilities for client integration tests
//!
//! This module provides a scripted push transport and session fixtures shared
//! by the connection and session tests.

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
