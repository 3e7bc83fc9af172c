//! Shared test utilities for quizsync
//!
//! This crate provides fakes of the quiz server for testing without network
//! dependencies.
//!
//! # Fakes
//!
//! - [`MockQuizServer`] - wiremock-backed HTTP quiz server for gateway client tests
//! - [`ScriptedGateway`] - in-memory [`ServerGateway`](quizsync_gateway_client::ServerGateway)
//!   with a scriptable question index and call recording
//!
//! # Example
//!
//! ```rust,ignore
//! use quizsync_test_utils::ScriptedGateway;
//!
//! #[tokio::test]
//! async fn test_with_fake_server() {
//!     let gateway = ScriptedGateway::new();
//!     gateway.set_current_index(2);
//!
//!     // Hand `gateway.clone()` to the component under test
//! }
//! ```

mod gateway;
mod quiz_server;

pub use gateway::{GatewayCall, ScriptedGateway};
pub use quiz_server::{quiz_fixture, MockQuizServer};
