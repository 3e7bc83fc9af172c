//! Quiz server gateway for quizsync
//!
//! This crate defines the [`ServerGateway`] contract the quiz client depends
//! on and an HTTP implementation, [`GatewayClient`], for the quiz server:
//! - Session join and authoritative question index
//! - Answer and score submission
//! - Rank and leaderboard lookups
//!
//! # Example
//!
//! ```rust,no_run
//! use quizsync_gateway_client::{GatewayClient, ServerGateway};
//! use quizsync_shared_config::ApiConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GatewayClient::new(&ApiConfig::default())?;
//!
//! client.join_session(1234, "QUIZ42").await?;
//! let index = client.current_question_index().await?;
//! println!("server is on question {}", index);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod gateway;
mod models;

pub use client::GatewayClient;
pub use error::{GatewayError, GatewayResult};
pub use gateway::ServerGateway;
pub use models::{LeaderboardEntry, Question, QuestionId, Quiz};
