//! The tool-calling protocol surface: JSON-RPC 2.0 over stdio or
//! Server-Sent Events, both dispatching through the same tool catalog
//! into a [`marcus_core::Coordinator`].
//!
//! - [`tools`]: the tool schema catalog and the `(name, arguments) ->
//!   result` dispatcher.
//! - [`dispatch`]: transport-agnostic JSON-RPC envelope handling shared
//!   by both transports.
//! - [`stdio`]: newline-delimited JSON-RPC over a reader/writer pair.
//! - [`server`]: the SSE transport's axum router.
//! - [`auth`]: the SSE bearer-token allow-list.
//! - [`serialization`]: JSON-RPC envelope helpers and the MCP-facing
//!   field mapping for core domain types.
//! - [`error`]: the protocol-layer error taxonomy.
//! - [`request_logger`]: structured single-line request logging
//!   middleware for the SSE router.
//!
//! # Usage
//!
//! ```no_run
//! use mcp_protocol::server;
//! use mcp_protocol::auth::BearerAuth;
//! use marcus_core::{ai::NullAiAdapter, Coordinator};
//! use database::{InMemoryProvider, JsonAssignmentStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn start_server() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = Arc::new(Coordinator::new(
//!     Arc::new(InMemoryProvider::new()),
//!     Arc::new(JsonAssignmentStore::new("data/assignments.json")),
//!     Arc::new(NullAiAdapter),
//!     Duration::from_secs(10),
//!     chrono::Duration::hours(24),
//! ));
//! let app = server::router(coordinator, BearerAuth::disabled());
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod dispatch;
pub mod error;
pub mod request_logger;
pub mod serialization;
pub mod server;
pub mod stdio;
pub mod tools;

pub use error::McpError;
