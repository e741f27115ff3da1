//! Query interface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → handlers.rs
//!         GET /healthy-backends       → snapshot store (read only)
//!         GET /next-backend?service=  → round-robin selector (advances cursor)
//!         GET /status                 → snapshot ticks + refresh states
//!     → JSON response
//! ```
//!
//! # Design Decisions
//! - Handlers never wait on the snapshot engine
//! - Unknown service and empty snapshot are both 404 with an error body

pub mod handlers;
pub mod server;

pub use server::{AppState, QueryServer};
