//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! next-backend request for a service
//!     → selector.rs (look up the service's cursor and current snapshot)
//!     → round_robin.rs (clamp cursor into range, read, advance)
//!     → address, or NoHealthyBackend / UnknownService
//! ```
//!
//! # Design Decisions
//! - Cursors live next to the selector, one per configured service
//! - The cursor is an offset, not a pointer into a particular snapshot
//! - Cursor updates are a single atomic read-modify-write

pub mod round_robin;
pub mod selector;

pub use round_robin::RoundRobin;
pub use selector::{RoundRobinSelector, SelectError};
