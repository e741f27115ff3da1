//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build engine/selector/reconciler → Start tasks
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → engine, reconciler and server loops exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast at startup: a bad config is fatal
//! - Nothing after startup is fatal; per-tick errors are logged and retried

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{start, start_from_config, Mode, Running, StartupError};
