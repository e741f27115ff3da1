//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (engine.rs)
//!     → discovery: candidates for each service
//!     → drop candidates not in a ready phase
//!     → probe.rs: bounded-concurrency fan-out, fan-in in discovery order
//!     → snapshot store: atomic publish, empty included
//!     → tick notification (watch channel) for the registry reconciler
//!
//! State machine (state.rs), per service:
//!     Idle → Discovering → Probing → Publishing → Idle
//! ```
//!
//! # Design Decisions
//! - Every tick republishes every service; a previous result is never held over
//! - A failure in one service's pipeline never touches another service
//! - Ticks never overlap; an overrunning tick causes the next one to be skipped

pub mod engine;
pub mod probe;
pub mod state;

pub use engine::{ServiceOutcome, ServiceReport, SnapshotEngine, TickReport};
pub use probe::{HttpProbe, Probe, ProbeOutcome};
pub use state::{ServiceStates, TickState};
