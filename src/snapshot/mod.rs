//! Published health snapshots.
//!
//! # Data Flow
//! ```text
//! health::engine (one writer per service per tick)
//!     → store.rs publish (atomic Arc swap of the whole snapshot)
//!
//! Readers (any number, concurrently):
//!     → load_balancer::selector (round robin)
//!     → http handlers (healthy-backends listing)
//!     → registry::reconciler (push to routing registry)
//! ```
//!
//! # Design Decisions
//! - One slot per configured service, created at startup; the key set never changes
//! - A slot is either empty (never probed) or holds one complete probing pass
//! - Readers get an `Arc` to an immutable snapshot, never a view into a mutating list

pub mod store;

pub use store::{HealthSnapshot, SnapshotStore};
