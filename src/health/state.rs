//! Per-service refresh state machine.
//!
//! # States
//! ```text
//! Idle → Discovering → Probing → Publishing → Idle
//! ```
//! A failed discovery goes straight to Publishing (an empty snapshot).
//!
//! # Design Decisions
//! - One state per configured service, stored as an atomic byte
//! - State changes logged at trace level; readers only observe, never drive

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use serde::Serialize;

/// Where a service is in its refresh cycle.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickState {
    Idle = 0,
    Discovering = 1,
    Probing = 2,
    Publishing = 3,
}

impl From<u8> for TickState {
    fn from(val: u8) -> Self {
        match val {
            1 => TickState::Discovering,
            2 => TickState::Probing,
            3 => TickState::Publishing,
            _ => TickState::Idle,
        }
    }
}

/// Refresh state for every configured service.
#[derive(Debug, Default)]
pub struct ServiceStates {
    states: HashMap<String, AtomicU8>,
}

impl ServiceStates {
    pub fn new<'a>(services: impl IntoIterator<Item = &'a str>) -> Self {
        let states = services
            .into_iter()
            .map(|name| (name.to_string(), AtomicU8::new(TickState::Idle as u8)))
            .collect();
        Self { states }
    }

    pub fn get(&self, service: &str) -> Option<TickState> {
        self.states
            .get(service)
            .map(|s| TickState::from(s.load(Ordering::Acquire)))
    }

    pub(crate) fn set(&self, service: &str, state: TickState) {
        if let Some(s) = self.states.get(service) {
            let prev = TickState::from(s.swap(state as u8, Ordering::AcqRel));
            tracing::trace!(service = %service, from = ?prev, to = ?state, "Refresh state change");
        }
    }
}
