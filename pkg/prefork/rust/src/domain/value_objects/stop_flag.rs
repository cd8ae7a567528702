// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! StopFlag value object
//!
//! Per-process cancellation token. The controller and every worker each own
//! one; nothing is shared across processes. The token is raised exactly once
//! (Running -> Draining) and finished once at exit (Draining -> Stopped).
//!
//! Runners receive a `&StopFlag` and may poll [`StopFlag::is_stopped`] to cut
//! long work short. Raising the flag never interrupts a runner that is
//! already executing.

use super::StopState;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    state: Arc<AtomicU8>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once termination has been requested in this process
    pub fn is_stopped(&self) -> bool {
        self.state().is_stopping()
    }

    pub fn state(&self) -> StopState {
        StopState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Request termination. Returns true only for the call that performed
    /// the Running -> Draining transition.
    pub fn raise(&self) -> bool {
        raise_state(&self.state)
    }

    /// Mark the owning process as exiting
    pub fn finish(&self) {
        self.state.store(StopState::Stopped as u8, Ordering::SeqCst);
    }

    /// Shared cell used by the signal handler to raise this token
    pub(crate) fn cell(&self) -> Arc<AtomicU8> {
        Arc::clone(&self.state)
    }
}

/// Running -> Draining on the raw cell. Only atomic operations, so this is
/// safe to call from a signal handler.
pub(crate) fn raise_state(cell: &AtomicU8) -> bool {
    cell.compare_exchange(
        StopState::Running as u8,
        StopState::Draining as u8,
        Ordering::SeqCst,
        Ordering::SeqCst,
    )
    .is_ok()
}
