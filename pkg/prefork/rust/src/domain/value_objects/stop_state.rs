// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! StopState value object
//! Represents where a supervised process is in the cooperative stop protocol

use std::fmt;

/// Lifecycle of a controller or worker process with respect to termination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum StopState {
    /// Normal operation, new work may be started
    #[default]
    Running = 0,

    /// Termination requested; the in-flight unit of work is allowed to finish
    Draining = 1,

    /// Process is exiting
    Stopped = 2,
}

impl StopState {
    /// Check if termination has been requested
    pub fn is_stopping(&self) -> bool {
        matches!(self, StopState::Draining | StopState::Stopped)
    }

    /// Validate state transition. The protocol only ever moves forward.
    pub fn can_transition_to(&self, new_state: StopState) -> bool {
        use StopState::*;

        match (self, new_state) {
            (Running, Draining) => true,
            (Draining, Stopped) => true,
            // A process may exit before termination was requested (e.g. fatal error)
            (Running, Stopped) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => StopState::Running,
            1 => StopState::Draining,
            _ => StopState::Stopped,
        }
    }
}

impl fmt::Display for StopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopState::Running => write!(f, "running"),
            StopState::Draining => write!(f, "draining"),
            StopState::Stopped => write!(f, "stopped"),
        }
    }
}
