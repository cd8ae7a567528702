// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! ProcessControl port
//! Interface for forking, reaping and signalling OS processes

use crate::domain::{Result, StopFlag};

/// Which side of a fork the caller ended up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkOutcome {
    /// Still the original process; `child` is the new process id
    Parent { child: u32 },
    /// Running inside the newly created process
    Child,
}

/// How a reaped child terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Exited(i32),
    Signaled(i32),
}

/// Result of one non-blocking reap attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapStatus {
    /// A child finished and has been collected
    Reaped { pid: u32, exit: ExitKind },
    /// Children exist but none has finished
    NoneReady,
    /// The caller has no children at all
    NoChildren,
}

/// Port for process-level operations.
///
/// The controller only reaches the OS through this trait so the supervision
/// loop can be driven by a scripted implementation in tests.
pub trait ProcessControl {
    /// Fork the current process
    fn fork(&self) -> Result<ForkOutcome>;

    /// Fork into the background and, on the child side, become a session
    /// leader detached from the controlling terminal
    fn detach(&self) -> Result<ForkOutcome>;

    /// Collect one finished child without blocking
    fn reap(&self) -> Result<ReapStatus>;

    /// Send the termination signal to `pid`
    fn terminate(&self, pid: u32) -> Result<()>;

    /// Route the termination signal of the calling process to `flag`
    fn watch_termination(&self, flag: &StopFlag) -> Result<()>;

    /// Block (`true`) or unblock (`false`) delivery of the termination signal.
    /// Held across fork so a fresh worker never sees the controller's token.
    fn hold_termination(&self, held: bool) -> Result<()>;

    /// Zero-signal liveness probe, no side effects on the target
    fn is_alive(&self, pid: u32) -> bool;

    /// Id of the calling process
    fn current_pid(&self) -> u32 {
        std::process::id()
    }

    /// Update the display name of the calling process (best effort)
    fn set_title(&self, title: &str);

    /// Terminate the calling process immediately
    fn exit(&self, code: i32) -> !;
}
