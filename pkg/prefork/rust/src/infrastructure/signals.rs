// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Termination signal plumbing
//!
//! A signal handler cannot reach instance data, so the token it raises is
//! published through a process-global pointer. Each process (controller and
//! every worker) points it at its own `StopFlag` cell; after `fork` the child
//! still sees the parent's pointer until it installs its own, which is why
//! SIGTERM stays blocked across `fork`.

use crate::domain::value_objects::raise_state;
use crate::domain::{PreforkError, Result, StopFlag};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::Arc;
use std::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

static TERMINATION_TOKEN: AtomicPtr<AtomicU8> = AtomicPtr::new(std::ptr::null_mut());

extern "C" fn on_termination(_signal: libc::c_int) {
    let cell = TERMINATION_TOKEN.load(Ordering::SeqCst);
    if !cell.is_null() {
        // SAFETY: the pointer comes from Arc::into_raw and is never released
        unsafe {
            raise_state(&*cell);
        }
    }
}

/// Route SIGTERM in the calling process to `flag`.
///
/// The cell of a previously watched flag is intentionally leaked: a handler
/// running concurrently may still be reading it.
pub fn watch_termination(flag: &StopFlag) -> Result<()> {
    let cell = Arc::into_raw(flag.cell()) as *mut AtomicU8;
    TERMINATION_TOKEN.swap(cell, Ordering::SeqCst);

    let action = SigAction::new(
        SigHandler::Handler(on_termination),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler only performs atomic operations
    unsafe { signal::sigaction(Signal::SIGTERM, &action) }
        .map_err(|e| PreforkError::SignalHandler(format!("sigaction(SIGTERM): {}", e)))?;

    tracing::debug!(pid = std::process::id(), "SIGTERM handler installed");
    Ok(())
}

/// Block or unblock SIGTERM for the calling thread. A signal raised while
/// blocked stays pending and is delivered on unblock.
pub fn hold_termination(held: bool) -> Result<()> {
    let mut set = SigSet::empty();
    set.add(Signal::SIGTERM);

    let result = if held {
        set.thread_block()
    } else {
        set.thread_unblock()
    };
    result.map_err(|e| {
        PreforkError::SignalHandler(format!(
            "{} SIGTERM: {}",
            if held { "block" } else { "unblock" },
            e
        ))
    })
}
