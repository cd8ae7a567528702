// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Unix ProcessControl
//! Real fork / waitpid / kill implementation backed by nix and libc

use super::signals;
use crate::domain::ports::{ExitKind, ForkOutcome, ProcessControl, ReapStatus};
use crate::domain::{PreforkError, Result, StopFlag};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use std::fs::OpenOptions;
use std::os::unix::io::AsRawFd;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct UnixProcessControl;

impl UnixProcessControl {
    pub fn new() -> Self {
        Self
    }

    /// Point stdin, stdout and stderr at /dev/null
    fn redirect_stdio() -> std::io::Result<()> {
        let null = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/null")?;
        let fd = null.as_raw_fd();

        for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
            // SAFETY: both descriptors are open for the duration of the call
            if unsafe { libc::dup2(fd, target) } == -1 {
                return Err(std::io::Error::last_os_error());
            }
        }
        Ok(())
    }
}

impl ProcessControl for UnixProcessControl {
    fn fork(&self) -> Result<ForkOutcome> {
        // SAFETY: the supervisor is single-threaded when it forks
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Parent { child }) => Ok(ForkOutcome::Parent {
                child: child.as_raw() as u32,
            }),
            Ok(ForkResult::Child) => Ok(ForkOutcome::Child),
            Err(e) => Err(PreforkError::Fork(e.to_string())),
        }
    }

    fn detach(&self) -> Result<ForkOutcome> {
        let outcome = self.fork().map_err(|e| PreforkError::Detach(e.to_string()))?;
        if let ForkOutcome::Child = outcome {
            unistd::setsid().map_err(|e| PreforkError::Detach(format!("setsid: {}", e)))?;
            Self::redirect_stdio()
                .map_err(|e| PreforkError::Detach(format!("redirect stdio: {}", e)))?;
            std::env::set_current_dir("/")
                .map_err(|e| PreforkError::Detach(format!("chdir /: {}", e)))?;
        }
        Ok(outcome)
    }

    fn reap(&self) -> Result<ReapStatus> {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(pid, code)) => Ok(ReapStatus::Reaped {
                pid: pid.as_raw() as u32,
                exit: ExitKind::Exited(code),
            }),
            Ok(WaitStatus::Signaled(pid, sig, _core_dumped)) => Ok(ReapStatus::Reaped {
                pid: pid.as_raw() as u32,
                exit: ExitKind::Signaled(sig as i32),
            }),
            Ok(_) => Ok(ReapStatus::NoneReady),
            Err(Errno::ECHILD) => Ok(ReapStatus::NoChildren),
            Err(Errno::EINTR) => Ok(ReapStatus::NoneReady),
            Err(e) => Err(PreforkError::Reap(e.to_string())),
        }
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        debug!(pid = pid, "Sending SIGTERM");
        signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(|e| {
            PreforkError::Signal {
                pid,
                reason: e.to_string(),
            }
        })
    }

    fn watch_termination(&self, flag: &StopFlag) -> Result<()> {
        signals::watch_termination(flag)
    }

    fn hold_termination(&self, held: bool) -> Result<()> {
        signals::hold_termination(held)
    }

    fn is_alive(&self, pid: u32) -> bool {
        if pid == 0 || pid > i32::MAX as u32 {
            return false;
        }
        match signal::kill(Pid::from_raw(pid as i32), None) {
            Ok(()) => true,
            Err(Errno::ESRCH) => false,
            // Exists but belongs to someone else
            Err(Errno::EPERM) => true,
            Err(e) => {
                warn!(pid = pid, error = %e, "Liveness probe failed");
                false
            }
        }
    }

    #[cfg(target_os = "linux")]
    fn set_title(&self, title: &str) {
        // The kernel keeps the first 15 bytes
        let Ok(name) = std::ffi::CString::new(title) else {
            return;
        };
        // SAFETY: `name` is NUL-terminated and outlives the call
        let result =
            unsafe { libc::prctl(libc::PR_SET_NAME, name.as_ptr() as libc::c_ulong, 0, 0, 0) };
        if result != 0 {
            debug!(
                title = title,
                error = %std::io::Error::last_os_error(),
                "Failed to set process title"
            );
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn set_title(&self, title: &str) {
        debug!(title = title, "Process titles not supported on this platform");
    }

    fn exit(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}
