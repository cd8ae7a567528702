// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Controller Service
//!
//! Owns the pool of worker processes:
//! - forks workers until the pool reaches its target size
//! - reaps finished workers without blocking and lets the next iteration
//!   replace them
//! - on termination, signals every tracked worker, waits a bounded grace
//!   period for them to drain and removes the pid file
//!
//! The registry of worker pids lives only in the controller process and is
//! only mutated from inside the loop.

use super::pid_file::PidFile;
use super::worker::{capture_panic_locations, panic_message, Worker};
use crate::constants::{exit, supervision};
use crate::domain::ports::{ExitKind, ForkOutcome, LoggerPort, ProcessControl, ReapStatus};
use crate::domain::{DaemonConfig, LogContext, Result, RunnerRegistry, StopFlag};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

/// Bookkeeping for one live worker
#[derive(Debug, Clone, Copy)]
pub struct WorkerEntry {
    pub spawned_at: Instant,
}

/// Worker pid -> entry, owned by the controller
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    workers: BTreeMap<u32, WorkerEntry>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pid: u32) {
        self.workers.insert(
            pid,
            WorkerEntry {
                spawned_at: Instant::now(),
            },
        );
    }

    pub fn remove(&mut self, pid: u32) -> Option<WorkerEntry> {
        self.workers.remove(&pid)
    }

    pub fn clear(&mut self) {
        self.workers.clear();
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.workers.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn pids(&self) -> Vec<u32> {
        self.workers.keys().copied().collect()
    }
}

pub struct Controller<'a> {
    config: &'a DaemonConfig,
    runners: &'a RunnerRegistry,
    process: &'a dyn ProcessControl,
    logger: &'a dyn LoggerPort,
    pid_file: PidFile,
    stop: StopFlag,
    target: usize,
    workers: ProcessRegistry,
}

impl<'a> Controller<'a> {
    pub fn new(
        config: &'a DaemonConfig,
        runners: &'a RunnerRegistry,
        process: &'a dyn ProcessControl,
        logger: &'a dyn LoggerPort,
        stop: StopFlag,
        target: usize,
    ) -> Self {
        Self {
            config,
            runners,
            process,
            logger,
            pid_file: PidFile::new(config.pid_file()),
            stop,
            target,
            workers: ProcessRegistry::new(),
        }
    }

    pub fn workers(&self) -> &ProcessRegistry {
        &self.workers
    }

    /// Supervise until the stop flag is raised, then shut the pool down.
    /// Returns the exit status for the controller process.
    pub fn run(&mut self) -> i32 {
        self.logger.info(
            "Controller started",
            &LogContext::new()
                .with("workers", self.target)
                .with("runners", self.runners.names()),
        );

        while !self.stop.is_stopped() {
            let busy = match panic::catch_unwind(AssertUnwindSafe(|| self.tick())) {
                Ok(Ok(busy)) => busy,
                Ok(Err(e)) => {
                    self.logger.error(
                        "Supervision loop iteration failed",
                        &LogContext::new().with("error", e.to_string()),
                    );
                    false
                }
                Err(payload) => {
                    self.logger.error(
                        "Supervision loop iteration panicked",
                        &LogContext::new().with("error", panic_message(payload.as_ref())),
                    );
                    false
                }
            };

            if !busy && !self.stop.is_stopped() && !self.config.reap_interval().is_zero() {
                thread::sleep(self.config.reap_interval());
            }
        }

        self.shutdown();
        exit::SUCCESS
    }

    /// One loop iteration: top the pool up by at most one worker, then reap
    /// everything that has finished. Returns true if any work was done.
    pub fn tick(&mut self) -> Result<bool> {
        let mut busy = false;

        if self.workers.len() < self.target {
            busy |= self.spawn_worker();
        }

        busy |= self.reap_workers()? > 0;
        Ok(busy)
    }

    /// Returns true if a fork was attempted
    fn spawn_worker(&mut self) -> bool {
        if let Err(e) = self.process.hold_termination(true) {
            self.logger.warning(
                "Failed to block termination signal before fork",
                &LogContext::new().with("error", e.to_string()),
            );
        }

        // Termination may have arrived since the loop condition was checked
        if self.stop.is_stopped() {
            self.release_termination();
            return false;
        }

        match self.process.fork() {
            Ok(ForkOutcome::Parent { child }) => {
                self.workers.insert(child);
                self.release_termination();
                self.logger.info(
                    "Worker spawned",
                    &LogContext::new()
                        .with("worker_pid", child)
                        .with("workers", self.workers.len()),
                );
            }
            Ok(ForkOutcome::Child) => {
                let code = panic::catch_unwind(AssertUnwindSafe(|| self.become_worker()))
                    .unwrap_or(exit::FAILURE);
                self.process.exit(code);
            }
            Err(e) => {
                self.release_termination();
                self.logger.error(
                    "Failed to fork worker",
                    &LogContext::new().with("error", e.to_string()),
                );
            }
        }

        true
    }

    fn release_termination(&self) {
        if let Err(e) = self.process.hold_termination(false) {
            self.logger.warning(
                "Failed to unblock termination signal",
                &LogContext::new().with("error", e.to_string()),
            );
        }
    }

    /// Runs in the freshly forked child. Never returns into the controller loop.
    fn become_worker(&self) -> i32 {
        let stop = StopFlag::new();
        if let Err(e) = self.process.watch_termination(&stop) {
            self.logger.error(
                "Worker could not install termination handler",
                &LogContext::new().with("error", e.to_string()),
            );
            return exit::FAILURE;
        }
        self.release_termination();

        if self.config.process_titles() {
            self.process
                .set_title(&format!("{}: worker", self.config.name()));
        }
        capture_panic_locations();

        Worker::new(self.runners, self.logger, stop).run();
        exit::SUCCESS
    }

    /// Collect every finished child. Returns how many were reaped.
    fn reap_workers(&mut self) -> Result<usize> {
        let mut reaped = 0;

        loop {
            match self.process.reap()? {
                ReapStatus::Reaped { pid, exit } => {
                    reaped += 1;
                    self.forget_worker(pid, exit);
                }
                ReapStatus::NoneReady => break,
                ReapStatus::NoChildren => {
                    if !self.workers.is_empty() {
                        self.logger.warning(
                            "No children left, clearing worker registry",
                            &LogContext::new().with("tracked", self.workers.pids()),
                        );
                        self.workers.clear();
                    }
                    break;
                }
            }
        }

        Ok(reaped)
    }

    fn forget_worker(&mut self, pid: u32, exit: ExitKind) {
        let Some(entry) = self.workers.remove(pid) else {
            self.logger.debug(
                "Reaped untracked child",
                &LogContext::new().with("worker_pid", pid),
            );
            return;
        };

        let mut context = LogContext::new()
            .with("worker_pid", pid)
            .with("uptime_ms", entry.spawned_at.elapsed().as_millis() as u64)
            .with("workers", self.workers.len());
        context = match exit {
            ExitKind::Exited(code) => context.with("exit_code", code),
            ExitKind::Signaled(signal) => context.with("signal", signal),
        };

        if self.stop.is_stopped() {
            self.logger.info("Worker stopped", &context);
        } else {
            self.logger.warning("Worker exited, will respawn", &context);
        }
    }

    fn shutdown(&mut self) {
        self.logger.info(
            "Termination requested, stopping workers",
            &LogContext::new().with("workers", self.workers.pids()),
        );

        for pid in self.workers.pids() {
            if let Err(e) = self.process.terminate(pid) {
                self.logger.warning(
                    "Failed to signal worker",
                    &LogContext::new()
                        .with("worker_pid", pid)
                        .with("error", e.to_string()),
                );
            }
        }

        self.drain_workers();

        match self.pid_file.remove() {
            Ok(_) => {}
            Err(e) => self.logger.warning(
                "Failed to remove PID file",
                &LogContext::new()
                    .with("pid_file", self.pid_file.path().display().to_string())
                    .with("error", e.to_string()),
            ),
        }

        self.logger.info("Controller stopped", &LogContext::new());
        self.stop.finish();
    }

    /// Reap signalled workers until none are left or the grace period ends.
    /// Workers still running afterwards are left alone.
    fn drain_workers(&mut self) {
        let deadline = Instant::now() + self.config.shutdown_grace();
        let poll = Duration::from_millis(supervision::DRAIN_POLL_INTERVAL_MS);

        while !self.workers.is_empty() && Instant::now() < deadline {
            match self.reap_workers() {
                Ok(0) => thread::sleep(poll),
                Ok(_) => {}
                Err(e) => {
                    self.logger.error(
                        "Failed to reap workers during shutdown",
                        &LogContext::new().with("error", e.to_string()),
                    );
                    thread::sleep(poll);
                }
            }
        }

        if !self.workers.is_empty() {
            self.logger.warning(
                "Workers still running after shutdown grace period",
                &LogContext::new()
                    .with("workers", self.workers.pids())
                    .with(
                        "grace_ms",
                        self.config.shutdown_grace().as_millis() as u64,
                    ),
            );
        }
    }
}
