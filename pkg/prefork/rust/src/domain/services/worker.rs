// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Worker loop
//!
//! Runs every registered runner, in registration order, pass after pass until
//! the worker's own stop flag is raised. A failing runner (error or panic) is
//! logged and skipped; it never aborts the pass or the loop.

use crate::domain::ports::LoggerPort;
use crate::domain::{LogContext, Runner, RunnerRegistry, StopFlag};
use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

thread_local! {
    static LAST_PANIC_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Install a panic hook that remembers where the last panic originated, so
/// runner panics can be logged with their source location. The previous hook
/// still runs afterwards.
pub fn capture_panic_locations() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()));
            LAST_PANIC_LOCATION.with(|cell| *cell.borrow_mut() = location);
            previous(info);
        }));
    });
}

/// Why a single runner invocation failed
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerFailure {
    pub message: String,
    pub location: Option<String>,
}

/// Outcome of one pass over the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub invoked: usize,
    pub failed: usize,
    /// Runners skipped because the stop flag was raised mid-pass
    pub skipped: usize,
}

pub struct Worker<'a> {
    runners: &'a RunnerRegistry,
    logger: &'a dyn LoggerPort,
    stop: StopFlag,
}

impl<'a> Worker<'a> {
    pub fn new(runners: &'a RunnerRegistry, logger: &'a dyn LoggerPort, stop: StopFlag) -> Self {
        Self {
            runners,
            logger,
            stop,
        }
    }

    /// Loop until the stop flag is raised. Returns the number of passes started.
    pub fn run(&self) -> usize {
        self.logger.info(
            "Worker started",
            &LogContext::new().with("runners", self.runners.len()),
        );

        let mut passes = 0;
        while !self.stop.is_stopped() {
            self.run_pass();
            passes += 1;
        }

        self.logger.info(
            "Worker stopping",
            &LogContext::new()
                .with("state", self.stop.state().to_string())
                .with("passes", passes),
        );
        self.stop.finish();
        passes
    }

    /// Invoke each runner once, in order. Once the stop flag is raised the
    /// in-flight runner is allowed to return and the rest are skipped.
    pub fn run_pass(&self) -> PassReport {
        let mut report = PassReport::default();

        for (name, runner) in self.runners.iter() {
            if self.stop.is_stopped() {
                report.skipped += 1;
                continue;
            }

            report.invoked += 1;
            if let Err(failure) = self.invoke(runner) {
                report.failed += 1;
                let mut context = LogContext::new()
                    .with("runner", name)
                    .with("error", failure.message);
                if let Some(location) = failure.location {
                    context = context.with("location", location);
                }
                self.logger.error("Runner failed", &context);
            }
        }

        report
    }

    fn invoke(&self, runner: &dyn Runner) -> Result<(), RunnerFailure> {
        LAST_PANIC_LOCATION.with(|cell| cell.borrow_mut().take());

        match panic::catch_unwind(AssertUnwindSafe(|| runner.invoke(self.logger, &self.stop))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(RunnerFailure {
                message: format!("{:#}", e),
                location: None,
            }),
            Err(payload) => Err(RunnerFailure {
                message: panic_message(payload.as_ref()),
                location: LAST_PANIC_LOCATION.with(|cell| cell.borrow_mut().take()),
            }),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
