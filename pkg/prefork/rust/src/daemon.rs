// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Daemon facade
//!
//! Entry point for library users: build a [`DaemonConfig`], register runners
//! and call [`Daemon::start`]. The invoking process prints the background
//! controller's pid and exits; the controller supervises the worker pool
//! until it receives SIGTERM.

use crate::constants::exit;
use crate::domain::ports::{ForkOutcome, LoggerPort, ProcessControl};
use crate::domain::services::{Controller, PidFile, SingletonGuard};
use crate::domain::{
    DaemonConfig, LogContext, PreforkError, Result, Runner, RunnerRegistry, StopFlag,
};
use crate::infrastructure::{init_file_logging, TracingLogger, UnixProcessControl};
use std::sync::Arc;

/// How [`Daemon::try_start`] returned to its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A live instance already owns the pid file; nothing was changed
    AlreadyRunning { pid: u32 },
    /// Invoking process: the controller now runs in the background
    Detached { controller_pid: u32 },
    /// Controller process: supervision ended after a termination request
    Stopped { exit_code: i32 },
}

pub struct Daemon<P: ProcessControl = UnixProcessControl> {
    config: DaemonConfig,
    runners: RunnerRegistry,
    logger: Arc<dyn LoggerPort>,
    /// Install the tracing file sink before supervising
    file_logging: bool,
    process: P,
}

impl Daemon<UnixProcessControl> {
    pub fn new(config: DaemonConfig) -> Self {
        let logger = Arc::new(TracingLogger::new(config.name()));
        Self {
            config,
            runners: RunnerRegistry::new(),
            logger,
            file_logging: true,
            process: UnixProcessControl::new(),
        }
    }
}

impl<P: ProcessControl> Daemon<P> {
    /// Replace the log sink. The tracing file sink is then left uninstalled.
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = logger;
        self.file_logging = false;
        self
    }

    pub fn with_process_control<Q: ProcessControl>(self, process: Q) -> Daemon<Q> {
        Daemon {
            config: self.config,
            runners: self.runners,
            logger: self.logger,
            file_logging: self.file_logging,
            process,
        }
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn runners(&self) -> &RunnerRegistry {
        &self.runners
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    pub fn register(&mut self, name: impl Into<String>, runner: Arc<dyn Runner>) -> &mut Self {
        self.runners.register(name, runner);
        self
    }

    pub fn register_runners<I, S>(&mut self, runners: I) -> &mut Self
    where
        I: IntoIterator<Item = (S, Arc<dyn Runner>)>,
        S: Into<String>,
    {
        self.runners.register_all(runners);
        self
    }

    /// Start supervising `worker_count` workers and never return.
    ///
    /// Exit status 0 when the controller was started, when an instance is
    /// already running and when the controller shuts down; 1 on any fatal
    /// startup condition.
    pub fn start(&self, worker_count: usize) -> ! {
        match self.try_start(worker_count) {
            Ok(StartOutcome::AlreadyRunning { pid }) => {
                println!("{} is already running with pid {}", self.config.name(), pid);
                self.process.exit(exit::SUCCESS)
            }
            Ok(StartOutcome::Detached { controller_pid }) => {
                println!("{} started with pid {}", self.config.name(), controller_pid);
                self.process.exit(exit::SUCCESS)
            }
            Ok(StartOutcome::Stopped { exit_code }) => self.process.exit(exit_code),
            Err(e) => {
                // Background-side failures were already logged by try_start
                eprintln!("{}: {}", self.config.name(), e);
                self.process.exit(exit::FAILURE)
            }
        }
    }

    /// Run the startup sequence and, in the background process, the
    /// controller loop. Returns once on each side of the detach.
    pub fn try_start(&self, worker_count: usize) -> Result<StartOutcome> {
        if worker_count == 0 {
            return Err(PreforkError::InvalidConfiguration(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.runners.is_empty() {
            return Err(PreforkError::NoRunners);
        }
        self.config.validate_paths()?;

        let pid_file = PidFile::new(self.config.pid_file());
        if let Some(pid) = SingletonGuard::new(&pid_file, &self.process).active_pid()? {
            return Ok(StartOutcome::AlreadyRunning { pid });
        }

        if let ForkOutcome::Parent { child } = self.process.detach()? {
            return Ok(StartOutcome::Detached {
                controller_pid: child,
            });
        }

        // Background side from here on: stdio is gone, report through the log
        let exit_code = self.supervise(&pid_file, worker_count).inspect_err(|e| {
            self.logger.error(
                "Controller failed to start",
                &LogContext::new().with("error", e.to_string()),
            );
            // Never leave a pid file behind for a controller that did not run
            let _ = pid_file.remove();
        })?;

        Ok(StartOutcome::Stopped { exit_code })
    }

    fn supervise(&self, pid_file: &PidFile, worker_count: usize) -> Result<i32> {
        if self.file_logging {
            init_file_logging(&self.config)?;
        }

        let stop = StopFlag::new();
        self.process.watch_termination(&stop)?;

        if self.config.process_titles() {
            self.process
                .set_title(&format!("{}: controller", self.config.name()));
        }

        let pid = self.process.current_pid();
        pid_file.write(pid)?;
        self.logger.info(
            "Controller running",
            &LogContext::new()
                .with("pid_file", pid_file.path().display().to_string())
                .with("log_level", self.config.log_level().to_string()),
        );

        let mut controller = Controller::new(
            &self.config,
            &self.runners,
            &self.process,
            self.logger.as_ref(),
            stop,
            worker_count,
        );
        Ok(controller.run())
    }
}
