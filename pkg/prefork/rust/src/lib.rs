// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Prefork Supervisor
//!
//! A library for running a fixed pool of forked worker processes:
//! - pid-file singleton guard (one instance per name)
//! - background controller that forks, reaps and respawns workers
//! - worker loop running registered runners in order, isolating failures
//! - cooperative SIGTERM shutdown through per-process stop flags
//!
//! ```no_run
//! use prefork::{Daemon, DaemonConfig, LoggerPort, LogContext, StopFlag};
//! use std::sync::Arc;
//!
//! let config = DaemonConfig::builder("mailer").build().expect("valid name");
//! let mut daemon = Daemon::new(config);
//! daemon.register(
//!     "flush_queue",
//!     Arc::new(|logger: &dyn LoggerPort, stop: &StopFlag| -> anyhow::Result<()> {
//!         if !stop.is_stopped() {
//!             logger.info("Flushing queue", &LogContext::new());
//!         }
//!         Ok(())
//!     }),
//! );
//! daemon.start(4)
//! ```

// Module declarations
pub mod constants;
pub mod daemon;

// Core architecture modules
pub mod domain;
pub mod infrastructure;

// Re-export public types
pub use daemon::{Daemon, StartOutcome};
pub use domain::ports::{LogLevel, LoggerPort, MemoryLogger, ProcessControl};
pub use domain::{
    DaemonConfig, DaemonConfigBuilder, LogContext, PreforkError, Result, Runner, RunnerRegistry,
    StopFlag, StopState,
};
pub use infrastructure::{TracingLogger, UnixProcessControl};
