// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Application-wide constants and default values
//!
//! Centralizes magic numbers and default configurations for better maintainability

/// Filesystem defaults
pub mod paths {
    /// Directory holding `<name>.pid` when no pid file path is configured
    pub const DEFAULT_RUNTIME_DIR: &str = "/var/run";

    /// Directory holding `<name>.log` when no log file path is configured
    pub const DEFAULT_LOG_DIR: &str = "/var/log";

    pub const PID_FILE_EXTENSION: &str = "pid";
    pub const LOG_FILE_EXTENSION: &str = "log";
}

/// Supervision loop defaults
pub mod supervision {
    /// Worker count used when the caller does not ask for a specific pool size
    pub const DEFAULT_WORKER_COUNT: usize = 1;

    /// Idle wait between reap attempts when an iteration did no work (milliseconds)
    pub const DEFAULT_REAP_INTERVAL_MS: u64 = 100;

    /// How long the controller keeps reaping after signalling workers on shutdown (seconds)
    pub const DEFAULT_SHUTDOWN_GRACE_SEC: u64 = 10;

    /// Polling step used while waiting for workers to drain (milliseconds)
    pub const DRAIN_POLL_INTERVAL_MS: u64 = 20;
}

/// Process exit statuses
pub mod exit {
    /// Normal completion, or another instance was already running
    pub const SUCCESS: i32 = 0;

    /// Any fatal startup condition
    pub const FAILURE: i32 = 1;
}

/// Logging defaults
pub mod logging {
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}
