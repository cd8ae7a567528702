// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Daemon configuration from environment variables
//!
//! All configuration is read from `DD_PREFORK_*` environment variables with
//! sensible defaults, so the binary needs no command-line parsing.

use prefork::constants::supervision;
use prefork::{DaemonConfig, LogLevel, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Default configuration values
const DEFAULT_NAME: &str = "dd-preforkd";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Daemon configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Instance name; an explicitly empty value is kept and rejected later
    pub name: String,

    /// Pid file path (default `/var/run/<name>.pid`)
    pub pid_file: Option<String>,

    /// Log file path (default `/var/log/<name>.log`)
    pub log_file: Option<String>,

    /// Number of workers to keep alive
    pub workers: usize,

    /// Log level
    pub log_level: String,

    /// Idle wait between reap attempts
    pub reap_interval_ms: u64,

    /// File the demo runners append `<pid> <runner>` lines to
    pub trace_file: Option<String>,

    /// Register a runner that fails on every invocation
    pub failing_runner: bool,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            name: env::var("DD_PREFORK_NAME").unwrap_or_else(|_| DEFAULT_NAME.to_string()),
            pid_file: env::var("DD_PREFORK_PID_FILE").ok(),
            log_file: env::var("DD_PREFORK_LOG_FILE").ok(),
            workers: Self::parse_number("DD_PREFORK_WORKERS")
                .unwrap_or(supervision::DEFAULT_WORKER_COUNT as u64) as usize,
            log_level: Self::parse_log_level(),
            reap_interval_ms: Self::parse_number("DD_PREFORK_REAP_INTERVAL_MS")
                .unwrap_or(supervision::DEFAULT_REAP_INTERVAL_MS),
            trace_file: env::var("DD_PREFORK_TRACE_FILE").ok(),
            failing_runner: Self::parse_bool("DD_PREFORK_FAILING_RUNNER", false),
        }
    }

    fn parse_number(var_name: &str) -> Option<u64> {
        env::var(var_name).ok().and_then(|s| s.trim().parse().ok())
    }

    fn parse_bool(var_name: &str, default: bool) -> bool {
        env::var(var_name)
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" => Some(false),
                _ => None,
            })
            .unwrap_or(default)
    }

    fn parse_log_level() -> String {
        // Priority: DD_PREFORK_LOG_LEVEL > RUST_LOG > default
        env::var("DD_PREFORK_LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
    }

    /// Build the library configuration. Unknown log levels fall back to info.
    pub fn daemon_config(&self) -> Result<DaemonConfig> {
        let mut builder = DaemonConfig::builder(self.name.as_str())
            .log_level(LogLevel::parse(&self.log_level).unwrap_or(LogLevel::Info))
            .reap_interval(Duration::from_millis(self.reap_interval_ms));
        if let Some(path) = &self.pid_file {
            builder = builder.pid_file(path);
        }
        if let Some(path) = &self.log_file {
            builder = builder.log_file(path);
        }
        builder.build()
    }

    /// Trace file as an absolute path; the controller runs from `/`
    pub fn trace_path(&self) -> Option<PathBuf> {
        self.trace_file
            .as_deref()
            .filter(|p| !p.is_empty())
            .and_then(|p| std::path::absolute(p).ok())
    }
}
