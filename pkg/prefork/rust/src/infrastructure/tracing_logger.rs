// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! LoggerPort adapter over `tracing`
//!
//! Records go through the global subscriber installed by [`init_file_logging`].
//! The file writer is synchronous so it keeps working in forked workers, which
//! inherit the subscriber and the open file from the controller.

use crate::domain::ports::{LogLevel, LoggerPort};
use crate::domain::{DaemonConfig, LogContext, PreforkError, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Emits every record as a `tracing` event tagged with the daemon name
#[derive(Debug, Clone)]
pub struct TracingLogger {
    channel: String,
}

impl TracingLogger {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl LoggerPort for TracingLogger {
    fn record(&self, level: LogLevel, message: &str, context: &LogContext) {
        let pid = std::process::id();
        let channel = self.channel.as_str();
        match level {
            LogLevel::Debug => {
                tracing::debug!(channel = channel, pid = pid, context = %context, "{}", message)
            }
            LogLevel::Info => {
                tracing::info!(channel = channel, pid = pid, context = %context, "{}", message)
            }
            LogLevel::Warning => {
                tracing::warn!(channel = channel, pid = pid, context = %context, "{}", message)
            }
            LogLevel::Error => {
                tracing::error!(channel = channel, pid = pid, context = %context, "{}", message)
            }
        }
    }
}

/// `EnvFilter` directive for a level
pub fn filter_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warning => "warn",
        LogLevel::Error => "error",
    }
}

/// Install the global subscriber writing to the configured log file
/// (appending, never rotated).
pub fn init_file_logging(config: &DaemonConfig) -> Result<()> {
    let path = config.log_file();
    let (Some(dir), Some(file_name)) = (path.parent(), path.file_name()) else {
        return Err(PreforkError::Logging(format!(
            "log file path {:?} has no file name",
            path
        )));
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy().into_owned())
        .build(dir)
        .map_err(|e| PreforkError::Logging(format!("{:?}: {}", path, e)))?;

    let filter = EnvFilter::try_new(filter_directive(config.log_level()))
        .map_err(|e| PreforkError::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(appender)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| PreforkError::Logging(e.to_string()))
}
