// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Domain-level errors
//! Fatal startup conditions and the recoverable failures of the supervision loop

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreforkError {
    // Configuration errors (fatal at startup)
    #[error("Invalid daemon name: {0}")]
    InvalidName(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Directory {path:?} is not writable: {reason}")]
    DirectoryNotWritable { path: PathBuf, reason: String },

    #[error("No runners registered")]
    NoRunners,

    // Pid file errors
    #[error("Failed to remove stale PID file {path:?}: {source}")]
    StalePidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PID file {path:?}: {source}")]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Process control errors
    #[error("Failed to fork: {0}")]
    Fork(String),

    #[error("Failed to detach from terminal: {0}")]
    Detach(String),

    #[error("Failed to reap children: {0}")]
    Reap(String),

    #[error("Failed to send signal to {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    #[error("Failed to install signal handling: {0}")]
    SignalHandler(String),

    // Logging sink errors
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl PreforkError {
    /// Returns true for conditions that must abort startup.
    /// Everything else is logged and survived once the controller is running.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PreforkError::Fork(_) | PreforkError::Reap(_) | PreforkError::Signal { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PreforkError>;
