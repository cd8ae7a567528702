// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! LoggerPort
//! Structured log sink consumed by the controller, the workers and the runners.
//! Implementations attach the emitting process id to every record themselves.

use crate::domain::LogContext;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parse a level name, accepting the common aliases
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "debug" | "trace" => Some(Self::Debug),
            "info" | "notice" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warning),
            "error" | "critical" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Port for the structured log sink
pub trait LoggerPort: Send + Sync {
    fn record(&self, level: LogLevel, message: &str, context: &LogContext);

    fn debug(&self, message: &str, context: &LogContext) {
        self.record(LogLevel::Debug, message, context);
    }

    fn info(&self, message: &str, context: &LogContext) {
        self.record(LogLevel::Info, message, context);
    }

    fn warning(&self, message: &str, context: &LogContext) {
        self.record(LogLevel::Warning, message, context);
    }

    fn error(&self, message: &str, context: &LogContext) {
        self.record(LogLevel::Error, message, context);
    }
}
