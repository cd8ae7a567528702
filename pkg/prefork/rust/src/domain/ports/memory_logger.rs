// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! In-memory LoggerPort implementation for testing

use super::{LogLevel, LoggerPort};
use crate::domain::LogContext;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub context: LogContext,
    pub pid: u32,
}

/// Captures every record instead of writing it anywhere
#[derive(Clone, Default)]
pub struct MemoryLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Records at `level` whose message contains `needle`
    pub fn matching(&self, level: LogLevel, needle: &str) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.level == level && r.message.contains(needle))
            .cloned()
            .collect()
    }
}

impl LoggerPort for MemoryLogger {
    fn record(&self, level: LogLevel, message: &str, context: &LogContext) {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).push(LogRecord {
            level,
            message: message.to_string(),
            context: context.clone(),
            pid: std::process::id(),
        });
    }
}
