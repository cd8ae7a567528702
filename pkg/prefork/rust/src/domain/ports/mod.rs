// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

pub mod logger;
pub mod memory_logger;
pub mod process_control;
#[cfg(test)]
pub mod scripted_process_control;

pub use logger::{LogLevel, LoggerPort};
pub use memory_logger::{LogRecord, MemoryLogger};
pub use process_control::{ExitKind, ForkOutcome, ProcessControl, ReapStatus};
#[cfg(test)]
pub use scripted_process_control::ScriptedProcessControl;
