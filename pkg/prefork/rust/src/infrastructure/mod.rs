// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! OS-facing adapters for the domain ports

pub mod signals;
pub mod tracing_logger;
pub mod unix_process;

pub use tracing_logger::{init_file_logging, TracingLogger};
pub use unix_process::UnixProcessControl;
