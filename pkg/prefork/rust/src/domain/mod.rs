// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

pub mod config;
pub mod error;
pub mod ports;
pub mod runner;
pub mod services;
pub mod value_objects;

pub use config::{DaemonConfig, DaemonConfigBuilder};
pub use error::{PreforkError, Result};
pub use runner::{Runner, RunnerRegistry};
pub use value_objects::{LogContext, StopFlag, StopState};
