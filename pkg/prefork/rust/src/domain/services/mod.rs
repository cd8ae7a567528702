// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Domain services: pid file handling, singleton detection and the two
//! process roles (controller and worker)

pub mod controller;
pub mod pid_file;
pub mod singleton_guard;
pub mod worker;

pub use controller::{Controller, ProcessRegistry, WorkerEntry};
pub use pid_file::{PidFile, PidFileContent};
pub use singleton_guard::SingletonGuard;
pub use worker::{capture_panic_locations, PassReport, RunnerFailure, Worker};
