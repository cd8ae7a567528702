// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

mod log_context;
mod stop_flag;
mod stop_state;

pub use log_context::LogContext;
pub use stop_flag::StopFlag;
pub(crate) use stop_flag::raise_state;
pub use stop_state::StopState;
