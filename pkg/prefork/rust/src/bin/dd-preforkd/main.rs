// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! dd-preforkd
//!
//! Reference daemon built on the prefork library. Runs two demo runners,
//! `tick_a` then `tick_b`, in every worker; each appends `<pid> <runner>` to
//! the trace file when one is configured. `DD_PREFORK_FAILING_RUNNER` adds a
//! third runner that always fails.

mod config;

use config::EnvConfig;
use prefork::constants::exit;
use prefork::{Daemon, LogContext, LoggerPort, Runner, StopFlag};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Time a tick runner spends per invocation
const TICK_DURATION: Duration = Duration::from_millis(50);
const TICK_STEP: Duration = Duration::from_millis(10);

fn tick_runner(name: &'static str, trace: Option<PathBuf>) -> Arc<dyn Runner> {
    Arc::new(
        move |logger: &dyn LoggerPort, stop: &StopFlag| -> anyhow::Result<()> {
            if let Some(path) = &trace {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                writeln!(file, "{} {}", std::process::id(), name)?;
            }
            logger.debug("Tick", &LogContext::new().with("runner", name));

            // Simulated work, cut short once termination is requested
            let mut waited = Duration::ZERO;
            while waited < TICK_DURATION && !stop.is_stopped() {
                thread::sleep(TICK_STEP);
                waited += TICK_STEP;
            }
            Ok(())
        },
    )
}

fn always_fails(_: &dyn LoggerPort, _: &StopFlag) -> anyhow::Result<()> {
    thread::sleep(TICK_STEP);
    anyhow::bail!("scheduled failure")
}

fn main() {
    let env = EnvConfig::from_env();

    let config = match env.daemon_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dd-preforkd: {}", e);
            std::process::exit(exit::FAILURE);
        }
    };

    let trace = env.trace_path();
    let mut daemon = Daemon::new(config);
    daemon
        .register("tick_a", tick_runner("tick_a", trace.clone()))
        .register("tick_b", tick_runner("tick_b", trace));
    if env.failing_runner {
        daemon.register("always_fails", Arc::new(always_fails));
    }

    daemon.start(env.workers)
}
