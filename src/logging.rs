//
// Copyright (c) The armor-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Logging surface.
//!
//! The debug logger is the only process-wide state in the tool. It is
//! installed once at process entry; the core modules log through the
//! [`log`] facade and never touch the sink directly.

use clap::ValueEnum;

/// Verbosity levels accepted on the command line, most to least severe.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum LogLevel {
    Error,
    Log,
    Info,
    Debug,
}

impl LogLevel {
    /// Map the CLI level onto the `log` facade filter.
    pub fn filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Log => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Install the process-wide logger.
///
/// Must be called at most once; later calls are ignored by `env_logger`.
pub fn init(level: LogLevel) {
    let _ = env_logger::Builder::new()
        .filter_level(level.filter())
        .format_timestamp(None)
        .try_init();
}
