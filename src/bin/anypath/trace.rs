// Copyright 2025 Martin Pool.

// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! Trace output to stderr.

use tracing::{trace, Level};
use tracing_subscriber::filter;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::Registry;

/// Chosen style of timestamp prefix on trace lines.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum TraceTimeStyle {
    /// No timestamp on trace lines.
    None,
    /// Universal time, in RFC 3339 style.
    Utc,
    /// Time since the start of the process, in seconds.
    Relative,
}

pub fn enable_tracing(time_style: &TraceTimeStyle, console_level: Level) {
    use tracing_subscriber::fmt::time;
    fn hookup<FT>(timer: FT, console_level: Level)
    where
        FT: FormatTime + Send + Sync + 'static,
    {
        let console_layer = tracing_subscriber::fmt::Layer::default()
            .with_writer(std::io::stderr)
            .with_timer(timer)
            .with_filter(filter::Targets::new().with_target("anypath", console_level));
        Registry::default().with(console_layer).init();
    }

    match time_style {
        TraceTimeStyle::None => hookup((), console_level),
        TraceTimeStyle::Utc => hookup(time::UtcTime::rfc_3339(), console_level),
        TraceTimeStyle::Relative => hookup(time::uptime(), console_level),
    }
    trace!("Tracing enabled");
}
