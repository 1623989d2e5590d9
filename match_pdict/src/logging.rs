// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Install the stderr logger: `info` by default, `debug` when `verbose`,
/// `RUST_LOG` overrides both.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // A logger may already be installed when running inside tests.
    let _ = Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .parse_env("RUST_LOG")
        .try_init();
}
