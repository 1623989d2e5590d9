// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//! match_pdict
#![deny(missing_docs)]

use anyhow::Result;
use clap::Parser;
use match_pdict::logging::setup_logging;
use match_pdict::{run, write_output, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    let output = run(&args)?;
    write_output(&args, &output)
}
