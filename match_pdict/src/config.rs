// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//! Matching parameters read from `match_pdict.toml`.
use anyhow::{Context, Result};
use log::{info, warn};
use pdict::{BaseCodes, Fixed, MatchParams, ReportMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up next to the executable when `--params` is not given.
pub const PARAMETERS_FILE: &str = "match_pdict.toml";

/// Settings shared by every query of a run.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Mismatches tolerated in the head and tail of a pattern combined.
    pub max_mismatch: usize,
    /// Compare pattern flank letters literally, IUPAC codes otherwise.
    pub fixed_pattern: bool,
    /// Compare subject letters literally, IUPAC codes otherwise.
    pub fixed_subject: bool,
    /// What every query reports.
    pub report: ReportMode,
    /// The four letters packed into the trusted band signatures.
    pub bases: BaseCodes,
    /// Size of the matching thread pool. Matching is sequential when unset.
    pub threads: Option<usize>,
}

/// Values used for every key missing from the parameters file.
pub const DEFAULT_PARAMETERS: Parameters = Parameters {
    max_mismatch: 0,
    fixed_pattern: true,
    fixed_subject: true,
    report: ReportMode::Counts,
    bases: BaseCodes::DNA,
    threads: None,
};

impl Default for Parameters {
    fn default() -> Self {
        DEFAULT_PARAMETERS
    }
}

macro_rules! warn_non_default {
    ($params:ident, $($field:ident),+) => {
        $(
            if DEFAULT_PARAMETERS.$field != $params.$field {
                warn!("using non-default {} = {:?}", stringify!($field), $params.$field);
            }
        )+
    };
}

impl Parameters {
    /// Load the parameters from `path`, or from the file next to the running
    /// executable when no path is given. A missing default file falls back to
    /// `DEFAULT_PARAMETERS`, a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Parameters> {
        let params = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = default_path()?;
                if !path.exists() {
                    info!(
                        "could not find {PARAMETERS_FILE} at {}, falling back to defaults",
                        path.display()
                    );
                    DEFAULT_PARAMETERS
                } else {
                    Self::from_file(&path)?
                }
            }
        };
        params.warn_non_default();
        Ok(params)
    }

    /// Parse a parameters file, without the non-default warnings.
    pub fn from_file(path: &Path) -> Result<Parameters> {
        let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        toml::from_str(&s).with_context(|| path.display().to_string())
    }

    fn warn_non_default(&self) {
        warn_non_default!(
            self,
            max_mismatch,
            fixed_pattern,
            fixed_subject,
            report,
            bases,
            threads
        );
    }

    /// The per-query settings for the engine.
    pub fn match_params(&self) -> MatchParams {
        MatchParams::new(self.max_mismatch, self.report)
            .with_fixed(Fixed::new(self.fixed_pattern, self.fixed_subject))
    }
}

fn default_path() -> Result<PathBuf> {
    Ok(std::env::current_exe()
        .context("Unable to locate the running executable")?
        .with_file_name(PARAMETERS_FILE))
}
