// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//! Command-line front end of the `pdict` matcher.
use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use log::info;
use pdict::{
    BaseCodes, Collapse, CollapseAxis, MatchParams, MatchReport, PDict, PDictError, ReportMode,
    TrustedBand, VMatchReport, View,
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub mod config;
pub mod io;
pub mod logging;

use config::Parameters;

fn parse_view(s: &str) -> Result<View> {
    io::parse_view(s)
}

fn parse_bases(s: &str) -> Result<BaseCodes, PDictError> {
    BaseCodes::try_from(s.as_bytes())
}

/// Match a dictionary of patterns with a trusted band against DNA sequences
#[derive(Parser, Debug, Clone)]
#[clap(name = "match_pdict", version)]
pub struct Args {
    /// Dictionary CSV, with a `core` column and optional `head` and `tail`
    /// columns, or a `sequence` column split with --tb-start/--tb-end.
    /// An optional `id` column names the patterns.
    #[clap(long)]
    pub dict: PathBuf,

    /// FASTA file of subject sequences.
    #[clap(long)]
    pub subjects: PathBuf,

    /// TOML parameters file. Defaults to match_pdict.toml next to the executable.
    #[clap(long)]
    pub params: Option<PathBuf>,

    /// Mismatches tolerated in the head and tail combined.
    #[clap(long)]
    pub max_mismatch: Option<usize>,

    /// Compare pattern letters literally (true) or as IUPAC codes (false).
    #[clap(long)]
    pub fixed_pattern: Option<bool>,

    /// Compare subject letters literally (true) or as IUPAC codes (false).
    #[clap(long)]
    pub fixed_subject: Option<bool>,

    /// What to report: existence, counts or ends.
    #[clap(long)]
    pub report: Option<ReportMode>,

    /// 1-based first position of the trusted band in each sequence,
    /// negative values count from the end.
    #[clap(long, allow_negative_numbers = true, requires = "tb_end")]
    pub tb_start: Option<i64>,

    /// 1-based last position of the trusted band in each sequence,
    /// negative values count from the end.
    #[clap(long, allow_negative_numbers = true, requires = "tb_start")]
    pub tb_end: Option<i64>,

    /// The four letters packed into the trusted band signatures, e.g. ACGU.
    #[clap(long, value_parser = parse_bases)]
    pub bases: Option<BaseCodes>,

    /// Views of a single subject to match, as START:WIDTH,...
    #[clap(long, value_delimiter = ',', value_parser = parse_view)]
    pub views: Vec<View>,

    /// Reduce the count matrix: by-pattern, by-subject, or the codes 1 and 2.
    #[clap(long, requires = "weights")]
    pub collapse: Option<CollapseAxis>,

    /// Collapse weights, one number per line.
    #[clap(long, requires = "collapse")]
    pub weights: Option<PathBuf>,

    /// Number of matching threads.
    #[clap(long)]
    pub threads: Option<usize>,

    /// Output JSON file. Defaults to stdout.
    #[clap(long)]
    pub out: Option<PathBuf>,

    /// Also write the patterns x subjects count matrix as a .npy file.
    #[clap(long)]
    pub npy: Option<PathBuf>,

    /// Log at debug level.
    #[clap(long)]
    pub verbose: bool,
}

impl Args {
    /// Apply the command line on top of the parameters file.
    pub fn parameters(&self) -> Result<Parameters> {
        let mut params = Parameters::load(self.params.as_deref())?;
        if let Some(max_mismatch) = self.max_mismatch {
            params.max_mismatch = max_mismatch;
        }
        if let Some(fixed_pattern) = self.fixed_pattern {
            params.fixed_pattern = fixed_pattern;
        }
        if let Some(fixed_subject) = self.fixed_subject {
            params.fixed_subject = fixed_subject;
        }
        if let Some(report) = self.report {
            params.report = report;
        }
        if let Some(bases) = self.bases {
            params.bases = bases;
        }
        if self.threads.is_some() {
            params.threads = self.threads;
        }
        Ok(params)
    }

    fn trusted_band(&self) -> Option<TrustedBand> {
        Some(TrustedBand::new(self.tb_start?, self.tb_end?))
    }
}

/// The report of a query, shaped by the driver that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// One subject, or the views of one subject.
    Single(MatchReport),
    /// Several subjects, or a collapsed count matrix.
    Many(VMatchReport),
}

/// Everything written to the JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutput {
    /// Pattern names, in dictionary order.
    pub patterns: Vec<String>,
    /// Subject names, in FASTA order.
    pub subjects: Vec<String>,
    pub params: MatchParams,
    pub result: QueryResult,
}

/// Run the query described by `args`.
pub fn run(args: &Args) -> Result<MatchOutput> {
    let params = args.parameters()?;
    let match_params = params.match_params();

    let named = io::read_dictionary(&args.dict, args.trusted_band())?;
    let pdict = PDict::new(named.dict, params.bases)
        .with_context(|| format!("preprocessing {}", args.dict.display()))?;
    info!(
        "preprocessed {} patterns, trusted band width {}",
        pdict.len(),
        pdict.width()
    );

    let subjects = io::read_subjects(&args.subjects)?;
    let collapse = match (args.collapse, &args.weights) {
        (Some(axis), Some(weights)) => Some(Collapse {
            axis,
            weights: io::read_weights(weights)?,
        }),
        (None, None) => None,
        _ => bail!("--collapse and --weights must be given together"),
    };

    let result = if !args.views.is_empty() {
        ensure!(
            subjects.len() == 1 && collapse.is_none(),
            "--views applies to a single subject without --collapse, got {} subjects",
            subjects.len()
        );
        QueryResult::Single(pdict.match_windowed(&subjects[0].seq, &args.views, &match_params)?)
    } else if subjects.len() == 1 && collapse.is_none() {
        QueryResult::Single(pdict.match_one(&subjects[0].seq, &match_params)?)
    } else {
        let report = match params.threads {
            Some(threads) if threads > 1 => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                pool.install(|| pdict.par_match_many(&subjects, &match_params, collapse.as_ref()))?
            }
            _ => pdict.match_many(&subjects, &match_params, collapse.as_ref())?,
        };
        QueryResult::Many(report)
    };

    Ok(MatchOutput {
        patterns: named.ids,
        subjects: subjects.into_iter().map(|s| s.name).collect(),
        params: match_params,
        result,
    })
}

/// Write `output` as JSON to `args.out`, or stdout, and the count matrix to
/// `args.npy` if requested.
pub fn write_output(args: &Args, output: &MatchOutput) -> Result<()> {
    if let Some(path) = &args.npy {
        let QueryResult::Many(VMatchReport::Counts(counts)) = &output.result else {
            bail!("--npy requires a count matrix: several subjects, counts report, no collapse");
        };
        ndarray_npy::write_npy(path, counts).with_context(|| path.display().to_string())?;
    }

    match &args.out {
        Some(path) => {
            let mut writer =
                BufWriter::new(File::create(path).with_context(|| path.display().to_string())?);
            serde_json::to_writer_pretty(&mut writer, output)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, output)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "match_pdict",
            "--dict",
            "d.csv",
            "--subjects",
            "s.fa",
            "--report",
            "which",
            "--tb-start",
            "2",
            "--tb-end",
            "-2",
            "--views",
            "1:10,5:3",
            "--bases",
            "ACGU",
        ])
        .unwrap();
        assert_eq!(args.report, Some(ReportMode::Existence));
        assert_eq!(args.trusted_band(), Some(TrustedBand::new(2, -2)));
        assert_eq!(args.views, vec![View::new(1, 10), View::new(5, 3)]);
        assert_eq!(args.bases, Some(BaseCodes::RNA));

        let args = Args::try_parse_from([
            "match_pdict",
            "--dict",
            "d.csv",
            "--subjects",
            "s.fa",
            "--collapse",
            "2",
            "--weights",
            "w.txt",
        ])
        .unwrap();
        assert_eq!(args.collapse, Some(CollapseAxis::BySubject));

        // Each half of the trusted band needs the other.
        assert!(Args::try_parse_from([
            "match_pdict",
            "--dict",
            "d.csv",
            "--subjects",
            "s.fa",
            "--tb-start",
            "2",
        ])
        .is_err());
        assert!(Args::try_parse_from([
            "match_pdict",
            "--dict",
            "d.csv",
            "--subjects",
            "s.fa",
            "--bases",
            "AACG",
        ])
        .is_err());
    }
}
