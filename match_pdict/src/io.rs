// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//! Readers for the dictionary, subject and weight files.
use anyhow::{bail, ensure, Context, Result};
use bio::io::fasta;
use itertools::Itertools;
use log::info;
use pdict::{Dictionary, Pattern, TrustedBand, View, Weights};
use serde::Deserialize;
use std::path::Path;

/// A dictionary together with the names of its patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedDictionary {
    /// Pattern names, from the `id` column or numbered from 1.
    pub ids: Vec<String>,
    pub dict: Dictionary,
}

/// One row of the dictionary CSV. Either `core` (with optional `head` and
/// `tail`) or `sequence` is filled, depending on the file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DictRow {
    id: Option<String>,
    head: Option<String>,
    core: Option<String>,
    tail: Option<String>,
    sequence: Option<String>,
}

fn bytes(field: Option<String>) -> Vec<u8> {
    field.map(String::into_bytes).unwrap_or_default()
}

/// Read a dictionary CSV.
///
/// Files with a `core` column give the split of every pattern explicitly.
/// Files with a `sequence` column are split at `band`, which must then be
/// given.
pub fn read_dictionary(path: &Path, band: Option<TrustedBand>) -> Result<NamedDictionary> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| path.display().to_string())?;
    let headers = reader.headers()?.clone();
    let has = |name: &str| headers.iter().any(|h| h == name);
    let split = match (has("core"), has("sequence")) {
        (true, false) => false,
        (false, true) => true,
        _ => bail!(
            "{}: expected exactly one of the columns 'core' or 'sequence', found: {}",
            path.display(),
            headers.iter().join(",")
        ),
    };
    if split {
        ensure!(
            band.is_some(),
            "{}: a dictionary of full sequences requires --tb-start and --tb-end",
            path.display()
        );
    } else if band.is_some() {
        bail!(
            "{}: --tb-start and --tb-end only apply to a 'sequence' column",
            path.display()
        );
    }

    let mut ids = Vec::new();
    let mut sequences = Vec::new();
    let mut patterns = Vec::new();
    for (i, row) in reader.deserialize::<DictRow>().enumerate() {
        let row = row.with_context(|| format!("{}: row {}", path.display(), i + 1))?;
        ids.push(row.id.unwrap_or_else(|| format!("pattern_{}", i + 1)));
        if split {
            sequences.push(bytes(row.sequence));
        } else {
            patterns.push(Pattern {
                head: bytes(row.head),
                core: bytes(row.core),
                tail: bytes(row.tail),
            });
        }
    }

    let dict = match band {
        Some(band) if split => Dictionary::from_trusted_band(sequences, band)
            .with_context(|| path.display().to_string())?,
        _ => Dictionary::new(patterns),
    };
    info!("read {} patterns from {}", dict.len(), path.display());
    Ok(NamedDictionary { ids, dict })
}

/// A subject sequence and its FASTA record name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Record id, without the description.
    pub name: String,
    /// Sequence bytes, as read.
    pub seq: Vec<u8>,
}

impl AsRef<[u8]> for Subject {
    fn as_ref(&self) -> &[u8] {
        &self.seq
    }
}

/// Read every record of a FASTA file. An empty file is an error.
pub fn read_subjects(path: &Path) -> Result<Vec<Subject>> {
    let reader = fasta::Reader::from_file(path).with_context(|| path.display().to_string())?;
    let subjects = reader
        .records()
        .map(|record| {
            let record = record.with_context(|| path.display().to_string())?;
            Ok(Subject {
                name: record.id().to_string(),
                seq: record.seq().to_vec(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    ensure!(!subjects.is_empty(), "{}: no subject sequences", path.display());
    info!("read {} subjects from {}", subjects.len(), path.display());
    Ok(subjects)
}

/// Read one weight per line. The weights are integers if every line is an
/// integer, floating point otherwise.
pub fn read_weights(path: &Path) -> Result<Weights> {
    let contents = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
    parse_weights(&contents).with_context(|| path.display().to_string())
}

fn parse_weights(contents: &str) -> Result<Weights> {
    let values: Vec<(usize, &str)> = contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();
    let ints: std::result::Result<Vec<i64>, _> = values.iter().map(|(_, v)| v.parse()).collect();
    if let Ok(ints) = ints {
        return Ok(Weights::Int(ints));
    }
    let floats = values
        .iter()
        .map(|&(line, v)| {
            v.parse::<f64>()
                .with_context(|| format!("line {line}: invalid weight '{v}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Weights::Float(floats))
}

/// Parse a `START:WIDTH` view, START being 1-based.
pub fn parse_view(s: &str) -> Result<View> {
    let Some((start, width)) = s.split_once(':') else {
        bail!("expected START:WIDTH, got '{s}'");
    };
    let start = start
        .trim()
        .parse()
        .with_context(|| format!("invalid view start in '{s}'"))?;
    let width = width
        .trim()
        .parse()
        .with_context(|| format!("invalid view width in '{s}'"))?;
    Ok(View::new(start, width))
}
