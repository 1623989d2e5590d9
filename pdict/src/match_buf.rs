// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//!
//! Accumulation of accepted matches, and the shapes they are reported in.
//!
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// What a query reports for every pattern.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportMode {
    /// Which patterns matched at least once.
    #[strum(to_string = "existence", serialize = "which")]
    #[serde(alias = "which")]
    Existence,
    /// How many times each pattern matched.
    #[default]
    Counts,
    /// Where each pattern matched.
    Ends,
}

/// Matches of one query unit, materialized in the requested shape.
///
/// Pattern indices are 0-based, end positions are 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "matches", rename_all = "snake_case")]
pub enum MatchReport {
    /// Sorted indices of the patterns with at least one match.
    Existence(Vec<usize>),
    /// One count per pattern.
    Counts(Vec<u32>),
    /// Sorted end positions per pattern.
    Ends(Vec<Vec<usize>>),
}

impl MatchReport {
    /// The mode the report was produced in.
    pub fn mode(&self) -> ReportMode {
        match self {
            MatchReport::Existence(_) => ReportMode::Existence,
            MatchReport::Counts(_) => ReportMode::Counts,
            MatchReport::Ends(_) => ReportMode::Ends,
        }
    }

    /// True if pattern `k` matched at least once.
    pub fn is_match(&self, k: usize) -> bool {
        match self {
            MatchReport::Existence(keys) => keys.binary_search(&k).is_ok(),
            MatchReport::Counts(counts) => counts[k] > 0,
            MatchReport::Ends(ends) => !ends[k].is_empty(),
        }
    }
}

/// Per-pattern accumulator of accepted matches.
///
/// The buffer keeps one slot per dictionary pattern for its whole life;
/// `flush` only resets the slots that were touched so it can be reused
/// across many subjects cheaply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchBuffer {
    mode: ReportMode,
    /// Patterns with at least one match, in order of first match.
    matching_keys: Vec<usize>,
    counts: Vec<u32>,
    /// Only filled in `ReportMode::Ends`.
    ends: Vec<Vec<usize>>,
}

impl MatchBuffer {
    /// An empty buffer for a dictionary of `len` patterns.
    pub fn new(mode: ReportMode, len: usize) -> Self {
        let ends = match mode {
            ReportMode::Ends => vec![Vec::new(); len],
            ReportMode::Existence | ReportMode::Counts => Vec::new(),
        };
        MatchBuffer {
            mode,
            matching_keys: Vec::new(),
            counts: vec![0; len],
            ends,
        }
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Number of patterns the buffer is sized for.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True if nothing has been reported since the last flush.
    pub fn is_empty(&self) -> bool {
        self.matching_keys.is_empty()
    }

    /// Record a match of pattern `key` ending at `end`.
    #[inline]
    pub fn report(&mut self, key: usize, end: usize) {
        if self.counts[key] == 0 {
            self.matching_keys.push(key);
        }
        self.counts[key] += 1;
        if self.mode == ReportMode::Ends {
            self.ends[key].push(end);
        }
    }

    /// Patterns with at least one match, in order of first match.
    pub fn matching_keys(&self) -> &[usize] {
        &self.matching_keys
    }

    /// Number of matches of every pattern.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Number of matches of pattern `key`.
    pub fn count(&self, key: usize) -> u32 {
        self.counts[key]
    }

    /// End positions of `key`, always empty unless the mode is `Ends`.
    pub fn ends(&self, key: usize) -> &[usize] {
        self.ends.get(key).map_or(&[][..], Vec::as_slice)
    }

    /// Forget every match, keeping the sizing.
    pub fn flush(&mut self) {
        for &key in &self.matching_keys {
            self.counts[key] = 0;
            if let Some(ends) = self.ends.get_mut(key) {
                ends.clear();
            }
        }
        self.matching_keys.clear();
    }

    /// Move the matches of `other` into `self`, shifting their end positions
    /// by `offset`, and flush `other`.
    pub fn append_and_flush(&mut self, other: &mut MatchBuffer, offset: usize) {
        assert_eq!(self.len(), other.len());
        assert_eq!(self.mode, other.mode);
        for &key in &other.matching_keys {
            if self.counts[key] == 0 {
                self.matching_keys.push(key);
            }
            self.counts[key] += other.counts[key];
            if self.mode == ReportMode::Ends {
                let shifted = other.ends[key].iter().map(|&end| end + offset);
                self.ends[key].extend(shifted);
            }
        }
        other.flush();
    }

    /// Read the buffer into its report shape, leaving it untouched.
    pub fn materialize(&self) -> MatchReport {
        match self.mode {
            ReportMode::Existence => {
                let mut keys = self.matching_keys.clone();
                keys.sort_unstable();
                MatchReport::Existence(keys)
            }
            ReportMode::Counts => MatchReport::Counts(self.counts.clone()),
            ReportMode::Ends => MatchReport::Ends(
                self.ends
                    .iter()
                    .map(|ends| {
                        let mut ends = ends.clone();
                        ends.sort_unstable();
                        ends
                    })
                    .collect(),
            ),
        }
    }
}
