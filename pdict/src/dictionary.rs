// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//! A dictionary of patterns split into head, trusted band (core) and tail.
use crate::errors::{PDictError, Result};
use serde::{Deserialize, Serialize};

/// One dictionary entry. `head` and `tail` may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    /// Left flank, matched with mismatches.
    pub head: Vec<u8>,
    /// Trusted band, matched exactly.
    pub core: Vec<u8>,
    /// Right flank, matched with mismatches.
    pub tail: Vec<u8>,
}

impl Pattern {
    /// Build a pattern from its three parts.
    pub fn new(head: &[u8], core: &[u8], tail: &[u8]) -> Self {
        Pattern {
            head: head.to_vec(),
            core: core.to_vec(),
            tail: tail.to_vec(),
        }
    }

    /// A pattern without flanks.
    pub fn from_core(core: &[u8]) -> Self {
        Pattern {
            core: core.to_vec(),
            ..Default::default()
        }
    }

    /// Total width of the pattern.
    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.head.len() + self.core.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// head, core and tail concatenated.
    pub fn sequence(&self) -> Vec<u8> {
        [&self.head[..], &self.core, &self.tail].concat()
    }
}

/// Location of the trusted band inside each pattern, 1-based and inclusive.
/// Negative positions count from the end of the pattern, -1 being the last
/// symbol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedBand {
    /// 1-based first position of the band, negative counts from the end.
    pub start: i64,
    /// 1-based last position of the band, negative counts from the end.
    pub end: i64,
}

impl TrustedBand {
    /// Positions are checked against each pattern by `Dictionary::from_trusted_band`.
    pub fn new(start: i64, end: i64) -> Self {
        TrustedBand { start, end }
    }

    /// The 0-based half-open range the band covers on a pattern of `width`.
    fn resolve(&self, width: usize) -> Option<(usize, usize)> {
        let to_offset = |pos: i64| -> Option<i64> {
            match pos {
                0 => None,
                p if p > 0 => Some(p - 1),
                p => Some(width as i64 + p),
            }
        };
        let start = to_offset(self.start)?;
        let end = to_offset(self.end)? + 1;
        if start < 0 || end > width as i64 || start >= end {
            return None;
        }
        Some((start as usize, end as usize))
    }
}

/// An ordered, non-empty collection of patterns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    patterns: Vec<Pattern>,
}

impl Dictionary {
    /// Wrap already split patterns. The patterns are validated when an index
    /// is built on them, not here.
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Dictionary { patterns }
    }

    /// A dictionary without heads or tails.
    pub fn from_cores<I, S>(cores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Dictionary {
            patterns: cores
                .into_iter()
                .map(|c| Pattern::from_core(c.as_ref()))
                .collect(),
        }
    }

    /// Assemble a dictionary from separate lists of heads, cores and tails.
    /// `heads` and `tails`, when given, must have one entry per core.
    pub fn from_parts<S: AsRef<[u8]>>(
        heads: Option<&[S]>,
        cores: &[S],
        tails: Option<&[S]>,
    ) -> Result<Self> {
        let check = |what: &'static str, part: Option<&[S]>| match part {
            Some(p) if p.len() != cores.len() => Err(PDictError::PartLengthMismatch {
                what,
                expected: cores.len(),
                found: p.len(),
            }),
            _ => Ok(()),
        };
        check("head", heads)?;
        check("tail", tails)?;

        let part = |p: Option<&[S]>, i: usize| p.map_or_else(Vec::new, |p| p[i].as_ref().to_vec());
        let patterns = cores
            .iter()
            .enumerate()
            .map(|(i, core)| Pattern {
                head: part(heads, i),
                core: core.as_ref().to_vec(),
                tail: part(tails, i),
            })
            .collect();
        Ok(Dictionary { patterns })
    }

    /// Split full patterns at a trusted band, everything left of the band is
    /// the head and everything right of it the tail.
    pub fn from_trusted_band<I, S>(patterns: I, band: TrustedBand) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let patterns = patterns
            .into_iter()
            .enumerate()
            .map(|(i, seq)| {
                let seq = seq.as_ref();
                let (start, end) = band.resolve(seq.len()).ok_or_else(|| {
                    PDictError::InvalidTrustedBand {
                        pattern: i + 1,
                        start: band.start,
                        end: band.end,
                        width: seq.len(),
                    }
                })?;
                Ok(Pattern::new(&seq[..start], &seq[start..end], &seq[end..]))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Dictionary { patterns })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Pattern `i`, 0-based. Panics if out of range.
    pub fn get(&self, i: usize) -> &Pattern {
        &self.patterns[i]
    }

    /// All patterns, in dictionary order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Iterate over the patterns in dictionary order.
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// True if at least one pattern has a non-empty head or tail.
    pub fn has_flanks(&self) -> bool {
        self.patterns
            .iter()
            .any(|p| !p.head.is_empty() || !p.tail.is_empty())
    }
}

impl FromIterator<Pattern> for Dictionary {
    fn from_iter<T: IntoIterator<Item = Pattern>>(iter: T) -> Self {
        Dictionary {
            patterns: iter.into_iter().collect(),
        }
    }
}
