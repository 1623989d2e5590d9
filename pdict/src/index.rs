// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//! The contract shared by trusted band indexes.
use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// An exact core hit reported by a subject walk: the core of the
/// representative pattern `key` ends at the 1-based subject position `end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateEvent {
    /// 0-based index of the representative pattern.
    pub key: usize,
    /// 1-based subject position of the last core symbol.
    pub end: usize,
}

/// Which patterns share a core with which.
///
/// Among the patterns with identical cores only the first one (the
/// representative) is stored in an index, the others are its duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateMap {
    /// For every pattern, the representative it duplicates, if any.
    dup2unq: Vec<Option<usize>>,
    /// For every pattern, the patterns duplicating it, in dictionary order.
    unq2dups: Vec<Vec<usize>>,
}

impl DuplicateMap {
    pub(crate) fn new(len: usize) -> Self {
        DuplicateMap {
            dup2unq: vec![None; len],
            unq2dups: vec![Vec::new(); len],
        }
    }

    /// Record `dup` as a duplicate of `unq`. `unq` must be a representative.
    pub(crate) fn report_dup(&mut self, dup: usize, unq: usize) {
        debug_assert!(self.dup2unq[unq].is_none());
        self.dup2unq[dup] = Some(unq);
        self.unq2dups[unq].push(dup);
    }

    /// Number of patterns tracked, duplicates included.
    pub fn len(&self) -> usize {
        self.dup2unq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dup2unq.is_empty()
    }

    /// The representative of pattern `k`, `k` itself if it is one.
    pub fn representative(&self, k: usize) -> usize {
        self.dup2unq[k].unwrap_or(k)
    }

    /// True if `k` shares the core of an earlier pattern.
    pub fn is_duplicate(&self, k: usize) -> bool {
        self.dup2unq[k].is_some()
    }

    /// Duplicates of the representative `k`, empty for non-representatives.
    pub fn duplicates(&self, k: usize) -> &[usize] {
        &self.unq2dups[k]
    }

    /// `k` followed by its duplicates: every pattern a hit on `k` applies to.
    pub fn cohort(&self, k: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(k).chain(self.unq2dups[k].iter().copied())
    }

    /// Representative of every pattern, `None` for the representatives themselves.
    pub fn dup2unq(&self) -> &[Option<usize>] {
        &self.dup2unq
    }

    /// Number of patterns that are not representatives.
    pub fn num_duplicates(&self) -> usize {
        self.dup2unq.iter().filter(|d| d.is_some()).count()
    }
}

/// An exact-match index over the constant width cores of a dictionary.
///
/// A query selects its index once; the walk then reports, for every
/// subject position where some core ends, the representative of that core.
pub trait TrustedBandIndex: Send + Sync {
    type Walk<'a>: Iterator<Item = CandidateEvent>
    where
        Self: 'a;

    /// Name used in error messages.
    const NAME: &'static str;

    /// Width of every core.
    fn width(&self) -> usize;

    /// Number of patterns in the dictionary.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn duplicates(&self) -> &DuplicateMap;

    /// Fail if the index cannot match the subject in the requested mode.
    fn check_subject_mode(&self, fixed_subject: bool) -> Result<()>;

    /// Stream `subject` once, yielding core hits in order of end position.
    fn walk<'a>(&'a self, subject: &'a [u8]) -> Self::Walk<'a>;
}
