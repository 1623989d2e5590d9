// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//! The Twobit algorithm for constant width DNA dictionaries.
//!
//! Every core of width W is packed into a signature of 2·W bits, and a table
//! of 4^W slots maps each signature to the pattern owning that core. A
//! subject is then matched in a single pass by rolling the signature of its
//! last W symbols and looking it up at every position.
use crate::alphabet::{BaseCodes, TwobitCodec};
use crate::dictionary::Dictionary;
use crate::errors::{PDictError, Result};
use crate::index::{CandidateEvent, DuplicateMap, TrustedBandIndex};
use log::debug;
use std::num::NonZeroU32;

/// 4^14 slots is the largest table we are willing to allocate.
pub const MAX_TWOBIT_WIDTH: usize = 14;

/// Signature table plus duplicate bookkeeping for one dictionary.
#[derive(Clone, Debug)]
pub struct TwobitIndex {
    width: usize,
    codec: TwobitCodec,
    /// 1-based pattern index of the representative owning each signature.
    sign2pos: Vec<Option<NonZeroU32>>,
    dups: DuplicateMap,
}

impl TwobitIndex {
    /// Preprocess the cores of `dict`.
    ///
    /// The first pattern with a given core becomes its representative, later
    /// ones are recorded as its duplicates.
    pub fn build(dict: &Dictionary, base_codes: BaseCodes) -> Result<Self> {
        if dict.is_empty() {
            return Err(PDictError::EmptyDictionary);
        }
        if dict.len() >= u32::MAX as usize {
            return Err(PDictError::TooManyPatterns {
                len: dict.len(),
                max: u32::MAX as usize - 1,
            });
        }
        let codec = TwobitCodec::new(base_codes);
        let width = dict.get(0).core.len();
        let mut sign2pos: Vec<Option<NonZeroU32>> = Vec::new();
        let mut dups = DuplicateMap::new(dict.len());

        for (poffset, pattern) in dict.iter().enumerate() {
            let core = &pattern.core;
            if core.is_empty() {
                return Err(PDictError::EmptyCore {
                    pattern: poffset + 1,
                });
            }
            if poffset == 0 {
                if width > MAX_TWOBIT_WIDTH {
                    return Err(PDictError::CoreTooWide {
                        width,
                        max: MAX_TWOBIT_WIDTH,
                    });
                }
                sign2pos = vec![None; 1 << (2 * width)];
            } else if core.len() != width {
                return Err(PDictError::CoreWidthMismatch {
                    pattern: poffset + 1,
                    expected: width,
                    found: core.len(),
                });
            }
            let sign = codec
                .signature(core)
                .ok_or(PDictError::NonBaseLetter {
                    pattern: poffset + 1,
                })?;
            let slot = &mut sign2pos[sign as usize];
            match *slot {
                None => *slot = NonZeroU32::new(poffset as u32 + 1),
                Some(pos) => dups.report_dup(poffset, pos.get() as usize - 1),
            }
        }

        debug!(
            "built Twobit index: {} patterns, width {}, {} duplicates",
            dict.len(),
            width,
            dups.num_duplicates()
        );
        Ok(TwobitIndex {
            width,
            codec,
            sign2pos,
            dups,
        })
    }

    /// The representative pattern owning `sign`, if any.
    #[inline]
    pub fn get(&self, sign: u32) -> Option<usize> {
        self.sign2pos
            .get(sign as usize)
            .copied()
            .flatten()
            .map(|pos| pos.get() as usize - 1)
    }

    /// The representative pattern whose core is `core`, if any.
    pub fn lookup(&self, core: &[u8]) -> Option<usize> {
        if core.len() != self.width {
            return None;
        }
        self.get(self.codec.signature(core)?)
    }

    /// The codec used to build the index, and to walk subjects.
    pub fn codec(&self) -> &TwobitCodec {
        &self.codec
    }

    /// Number of slots in the signature table, 4^width.
    pub fn table_len(&self) -> usize {
        self.sign2pos.len()
    }

    /// Patterns owning a table slot, in increasing order.
    pub fn representatives(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.dups.len()).filter(|&k| !self.dups.is_duplicate(k))
    }

    /// Representative of every duplicate pattern.
    pub fn dup2unq(&self) -> &[Option<usize>] {
        self.dups.dup2unq()
    }
}

impl TrustedBandIndex for TwobitIndex {
    type Walk<'a> = TwobitWalk<'a>;

    const NAME: &'static str = "Twobit";

    fn width(&self) -> usize {
        self.width
    }

    fn len(&self) -> usize {
        self.dups.len()
    }

    fn duplicates(&self) -> &DuplicateMap {
        &self.dups
    }

    fn check_subject_mode(&self, fixed_subject: bool) -> Result<()> {
        if fixed_subject {
            Ok(())
        } else {
            Err(PDictError::AmbiguousSubjectUnsupported { index: Self::NAME })
        }
    }

    fn walk<'a>(&'a self, subject: &'a [u8]) -> TwobitWalk<'a> {
        TwobitWalk {
            index: self,
            subject,
            pos: 0,
            sign: 0,
            mask: (1u32 << (2 * self.width)).wrapping_sub(1),
            nb_valid_left_char: 0,
        }
    }
}

/// Iterator over the core hits of one subject.
pub struct TwobitWalk<'a> {
    index: &'a TwobitIndex,
    subject: &'a [u8],
    /// Number of subject symbols consumed so far.
    pos: usize,
    sign: u32,
    mask: u32,
    /// Length of the run of base symbols ending at `pos`.
    nb_valid_left_char: usize,
}

impl Iterator for TwobitWalk<'_> {
    type Item = CandidateEvent;

    fn next(&mut self) -> Option<CandidateEvent> {
        let index = self.index;
        while self.pos < self.subject.len() {
            let c = self.subject[self.pos];
            self.pos += 1;
            let Some(twobit) = index.codec.encode(c) else {
                self.nb_valid_left_char = 0;
                continue;
            };
            self.nb_valid_left_char += 1;
            self.sign = ((self.sign << 2) | u32::from(twobit)) & self.mask;
            if self.nb_valid_left_char < index.width {
                continue;
            }
            if let Some(key) = index.get(self.sign) {
                return Some(CandidateEvent { key, end: self.pos });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.subject.len() - self.pos))
    }
}
