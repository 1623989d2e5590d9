// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//! Bounded mismatch counting between a pattern region and a subject.
use crate::alphabet::iupac_mask;
use serde::{Deserialize, Serialize};

/// Whether each side of a comparison is taken literally (`true`) or with its
/// IUPAC letters treated as ambiguities (`false`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixed {
    /// Compare pattern letters literally rather than as IUPAC codes.
    pub pattern: bool,
    /// Compare subject letters literally rather than as IUPAC codes.
    pub subject: bool,
}

impl Fixed {
    /// Literal comparison on both sides.
    pub const BOTH: Fixed = Fixed {
        pattern: true,
        subject: true,
    };

    /// Per-side choice between literal and IUPAC comparison.
    pub fn new(pattern: bool, subject: bool) -> Self {
        Fixed { pattern, subject }
    }
}

impl Default for Fixed {
    fn default() -> Self {
        Fixed::BOTH
    }
}

/// Comparator selected once per query from the `Fixed` flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MismatchCounter {
    /// Bytes must be equal.
    FixedPFixedS,
    /// Ambiguity codes in the subject match any base they stand for.
    FixedPNonFixedS,
    /// Ambiguity codes in the pattern match any base they stand for.
    NonFixedPFixedS,
    /// Two ambiguity codes match if they share a base.
    NonFixedPNonFixedS,
}

impl From<Fixed> for MismatchCounter {
    fn from(fixed: Fixed) -> Self {
        match (fixed.pattern, fixed.subject) {
            (true, true) => MismatchCounter::FixedPFixedS,
            (true, false) => MismatchCounter::FixedPNonFixedS,
            (false, true) => MismatchCounter::NonFixedPFixedS,
            (false, false) => MismatchCounter::NonFixedPNonFixedS,
        }
    }
}

impl MismatchCounter {
    /// True if pattern symbol `p` matches subject symbol `s`.
    #[inline]
    pub fn matches(self, p: u8, s: u8) -> bool {
        if p == s {
            return true;
        }
        if self == MismatchCounter::FixedPFixedS {
            return false;
        }
        let (pm, sm) = (iupac_mask(p), iupac_mask(s));
        // Bytes outside the IUPAC alphabet only match themselves.
        if pm == 0 || sm == 0 {
            return false;
        }
        match self {
            MismatchCounter::FixedPFixedS => false,
            MismatchCounter::FixedPNonFixedS => pm & !sm == 0,
            MismatchCounter::NonFixedPFixedS => !pm & sm == 0,
            MismatchCounter::NonFixedPNonFixedS => pm & sm != 0,
        }
    }

    /// Count the mismatches of `pattern` placed at 0-based offset `shift` of
    /// `subject`. Pattern symbols falling outside the subject are mismatches.
    ///
    /// Returns `None` as soon as the count exceeds `max_mm`.
    pub fn count(
        self,
        pattern: &[u8],
        subject: &[u8],
        shift: isize,
        max_mm: usize,
    ) -> Option<usize> {
        let mut nmismatch = 0;
        for (i, &p) in pattern.iter().enumerate() {
            let j = shift + i as isize;
            let hit = j >= 0
                && (j as usize) < subject.len()
                && self.matches(p, subject[j as usize]);
            if hit {
                continue;
            }
            if nmismatch == max_mm {
                return None;
            }
            nmismatch += 1;
        }
        Some(nmismatch)
    }
}
