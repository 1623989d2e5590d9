// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//! Inexact matching of the heads and tails around exact core hits.
use crate::dictionary::Dictionary;
use crate::index::{CandidateEvent, DuplicateMap};
use crate::match_buf::MatchBuffer;
use crate::mismatch::MismatchCounter;

/// Validates core hits against the flanks of every pattern sharing the core.
///
/// This step also runs for dictionaries without heads and tails, it is what
/// turns a hit on a representative into a match of each of its duplicates.
#[derive(Copy, Clone, Debug)]
pub struct FlankExtender<'a> {
    dict: &'a Dictionary,
    dups: &'a DuplicateMap,
    width: usize,
    counter: MismatchCounter,
    max_mm: usize,
}

impl<'a> FlankExtender<'a> {
    /// `max_mm` is the budget shared by the head and the tail.
    pub fn new(
        dict: &'a Dictionary,
        dups: &'a DuplicateMap,
        width: usize,
        counter: MismatchCounter,
        max_mm: usize,
    ) -> Self {
        FlankExtender {
            dict,
            dups,
            width,
            counter,
            max_mm,
        }
    }

    /// Mismatches in the head and tail of pattern `k` when its core ends at
    /// the 1-based position `tshift` of `subject`. `None` once the budget is
    /// exceeded.
    pub fn nmismatch_in_headtail(&self, k: usize, subject: &[u8], tshift: usize) -> Option<usize> {
        let pattern = self.dict.get(k);
        let hshift = tshift as isize - (self.width + pattern.head.len()) as isize;
        let head_mm = self
            .counter
            .count(&pattern.head, subject, hshift, self.max_mm)?;
        let tail_mm = self.counter.count(
            &pattern.tail,
            subject,
            tshift as isize,
            self.max_mm - head_mm,
        )?;
        Some(head_mm + tail_mm)
    }

    /// Report, for the representative of `event` and each of its duplicates,
    /// a match at `event.end` if its flanks fit the mismatch budget.
    pub fn extend(&self, event: CandidateEvent, subject: &[u8], buf: &mut MatchBuffer) {
        for k in self.dups.cohort(event.key) {
            if self.nmismatch_in_headtail(k, subject, event.end).is_some() {
                buf.report(k, event.end);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::alphabet::BaseCodes;
    use crate::dictionary::Pattern;
    use crate::index::TrustedBandIndex;
    use crate::match_buf::{MatchReport, ReportMode};
    use crate::mismatch::Fixed;
    use crate::twobit::TwobitIndex;
    use pretty_assertions::assert_eq;

    fn run(dict: &Dictionary, subject: &[u8], max_mm: usize) -> MatchReport {
        let index = TwobitIndex::build(dict, BaseCodes::DNA).unwrap();
        let extender = FlankExtender::new(
            dict,
            index.duplicates(),
            index.width(),
            MismatchCounter::from(Fixed::BOTH),
            max_mm,
        );
        let mut buf = MatchBuffer::new(ReportMode::Ends, dict.len());
        for event in index.walk(subject) {
            extender.extend(event, subject, &mut buf);
        }
        buf.materialize()
    }

    #[test]
    fn test_head() {
        let dict = Dictionary::new(vec![Pattern::new(b"AC", b"GT", b"")]);
        assert_eq!(run(&dict, b"TTACGTTT", 1), MatchReport::Ends(vec![vec![6]]));
        assert_eq!(run(&dict, b"TTACGTTT", 0), MatchReport::Ends(vec![vec![6]]));
        assert_eq!(run(&dict, b"TTAAGTTT", 0), MatchReport::Ends(vec![vec![]]));
        assert_eq!(run(&dict, b"TTAAGTTT", 1), MatchReport::Ends(vec![vec![6]]));
    }

    #[test]
    fn test_head_and_tail_share_budget() {
        let dict = Dictionary::new(vec![Pattern::new(b"AA", b"CG", b"TT")]);
        // One mismatch in the head, one in the tail.
        assert_eq!(run(&dict, b"ATCGTA", 1), MatchReport::Ends(vec![vec![]]));
        assert_eq!(run(&dict, b"ATCGTA", 2), MatchReport::Ends(vec![vec![4]]));
    }

    #[test]
    fn test_flanks_off_the_subject() {
        let dict = Dictionary::new(vec![Pattern::new(b"TTT", b"ACG", b"AA")]);
        // The head hangs two symbols off the left end, the tail is complete.
        assert_eq!(run(&dict, b"TACGAA", 1), MatchReport::Ends(vec![vec![]]));
        assert_eq!(run(&dict, b"TACGAA", 2), MatchReport::Ends(vec![vec![4]]));
        // The tail hangs one symbol off the right end.
        assert_eq!(run(&dict, b"TTTACGA", 0), MatchReport::Ends(vec![vec![]]));
        assert_eq!(run(&dict, b"TTTACGA", 1), MatchReport::Ends(vec![vec![6]]));
    }

    #[test]
    fn test_duplicates_are_validated_independently() {
        let dict = Dictionary::new(vec![
            Pattern::new(b"", b"ACGT", b"AAA"),
            Pattern::new(b"", b"ACGT", b"CCC"),
            Pattern::new(b"", b"ACGT", b""),
        ]);
        assert_eq!(
            run(&dict, b"GACGTAAAT", 0),
            MatchReport::Ends(vec![vec![5], vec![], vec![5]])
        );
        assert_eq!(
            run(&dict, b"GACGTCCCT", 0),
            MatchReport::Ends(vec![vec![], vec![5], vec![5]])
        );
    }

    #[test]
    fn test_duplicates_without_flanks() {
        let dict = Dictionary::from_cores(["ACGT", "TTTT", "ACGT"]);
        assert_eq!(
            run(&dict, b"ACGTTTTT", 0),
            MatchReport::Ends(vec![vec![4], vec![7, 8], vec![4]])
        );
    }
}
