// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

use crate::match_buf::ReportMode;

/// Result type of every fallible operation in this crate.
pub type Result<T, E = PDictError> = std::result::Result<T, E>;

/// Failures raised while preprocessing a dictionary or running a query.
///
/// Pattern positions in messages are 1-based, subject views are reported
/// with the coordinates the caller supplied.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PDictError {
    #[error("the dictionary is empty, a constant width dictionary needs at least one pattern")]
    EmptyDictionary,

    #[error("a dictionary can hold at most {max} patterns, got {len}")]
    TooManyPatterns { len: usize, max: usize },

    #[error("empty trusted region for pattern {pattern}")]
    EmptyCore { pattern: usize },

    #[error(
        "all the trusted regions must have the same length: pattern {pattern} has width \
         {found} but the dictionary width is {expected}"
    )]
    CoreWidthMismatch {
        pattern: usize,
        expected: usize,
        found: usize,
    },

    #[error("the width of the trusted band must be <= {max} for a Twobit index, got {width}")]
    CoreTooWide { width: usize, max: usize },

    #[error("non-base DNA letter found in trusted band for pattern {pattern}")]
    NonBaseLetter { pattern: usize },

    #[error("{what} has {found} elements but the dictionary has {expected} patterns")]
    PartLengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(
        "trusted band [{start}, {end}] does not select a non-empty region of pattern \
         {pattern} (width {width})"
    )]
    InvalidTrustedBand {
        pattern: usize,
        start: i64,
        end: i64,
        width: usize,
    },

    #[error("base codes must be 4 distinct bytes, got {codes:?}")]
    InvalidBaseCodes { codes: [u8; 4] },

    #[error("'subject' has \"out of limits\" views: view {view} (start={start}, width={width}) exceeds a subject of length {subject_len}")]
    ViewOutOfBounds {
        view: usize,
        start: i64,
        width: usize,
        subject_len: usize,
    },

    #[error("'collapse' must be none (0), by pattern (1) or by subject (2), got {0:?}")]
    InvalidCollapse(String),

    #[error("{axis} collapse needs {expected} weights, got {found}")]
    WeightLengthMismatch {
        axis: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("integer {axis} collapse overflows a 64-bit value at position {index}")]
    CollapseOverflow { axis: &'static str, index: usize },

    #[error(
        "cannot treat IUPAC extended letters in the subject as ambiguities when the \
         dictionary is preprocessed with a {index} index"
    )]
    AmbiguousSubjectUnsupported { index: &'static str },

    #[error("{driver} does not support report mode '{mode}' yet, sorry")]
    UnsupportedReportMode {
        driver: &'static str,
        mode: ReportMode,
    },
}
