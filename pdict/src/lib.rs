// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//! Crate for matching a dictionary of DNA patterns against subject sequences.
//!
//! Every pattern is made of a head, a trusted band (the core) and a tail.
//! All cores have the same width and are matched exactly through a Twobit
//! signature index, while heads and tails may carry a bounded number of
//! mismatches. Patterns sharing a core are validated independently against
//! their own flanks.
//!
//! ```
//! use pdict::{BaseCodes, Dictionary, MatchParams, MatchReport, PDict, ReportMode};
//!
//! let pdict = PDict::new(Dictionary::from_cores(["ACGT", "ACGA"]), BaseCodes::DNA).unwrap();
//! let params = MatchParams::new(0, ReportMode::Ends);
//! assert_eq!(
//!     pdict.match_one(b"TTACGTTT", &params).unwrap(),
//!     MatchReport::Ends(vec![vec![6], vec![]])
//! );
//! ```

pub mod alphabet;
pub mod dictionary;
mod errors;
pub mod extend;
pub mod index;
pub mod match_buf;
pub mod mismatch;
pub mod query;
pub mod twobit;

pub use alphabet::{BaseCodes, TwobitCodec};
pub use dictionary::{Dictionary, Pattern, TrustedBand};
pub use errors::{PDictError, Result};
pub use index::{CandidateEvent, DuplicateMap, TrustedBandIndex};
pub use match_buf::{MatchBuffer, MatchReport, ReportMode};
pub use mismatch::{Fixed, MismatchCounter};
pub use query::{
    Collapse, CollapseAxis, Collapsed, MatchParams, PDict, VMatchReport, View, Weights,
};
pub use twobit::{TwobitIndex, MAX_TWOBIT_WIDTH};
