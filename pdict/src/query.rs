// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//!
//! Query drivers: match one subject, views of one subject, or many subjects
//! against a preprocessed dictionary.
//!
use crate::alphabet::BaseCodes;
use crate::dictionary::Dictionary;
use crate::errors::{PDictError, Result};
use crate::extend::FlankExtender;
use crate::index::TrustedBandIndex;
use crate::match_buf::{MatchBuffer, MatchReport, ReportMode};
use crate::mismatch::{Fixed, MismatchCounter};
use crate::twobit::TwobitIndex;
use log::debug;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::Display;

/// Per-query settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// Mismatches tolerated in the head and tail combined. The core is
    /// always matched exactly.
    pub max_mismatch: usize,
    pub fixed: Fixed,
    pub report: ReportMode,
}

impl Default for MatchParams {
    fn default() -> Self {
        MatchParams {
            max_mismatch: 0,
            fixed: Fixed::BOTH,
            report: ReportMode::Counts,
        }
    }
}

impl MatchParams {
    /// Literal comparison on both sides with the given budget and report.
    pub fn new(max_mismatch: usize, report: ReportMode) -> Self {
        MatchParams {
            max_mismatch,
            report,
            ..Default::default()
        }
    }

    /// Replace the comparison mode.
    pub fn with_fixed(self, fixed: Fixed) -> Self {
        MatchParams { fixed, ..self }
    }
}

/// A window of a subject: 1-based `start` and `width`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct View {
    /// 1-based position of the first byte.
    pub start: i64,
    /// Number of bytes covered.
    pub width: usize,
}

impl View {
    /// A view of `width` bytes starting at the 1-based `start`.
    pub fn new(start: i64, width: usize) -> Self {
        View { start, width }
    }

    /// The bytes of `subject` covered by the view, `None` if the view does
    /// not fit inside the subject.
    pub fn slice<'a>(&self, subject: &'a [u8]) -> Option<&'a [u8]> {
        let offset = usize::try_from(self.start.checked_sub(1)?).ok()?;
        subject.get(offset..offset.checked_add(self.width)?)
    }

    /// 0-based position of the first byte of the view.
    fn offset(&self) -> usize {
        (self.start - 1) as usize
    }
}

/// The axis a pattern × subject count matrix is reduced along.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CollapseAxis {
    /// One value per pattern, summing over subjects weighted per subject.
    ByPattern,
    /// One value per subject, summing over patterns weighted per pattern.
    BySubject,
}

impl CollapseAxis {
    /// Decode the integer convention: 0 for no collapse, 1 by pattern,
    /// 2 by subject.
    pub fn from_code(code: i64) -> Result<Option<CollapseAxis>> {
        match code {
            0 => Ok(None),
            1 => Ok(Some(CollapseAxis::ByPattern)),
            2 => Ok(Some(CollapseAxis::BySubject)),
            _ => Err(PDictError::InvalidCollapse(code.to_string())),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            CollapseAxis::ByPattern => "by pattern",
            CollapseAxis::BySubject => "by subject",
        }
    }
}

impl FromStr for CollapseAxis {
    type Err = PDictError;

    fn from_str(s: &str) -> Result<CollapseAxis> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "by_pattern" | "1" => Ok(CollapseAxis::ByPattern),
            "by_subject" | "2" => Ok(CollapseAxis::BySubject),
            _ => Err(PDictError::InvalidCollapse(s.to_string())),
        }
    }
}

/// Collapse weights; their kind selects the kind of the collapsed result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Weights {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl Weights {
    /// Number of patterns, duplicates included.
    /// Number of weights.
    pub fn len(&self) -> usize {
        match self {
            Weights::Int(w) => w.len(),
            Weights::Float(w) => w.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How to reduce the patterns × subjects count matrix to a vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collapse {
    /// The axis that is kept.
    pub axis: CollapseAxis,
    /// One weight per element of the axis that is summed over.
    pub weights: Weights,
}

/// A weighted count vector, integer or floating like its weights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Collapsed {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

/// Result of matching many subjects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VMatchReport {
    /// One report per subject, for the existence and ends modes.
    PerSubject(Vec<MatchReport>),
    /// Patterns × subjects match counts.
    Counts(Array2<u32>),
    Collapsed(Collapsed),
}

/// A dictionary together with its preprocessed trusted band.
#[derive(Clone, Debug)]
pub struct PDict<I = TwobitIndex> {
    dict: Dictionary,
    index: I,
}

impl PDict<TwobitIndex> {
    /// Preprocess `dict` with the Twobit algorithm.
    pub fn new(dict: Dictionary, base_codes: BaseCodes) -> Result<Self> {
        let index = TwobitIndex::build(&dict, base_codes)?;
        Ok(PDict { dict, index })
    }
}

impl<I: TrustedBandIndex> PDict<I> {
    /// Pair a dictionary with an index built on its cores elsewhere.
    pub fn with_index(dict: Dictionary, index: I) -> Result<Self> {
        if index.len() != dict.len() {
            return Err(PDictError::PartLengthMismatch {
                what: "index",
                expected: dict.len(),
                found: index.len(),
            });
        }
        Ok(PDict { dict, index })
    }

    /// The dictionary the index was built from.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    /// The preprocessed trusted band.
    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    /// Width of the trusted band.
    pub fn width(&self) -> usize {
        self.index.width()
    }

    /// A buffer sized for this dictionary.
    pub fn buffer(&self, mode: ReportMode) -> MatchBuffer {
        MatchBuffer::new(mode, self.len())
    }

    fn query_unit(&self, params: &MatchParams) -> Result<QueryUnit<'_, I>> {
        self.index.check_subject_mode(params.fixed.subject)?;
        Ok(QueryUnit {
            index: &self.index,
            extender: FlankExtender::new(
                &self.dict,
                self.index.duplicates(),
                self.index.width(),
                MismatchCounter::from(params.fixed),
                params.max_mismatch,
            ),
        })
    }

    /// Add the matches found in `subject` to `buf`.
    pub fn match_into(
        &self,
        subject: &[u8],
        params: &MatchParams,
        buf: &mut MatchBuffer,
    ) -> Result<()> {
        self.query_unit(params)?.run(subject, buf);
        Ok(())
    }

    /// Match a single subject.
    pub fn match_one(&self, subject: &[u8], params: &MatchParams) -> Result<MatchReport> {
        let mut buf = self.buffer(params.report);
        self.match_into(subject, params, &mut buf)?;
        Ok(buf.materialize())
    }

    /// Match every view of `subject` and report the matches of all views
    /// together, with end positions relative to `subject`.
    ///
    /// Flanks are only compared within the view they belong to.
    pub fn match_windowed(
        &self,
        subject: &[u8],
        views: &[View],
        params: &MatchParams,
    ) -> Result<MatchReport> {
        let unit = self.query_unit(params)?;
        let slices = views
            .iter()
            .enumerate()
            .map(|(i, view)| {
                view.slice(subject).ok_or(PDictError::ViewOutOfBounds {
                    view: i + 1,
                    start: view.start,
                    width: view.width,
                    subject_len: subject.len(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut global = self.buffer(params.report);
        let mut buf = self.buffer(params.report);
        for (view, slice) in views.iter().zip(slices) {
            unit.run(slice, &mut buf);
            global.append_and_flush(&mut buf, view.offset());
        }
        Ok(global.materialize())
    }

    fn check_vmatch(
        &self,
        n_subjects: usize,
        params: &MatchParams,
        collapse: Option<&Collapse>,
    ) -> Result<()> {
        let Some(collapse) = collapse else {
            return Ok(());
        };
        if params.report != ReportMode::Counts {
            return Err(PDictError::UnsupportedReportMode {
                driver: "collapsed vectorized matching",
                mode: params.report,
            });
        }
        let expected = match collapse.axis {
            CollapseAxis::ByPattern => n_subjects,
            CollapseAxis::BySubject => self.len(),
        };
        if collapse.weights.len() != expected {
            return Err(PDictError::WeightLengthMismatch {
                axis: collapse.axis.describe(),
                expected,
                found: collapse.weights.len(),
            });
        }
        Ok(())
    }

    /// Match each of `subjects` independently.
    ///
    /// Existence and ends are reported per subject. Counts are reported as a
    /// patterns × subjects matrix, or reduced to a vector when `collapse`
    /// is given.
    pub fn match_many<S: AsRef<[u8]>>(
        &self,
        subjects: &[S],
        params: &MatchParams,
        collapse: Option<&Collapse>,
    ) -> Result<VMatchReport> {
        self.check_vmatch(subjects.len(), params, collapse)?;
        let unit = self.query_unit(params)?;

        let mut assembler = Assembler::new(self.len(), subjects.len(), params.report, collapse);
        let mut buf = self.buffer(params.report);
        for (j, subject) in subjects.iter().enumerate() {
            unit.run(subject.as_ref(), &mut buf);
            assembler.push(j, SubjectMatches::take(&buf))?;
            buf.flush();
        }
        debug!(
            "matched {} subjects against {} patterns",
            subjects.len(),
            self.len()
        );
        Ok(assembler.finish())
    }

    /// Same as `match_many`, matching the subjects in parallel on the
    /// current rayon thread pool.
    ///
    /// Every worker reuses one buffer, and only the matches of each subject
    /// are kept until the result is assembled in subject order.
    pub fn par_match_many<S: AsRef<[u8]> + Sync>(
        &self,
        subjects: &[S],
        params: &MatchParams,
        collapse: Option<&Collapse>,
    ) -> Result<VMatchReport> {
        self.check_vmatch(subjects.len(), params, collapse)?;
        let unit = self.query_unit(params)?;

        let matches: Vec<SubjectMatches> = subjects
            .par_iter()
            .map_init(
                || self.buffer(params.report),
                |buf, subject| {
                    unit.run(subject.as_ref(), buf);
                    let matches = SubjectMatches::take(buf);
                    buf.flush();
                    matches
                },
            )
            .collect();

        let mut assembler = Assembler::new(self.len(), subjects.len(), params.report, collapse);
        for (j, m) in matches.into_iter().enumerate() {
            assembler.push(j, m)?;
        }
        debug!(
            "matched {} subjects against {} patterns on {} threads",
            subjects.len(),
            self.len(),
            rayon::current_num_threads()
        );
        Ok(assembler.finish())
    }
}

/// The state needed to match one subject, set up once per query.
struct QueryUnit<'a, I> {
    index: &'a I,
    extender: FlankExtender<'a>,
}

impl<I: TrustedBandIndex> QueryUnit<'_, I> {
    fn run(&self, subject: &[u8], buf: &mut MatchBuffer) {
        for event in self.index.walk(subject) {
            self.extender.extend(event, subject, buf);
        }
    }
}

/// What a vectorized query keeps of one subject before its buffer is flushed.
enum SubjectMatches {
    Report(MatchReport),
    /// `(pattern, count)` for every pattern that matched.
    Counts(Vec<(usize, u32)>),
}

impl SubjectMatches {
    fn take(buf: &MatchBuffer) -> Self {
        match buf.mode() {
            ReportMode::Counts => SubjectMatches::Counts(
                buf.matching_keys()
                    .iter()
                    .map(|&key| (key, buf.count(key)))
                    .collect(),
            ),
            ReportMode::Existence | ReportMode::Ends => SubjectMatches::Report(buf.materialize()),
        }
    }
}

/// Collects the per-subject matches of a vectorized query into its result.
enum Assembler<'a> {
    PerSubject(Vec<MatchReport>),
    Counts(Array2<u32>),
    Collapse {
        axis: CollapseAxis,
        weights: &'a Weights,
        ans: Collapsed,
    },
}

impl<'a> Assembler<'a> {
    fn new(
        n_patterns: usize,
        n_subjects: usize,
        mode: ReportMode,
        collapse: Option<&'a Collapse>,
    ) -> Self {
        match (mode, collapse) {
            (ReportMode::Counts, Some(collapse)) => {
                let len = match collapse.axis {
                    CollapseAxis::ByPattern => n_patterns,
                    CollapseAxis::BySubject => n_subjects,
                };
                let ans = match collapse.weights {
                    Weights::Int(_) => Collapsed::Int(vec![0; len]),
                    Weights::Float(_) => Collapsed::Float(vec![0.0; len]),
                };
                Assembler::Collapse {
                    axis: collapse.axis,
                    weights: &collapse.weights,
                    ans,
                }
            }
            (ReportMode::Counts, None) => {
                Assembler::Counts(Array2::zeros((n_patterns, n_subjects)))
            }
            (ReportMode::Existence | ReportMode::Ends, _) => {
                Assembler::PerSubject(Vec::with_capacity(n_subjects))
            }
        }
    }

    fn push(&mut self, j: usize, matches: SubjectMatches) -> Result<()> {
        match (self, matches) {
            (Assembler::PerSubject(reports), SubjectMatches::Report(report)) => {
                reports.push(report);
            }
            (Assembler::Counts(matrix), SubjectMatches::Counts(hits)) => {
                let mut column = matrix.column_mut(j);
                for (key, count) in hits {
                    column[key] = count;
                }
            }
            (Assembler::Collapse { axis, weights, ans }, SubjectMatches::Counts(hits)) => {
                match (weights, ans) {
                    (Weights::Int(w), Collapsed::Int(ans)) => {
                        accumulate(ans, *axis, w, j, &hits)?
                    }
                    (Weights::Float(w), Collapsed::Float(ans)) => {
                        accumulate(ans, *axis, w, j, &hits)?
                    }
                    _ => unreachable!("collapsed result kind follows the weights kind"),
                }
            }
            _ => unreachable!("subject matches follow the report mode"),
        }
        Ok(())
    }

    fn finish(self) -> VMatchReport {
        match self {
            Assembler::PerSubject(reports) => VMatchReport::PerSubject(reports),
            Assembler::Counts(matrix) => VMatchReport::Counts(matrix),
            Assembler::Collapse { ans, .. } => VMatchReport::Collapsed(ans),
        }
    }
}

/// Weighted count arithmetic. Integer sums fail on overflow rather than wrap.
trait CollapseWeight: Copy {
    fn weighted_add(self, count: u32, weight: Self) -> Option<Self>;
}

impl CollapseWeight for i64 {
    fn weighted_add(self, count: u32, weight: i64) -> Option<i64> {
        i64::from(count).checked_mul(weight)?.checked_add(self)
    }
}

impl CollapseWeight for f64 {
    fn weighted_add(self, count: u32, weight: f64) -> Option<f64> {
        Some(self + f64::from(count) * weight)
    }
}

/// Add the weighted counts of subject `j` to `ans`.
fn accumulate<T: CollapseWeight>(
    ans: &mut [T],
    axis: CollapseAxis,
    weights: &[T],
    j: usize,
    hits: &[(usize, u32)],
) -> Result<()> {
    for &(i, count) in hits {
        let (slot, weight) = match axis {
            CollapseAxis::ByPattern => (i, weights[j]),
            CollapseAxis::BySubject => (j, weights[i]),
        };
        ans[slot] = ans[slot]
            .weighted_add(count, weight)
            .ok_or(PDictError::CollapseOverflow {
                axis: axis.describe(),
                index: slot + 1,
            })?;
    }
    Ok(())
}
