// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

use clap::Parser;
use match_pdict::{run, write_output, Args, QueryResult};
use pdict::{Collapsed, MatchReport, VMatchReport};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Parameters file with every default, so that no stray
    /// match_pdict.toml next to the test binary is picked up.
    fn params(&self) -> PathBuf {
        self.file("params.toml", "")
    }
}

fn args(params: &Path, dict: &Path, subjects: &Path, extra: &[&str]) -> Args {
    let mut argv = vec![
        "match_pdict".to_string(),
        "--params".to_string(),
        params.display().to_string(),
        "--dict".to_string(),
        dict.display().to_string(),
        "--subjects".to_string(),
        subjects.display().to_string(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    Args::try_parse_from(argv).unwrap()
}

#[test]
fn test_single_subject_ends() {
    let fx = Fixture::new();
    let dict = fx.file("dict.csv", "id,head,core,tail\nfwd,AC,GT,\nother,,GA,\n");
    let subjects = fx.file("reads.fa", ">read1\nTTACGTTT\n");
    let out = fx.path("out.json");
    let args = args(
        &fx.params(),
        &dict,
        &subjects,
        &["--report", "ends", "--out", out.to_str().unwrap()],
    );

    let output = run(&args).unwrap();
    assert_eq!(
        output.result,
        QueryResult::Single(MatchReport::Ends(vec![vec![6], vec![]]))
    );
    write_output(&args, &output).unwrap();

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["patterns"], json!(["fwd", "other"]));
    assert_eq!(json["subjects"], json!(["read1"]));
    assert_eq!(
        json["result"],
        json!({"mode": "ends", "matches": [[6], []]})
    );
    assert_eq!(json["params"]["max_mismatch"], json!(0));
}

#[test]
fn test_trusted_band_and_mismatches() {
    let fx = Fixture::new();
    let dict = fx.file("dict.csv", "sequence\nAACGTT\nGACGTC\n");
    let subjects = fx.file("reads.fa", ">r\nCAACGTTG\n");
    let params = fx.file("params.toml", "max_mismatch = 2\n");
    let output = run(&args(
        &params,
        &dict,
        &subjects,
        &["--tb-start", "2", "--tb-end", "-2", "--report", "existence"],
    ))
    .unwrap();
    assert_eq!(
        output.result,
        QueryResult::Single(MatchReport::Existence(vec![0, 1]))
    );

    // The command line wins over the parameters file.
    let output = run(&args(
        &params,
        &dict,
        &subjects,
        &[
            "--tb-start",
            "2",
            "--tb-end",
            "-2",
            "--report",
            "existence",
            "--max-mismatch",
            "0",
        ],
    ))
    .unwrap();
    assert_eq!(
        output.result,
        QueryResult::Single(MatchReport::Existence(vec![0]))
    );
}

#[test]
fn test_windowed() {
    let fx = Fixture::new();
    let dict = fx.file("dict.csv", "core\nACGT\n");
    let subjects = fx.file("reads.fa", ">r\nACGTTTACGT\n");
    let output = run(&args(
        &fx.params(),
        &dict,
        &subjects,
        &["--report", "ends", "--views", "1:4,3:8"],
    ))
    .unwrap();
    assert_eq!(
        output.result,
        QueryResult::Single(MatchReport::Ends(vec![vec![4, 10]]))
    );

    let err = run(&args(
        &fx.params(),
        &dict,
        &subjects,
        &["--views", "8:4"],
    ))
    .unwrap_err();
    assert!(err.to_string().contains("out of limits"));
}

#[test]
fn test_many_subjects_counts_and_npy() {
    let fx = Fixture::new();
    let dict = fx.file("dict.csv", "core\nAC\nGT\n");
    let subjects = fx.file("reads.fa", ">a\nACAC\n>b\nGTAC\n>c\nTTTT\n");
    let npy = fx.path("counts.npy");
    let out = fx.path("out.json");
    let args = args(
        &fx.params(),
        &dict,
        &subjects,
        &[
            "--threads",
            "2",
            "--npy",
            npy.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ],
    );
    let output = run(&args).unwrap();
    assert_eq!(output.subjects, vec!["a", "b", "c"]);
    assert_eq!(
        output.result,
        QueryResult::Many(VMatchReport::Counts(ndarray::arr2(&[
            [2, 1, 0],
            [0, 1, 0]
        ])))
    );
    write_output(&args, &output).unwrap();
    let counts: ndarray::Array2<u32> = ndarray_npy::read_npy(&npy).unwrap();
    assert_eq!(counts, ndarray::arr2(&[[2, 1, 0], [0, 1, 0]]));

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["subjects"], json!(["a", "b", "c"]));
    assert_eq!(json["result"]["counts"]["dim"], json!([2, 3]));
}

#[test]
fn test_collapse() {
    let fx = Fixture::new();
    let dict = fx.file("dict.csv", "core\nAC\nGT\n");
    let subjects = fx.file("reads.fa", ">a\nACAC\n>b\nGTAC\n>c\nTTTT\n");
    let weights = fx.file("weights.txt", "1\n10\n100\n");
    let output = run(&args(
        &fx.params(),
        &dict,
        &subjects,
        &["--collapse", "by-pattern", "--weights", weights.to_str().unwrap()],
    ))
    .unwrap();
    assert_eq!(
        output.result,
        QueryResult::Many(VMatchReport::Collapsed(Collapsed::Int(vec![12, 10])))
    );

    let weights = fx.file("weights.txt", "0.5\n2\n");
    let output = run(&args(
        &fx.params(),
        &dict,
        &subjects,
        &["--collapse", "by-subject", "--weights", weights.to_str().unwrap()],
    ))
    .unwrap();
    assert_eq!(
        output.result,
        QueryResult::Many(VMatchReport::Collapsed(Collapsed::Float(vec![
            1.0, 2.5, 0.0
        ])))
    );

    // Collapsing only applies to counts.
    assert!(run(&args(
        &fx.params(),
        &dict,
        &subjects,
        &[
            "--collapse",
            "1",
            "--weights",
            weights.to_str().unwrap(),
            "--report",
            "ends"
        ],
    ))
    .is_err());
}

#[test]
fn test_preprocessing_errors() {
    let fx = Fixture::new();
    let subjects = fx.file("reads.fa", ">r\nACGT\n");

    let dict = fx.file("dict.csv", "core\nACG\nACGT\n");
    let err = run(&args(&fx.params(), &dict, &subjects, &[])).unwrap_err();
    assert!(format!("{err:#}").contains("same length"));

    let dict = fx.file("dict.csv", "core\nANGT\n");
    let err = run(&args(&fx.params(), &dict, &subjects, &[])).unwrap_err();
    assert!(format!("{err:#}").contains("non-base DNA letter"));

    // RNA codes reject T in the trusted band.
    let dict = fx.file("dict.csv", "core\nACGT\n");
    assert!(run(&args(&fx.params(), &dict, &subjects, &["--bases", "ACGU"])).is_err());
}
