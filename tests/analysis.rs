use std::collections::HashMap;
use std::sync::Mutex;

use approx::assert_abs_diff_eq;
use polars::prelude::*;
use semspec::{FitRequest, FitStats, ParamEstimate, SemEngine, SemFit};
use twinsem::analysis::fit_twin_model;
use twinsem::builder::build_from_labels;
use twinsem::decompose::decompose;
use twinsem::family::Family;
use twinsem::group::resolve;
use twinsem::summary::{chisq_pvalue, shares_table, summary_tables};
use twinsem::types::{Component, Sex};

/// Answers every labeled row of the request from a fixed table of estimates.
struct TableEngine {
    estimates: HashMap<String, f64>,
    converged: bool,
    seen: Mutex<Vec<String>>,
}

impl TableEngine {
    fn new(estimates: &[(&str, f64)]) -> Self {
        Self {
            estimates: estimates
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            converged: true,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl SemEngine for TableEngine {
    fn fit(&self, request: &FitRequest) -> anyhow::Result<SemFit> {
        self.seen
            .lock()
            .expect("lock")
            .extend(request.group_labels.iter().cloned());
        let params = request
            .par_table
            .iter()
            .filter(|r| r.op != ":=")
            .map(|r| {
                let est = match &r.label {
                    Some(label) => self.estimates.get(label).copied().unwrap_or(f64::NAN),
                    None => r.ustart,
                };
                ParamEstimate {
                    lhs: r.lhs.clone(),
                    op: r.op.clone(),
                    rhs: r.rhs.clone(),
                    group: r.group,
                    label: r.label.clone(),
                    free: r.free,
                    est,
                    se: if r.free > 0 { 0.05 } else { 0.0 },
                }
            })
            .collect();
        Ok(SemFit {
            params,
            defined: Vec::new(),
            stats: FitStats {
                chisq: 3.84,
                df: 1,
                p_chisq: f64::NAN,
                cfi: 0.99,
                rmsea: 0.02,
            },
            converged: self.converged,
            iterations: 12,
            npar: 4,
            warnings: vec!["heywood case".to_string()],
        })
    }
}

struct FailingEngine;

impl SemEngine for FailingEngine {
    fn fit(&self, _request: &FitRequest) -> anyhow::Result<SemFit> {
        Err(anyhow::anyhow!("sample covariance matrix is singular"))
    }
}

fn pairs() -> DataFrame {
    df!(
        "zyg" => ["DZ", "MZ", "DZ", "MZ"],
        "P1" => [0.1, -0.3, 1.2, 0.4],
        "P2" => [0.5, -0.1, 0.9, 0.2]
    )
    .expect("frame")
}

#[test]
fn fit_aligns_to_data_and_decomposes() {
    let spec = build_from_labels(Family::Ace, &["MZ", "DZ"]).expect("build");
    let engine = TableEngine::new(&[("a", 0.6), ("c", 0.4), ("e2", 0.36), ("mu", 0.0)]);
    let result = fit_twin_model(&engine, &spec, &pairs(), "zyg").expect("fit");

    assert_eq!(result.spec.groups.labels(), vec!["DZ", "MZ"]);
    assert_eq!(*engine.seen.lock().expect("lock"), vec!["DZ", "MZ"]);

    assert_eq!(result.shares.len(), 3);
    let total = 0.36 + 0.16 + 0.36;
    let a = &result.shares[0];
    assert_eq!(a.component, Component::A);
    assert_eq!(a.sex, None);
    assert_abs_diff_eq!(a.variance, 0.36, epsilon = 1e-12);
    assert_abs_diff_eq!(a.share, 0.36 / total, epsilon = 1e-12);
    let sum: f64 = result.shares.iter().map(|s| s.share).sum();
    assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
}

#[test]
fn engine_errors_pass_through() {
    let spec = build_from_labels(Family::Ace, &["MZ", "DZ"]).expect("build");
    let err = fit_twin_model(&FailingEngine, &spec, &pairs(), "zyg").unwrap_err();
    assert!(err.to_string().contains("singular"));
}

#[test]
fn unknown_data_group_is_an_error() {
    let spec = build_from_labels(Family::Ace, &["MZ", "DZ"]).expect("build");
    let data = df!(
        "zyg" => ["DZ", "MZ", "DOS"],
        "P1" => [0.1, -0.3, 1.2],
        "P2" => [0.5, -0.1, 0.9]
    )
    .expect("frame");
    let engine = TableEngine::new(&[]);
    assert!(fit_twin_model(&engine, &spec, &data, "zyg").is_err());
    assert!(engine.seen.lock().expect("lock").is_empty());
}

#[test]
fn non_convergence_is_reported_not_raised() {
    let spec = build_from_labels(Family::Ace, &["MZ", "DZ"]).expect("build");
    let mut engine = TableEngine::new(&[("a", 0.6), ("c", 0.4), ("e2", 0.36), ("mu", 0.0)]);
    engine.converged = false;
    let result = fit_twin_model(&engine, &spec, &pairs(), "zyg").expect("fit");
    assert!(!result.fit.converged);
}

#[test]
fn sex_limited_shares_per_sex() {
    let groups = resolve(&["MZM", "DZM", "MZF", "DZF", "DOS"]).expect("resolve");
    let spec = twinsem::build(Family::AceSexLimited, &groups).expect("build");
    let engine = TableEngine::new(&[
        ("am", 0.7),
        ("cm", 0.2),
        ("em2", 0.47),
        ("af", 0.5),
        ("cf", 0.5),
        ("ef2", 0.5),
        ("mm", 0.0),
        ("mf", 0.0),
    ]);
    let request = spec.fit_request("zyg", &groups.labels()).expect("request");
    let fit = engine.fit(&request).expect("fit");
    let shares = decompose(&spec, &fit).expect("decompose");
    assert_eq!(shares.len(), 6);

    let female_a = shares
        .iter()
        .find(|s| s.sex == Some(Sex::Female) && s.component == Component::A)
        .expect("female A");
    assert_abs_diff_eq!(female_a.share, 0.25 / 1.0, epsilon = 1e-12);
    let male_e = shares
        .iter()
        .find(|s| s.sex == Some(Sex::Male) && s.component == Component::E)
        .expect("male E");
    assert_abs_diff_eq!(male_e.variance, 0.47, epsilon = 1e-12);

    let table = shares_table(&shares).expect("shares table");
    assert_eq!(table.height(), 6);
}

#[test]
fn missing_estimate_is_an_error() {
    let spec = build_from_labels(Family::Ace, &["MZ", "DZ"]).expect("build");
    let engine = TableEngine::new(&[("a", 0.6)]);
    let request = spec.fit_request("zyg", &["MZ", "DZ"]).expect("request");
    let mut fit = engine.fit(&request).expect("fit");
    fit.params.retain(|p| p.label.as_deref() != Some("c"));
    assert!(decompose(&spec, &fit).is_err());
}

#[test]
fn summary_tables_fill_p_values() {
    let spec = build_from_labels(Family::Ace, &["MZ", "DZ"]).expect("build");
    let engine = TableEngine::new(&[("a", 0.6), ("c", 0.4), ("e2", 0.36), ("mu", 0.0)]);
    let request = spec.fit_request("zyg", &["MZ", "DZ"]).expect("request");
    let fit = engine.fit(&request).expect("fit");

    let (modelfit, results) = summary_tables(&fit, &request.group_labels).expect("tables");
    let p = modelfit
        .column("p_chisq")
        .expect("p_chisq")
        .as_materialized_series()
        .f64()
        .expect("f64")
        .get(0)
        .expect("value");
    assert_abs_diff_eq!(p, 0.05, epsilon = 1e-3);
    assert_eq!(results.height(), fit.params.len());

    let groups = results.column("group").expect("group").as_materialized_series();
    let groups = groups.str().expect("str");
    assert_eq!(groups.get(0), Some("MZ"));

    let z = results.column("z").expect("z").as_materialized_series();
    let z = z.f64().expect("f64");
    let label = results.column("label").expect("label").as_materialized_series();
    let label = label.str().expect("str");
    for i in 0..results.height() {
        match label.get(i) {
            Some("a") => assert_abs_diff_eq!(z.get(i).expect("z"), 12.0, epsilon = 1e-9),
            None => assert!(z.get(i).expect("z").is_nan()),
            _ => {}
        }
    }
}

#[test]
fn chisq_pvalue_edges() {
    assert_abs_diff_eq!(chisq_pvalue(3.841459, 1), 0.05, epsilon = 1e-5);
    assert!(chisq_pvalue(f64::NAN, 1).is_nan());
    assert!(chisq_pvalue(1.0, 0).is_nan());
}
