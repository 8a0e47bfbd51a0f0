use anyhow::{Context, Result};
use polars::prelude::*;
use semspec::{FitStats, SemFit};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use crate::decompose::VarianceShare;

#[derive(Debug, Clone)]
pub struct ResultRow {
    pub lhs: String,
    pub op: String,
    pub rhs: String,
    pub group: String,
    pub label: Option<String>,
    pub est: f64,
    pub se: f64,
    pub z: f64,
    pub p_value: f64,
}

pub fn result_rows(fit: &SemFit, group_labels: &[String]) -> Result<Vec<ResultRow>> {
    let normal = Normal::new(0.0, 1.0).context("normal distribution")?;
    let rows = fit
        .params
        .iter()
        .map(|p| {
            let group = p
                .group
                .checked_sub(1)
                .and_then(|i| group_labels.get(i))
                .cloned()
                .unwrap_or_default();
            ResultRow {
                lhs: p.lhs.clone(),
                op: p.op.clone(),
                rhs: p.rhs.clone(),
                group,
                label: p.label.clone(),
                est: p.est,
                se: p.se,
                z: if p.se > 0.0 { p.est / p.se } else { f64::NAN },
                p_value: z_to_pvalue(&normal, p.est, p.se),
            }
        })
        .collect();
    Ok(rows)
}

pub fn summary_tables(fit: &SemFit, group_labels: &[String]) -> Result<(DataFrame, DataFrame)> {
    let modelfit = modelfit_table(&fit.stats)?;
    let rows = result_rows(fit, group_labels)?;
    let text = |f: fn(&ResultRow) -> String| rows.iter().map(f).collect::<Vec<_>>();
    let num = |f: fn(&ResultRow) -> f64| rows.iter().map(f).collect::<Vec<_>>();
    let results = DataFrame::new(
        rows.len(),
        vec![
            Series::new("lhs".into(), text(|r| r.lhs.clone())).into(),
            Series::new("op".into(), text(|r| r.op.clone())).into(),
            Series::new("rhs".into(), text(|r| r.rhs.clone())).into(),
            Series::new("group".into(), text(|r| r.group.clone())).into(),
            Series::new(
                "label".into(),
                rows.iter().map(|r| r.label.clone()).collect::<Vec<_>>(),
            )
            .into(),
            Series::new("est".into(), num(|r| r.est)).into(),
            Series::new("se".into(), num(|r| r.se)).into(),
            Series::new("z".into(), num(|r| r.z)).into(),
            Series::new("p_value".into(), num(|r| r.p_value)).into(),
        ],
    )?;
    Ok((modelfit, results))
}

pub fn shares_table(shares: &[VarianceShare]) -> Result<DataFrame> {
    let df = DataFrame::new(
        shares.len(),
        vec![
            Series::new(
                "sex".into(),
                shares
                    .iter()
                    .map(|s| s.sex.map(|x| x.as_str()).unwrap_or("all").to_string())
                    .collect::<Vec<_>>(),
            )
            .into(),
            Series::new(
                "component".into(),
                shares
                    .iter()
                    .map(|s| s.component.as_str().to_string())
                    .collect::<Vec<_>>(),
            )
            .into(),
            Series::new(
                "variance".into(),
                shares.iter().map(|s| s.variance).collect::<Vec<_>>(),
            )
            .into(),
            Series::new(
                "share".into(),
                shares.iter().map(|s| s.share).collect::<Vec<_>>(),
            )
            .into(),
        ],
    )?;
    Ok(df)
}

fn modelfit_table(stats: &FitStats) -> Result<DataFrame> {
    let mut chisq = stats.chisq;
    let mut p_chisq = stats.p_chisq;
    if stats.df == 0 {
        chisq = f64::NAN;
        p_chisq = f64::NAN;
    } else if !p_chisq.is_finite() {
        p_chisq = chisq_pvalue(chisq, stats.df);
    }
    let modelfit = DataFrame::new(
        1,
        vec![
            Series::new("chisq".into(), vec![chisq]).into(),
            Series::new("df".into(), vec![stats.df as f64]).into(),
            Series::new("p_chisq".into(), vec![p_chisq]).into(),
            Series::new("CFI".into(), vec![stats.cfi]).into(),
            Series::new("RMSEA".into(), vec![stats.rmsea]).into(),
        ],
    )?;
    Ok(modelfit)
}

pub fn chisq_pvalue(chisq: f64, df: i64) -> f64 {
    if !chisq.is_finite() || df <= 0 {
        return f64::NAN;
    }
    match ChiSquared::new(df as f64) {
        Ok(dist) => 1.0 - dist.cdf(chisq),
        Err(_) => f64::NAN,
    }
}

fn z_to_pvalue(normal: &Normal, est: f64, se: f64) -> f64 {
    if !est.is_finite() || !se.is_finite() || se == 0.0 {
        return f64::NAN;
    }
    let z = (est / se).abs();
    let mut p = 2.0 * (1.0 - normal.cdf(z));
    if p == 0.0 {
        p = 5e-300;
    }
    p
}
