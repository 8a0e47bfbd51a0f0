use anyhow::{Context, Result};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::info;

use crate::group::{Group, GroupSet};
use crate::parallel::par_map;
use crate::types::{Component, Phenotypes, Sex, Twin};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paths {
    pub a: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            a: 0.6,
            c: 0.4,
            d: 0.0,
            e: 0.69,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub pairs: usize,
    pub paths: Paths,
    pub female: Option<Paths>,
    pub beta: f64,
    pub thresholds: Option<Vec<f64>>,
    pub seed: u64,
    pub phenotypes: Phenotypes,
    pub group_column: String,
    pub parallel: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            pairs: 1000,
            paths: Paths::default(),
            female: None,
            beta: 0.0,
            thresholds: None,
            seed: 1,
            phenotypes: Phenotypes::default(),
            group_column: "zyg".to_string(),
            parallel: true,
        }
    }
}

struct SimulatedGroup {
    label: String,
    p1: Vec<f64>,
    p2: Vec<f64>,
}

/// One row per pair with the group label and both phenotypes. Group `i`
/// (in set order) is drawn from seed `config.seed + i`, so output does not
/// depend on `config.parallel`.
pub fn simulate(config: &SimConfig, groups: &GroupSet) -> Result<DataFrame> {
    validate(config)?;

    let jobs: Vec<(u64, &Group)> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| (config.seed.wrapping_add(i as u64), g))
        .collect();
    let simulated: Vec<SimulatedGroup> = if config.parallel {
        par_map(&jobs, None, "simulation thread pool", |(seed, g)| {
            simulate_group(config, g, *seed)
        })?
    } else {
        jobs.iter()
            .map(|(seed, g)| simulate_group(config, g, *seed))
            .collect()
    };

    let height = config.pairs * simulated.len();
    let mut labels = Vec::with_capacity(height);
    let mut p1 = Vec::with_capacity(height);
    let mut p2 = Vec::with_capacity(height);
    for group in simulated {
        labels.extend(std::iter::repeat_n(group.label, config.pairs));
        p1.extend(group.p1);
        p2.extend(group.p2);
    }
    info!(
        "Simulated {height} pairs over {} groups (seed {})",
        groups.len(),
        config.seed
    );

    let df = DataFrame::new(
        height,
        vec![
            Series::new(config.group_column.as_str().into(), labels).into(),
            Series::new(config.phenotypes.twin1.as_str().into(), p1).into(),
            Series::new(config.phenotypes.twin2.as_str().into(), p2).into(),
        ],
    )?;
    Ok(df)
}

pub fn thresholds_from_proportions(proportions: &[f64]) -> Result<Vec<f64>> {
    if proportions.len() < 2 {
        return Err(anyhow::anyhow!("need at least two category proportions"));
    }
    if proportions.iter().any(|p| !p.is_finite() || *p <= 0.0) {
        return Err(anyhow::anyhow!("category proportions must be positive"));
    }
    let total: f64 = proportions.iter().sum();
    if (total - 1.0).abs() > 1e-6 {
        return Err(anyhow::anyhow!(
            "category proportions sum to {total}, expected 1"
        ));
    }
    let normal = Normal::new(0.0, 1.0).context("normal distribution")?;
    let mut cumulative = 0.0;
    let mut out = Vec::with_capacity(proportions.len() - 1);
    for p in &proportions[..proportions.len() - 1] {
        cumulative += p;
        out.push(normal.inverse_cdf(cumulative));
    }
    Ok(out)
}

fn validate(config: &SimConfig) -> Result<()> {
    if config.pairs == 0 {
        return Err(anyhow::anyhow!("pairs per group must be positive"));
    }
    if !config.beta.is_finite() || config.beta.abs() >= 1.0 {
        return Err(anyhow::anyhow!(
            "sibling interaction {} must lie strictly between -1 and 1",
            config.beta
        ));
    }
    for paths in std::iter::once(&config.paths).chain(config.female.as_ref()) {
        if [paths.a, paths.c, paths.d, paths.e]
            .iter()
            .any(|v| !v.is_finite())
        {
            return Err(anyhow::anyhow!("path coefficients must be finite"));
        }
    }
    if let Some(thresholds) = &config.thresholds
        && thresholds.windows(2).any(|w| !(w[0] < w[1]))
    {
        return Err(anyhow::anyhow!("thresholds must be strictly ascending"));
    }
    Ok(())
}

fn paths_for(config: &SimConfig, sex: Option<Sex>) -> Paths {
    match (sex, config.female) {
        (Some(Sex::Female), Some(female)) => female,
        _ => config.paths,
    }
}

fn simulate_group(config: &SimConfig, group: &Group, seed: u64) -> SimulatedGroup {
    let mut rng = StdRng::seed_from_u64(seed);
    let first = paths_for(config, group.sex(Twin::One));
    let second = paths_for(config, group.sex(Twin::Two));
    let beta = config.beta;

    let mut p1 = Vec::with_capacity(config.pairs);
    let mut p2 = Vec::with_capacity(config.pairs);
    for _ in 0..config.pairs {
        let (a1, a2) = correlated_pair(group.coefficient(Component::A), &mut rng);
        let (c1, c2) = correlated_pair(group.coefficient(Component::C), &mut rng);
        let (d1, d2) = correlated_pair(group.coefficient(Component::D), &mut rng);
        let e1: f64 = StandardNormal.sample(&mut rng);
        let e2: f64 = StandardNormal.sample(&mut rng);

        let x1 = first.a * a1 + first.c * c1 + first.d * d1 + first.e * e1;
        let x2 = second.a * a2 + second.c * c2 + second.d * d2 + second.e * e2;
        // P = (I - B)^-1 x with B = [[0, beta], [beta, 0]]
        let scale = 1.0 - beta * beta;
        let y1 = (x1 + beta * x2) / scale;
        let y2 = (x2 + beta * x1) / scale;

        match &config.thresholds {
            Some(thresholds) => {
                p1.push(categorize(y1, thresholds));
                p2.push(categorize(y2, thresholds));
            }
            None => {
                p1.push(y1);
                p2.push(y2);
            }
        }
    }

    SimulatedGroup {
        label: group.label.clone(),
        p1,
        p2,
    }
}

fn correlated_pair<R: Rng + ?Sized>(r: f64, rng: &mut R) -> (f64, f64) {
    let z1: f64 = StandardNormal.sample(rng);
    let z2: f64 = StandardNormal.sample(rng);
    (z1, r * z1 + (1.0 - r * r).max(0.0).sqrt() * z2)
}

fn categorize(value: f64, thresholds: &[f64]) -> f64 {
    thresholds.iter().filter(|t| value > **t).count() as f64
}
