use anyhow::Result;
use polars::prelude::DataFrame;
use semspec::{SemEngine, SemFit};
use tracing::{info, warn};

use crate::decompose::{VarianceShare, decompose};
use crate::io::group_order;
use crate::spec::StructuralSpecification;

#[derive(Debug, Clone)]
pub struct TwinFit {
    pub spec: StructuralSpecification,
    pub fit: SemFit,
    pub shares: Vec<VarianceShare>,
}

pub fn fit_twin_model(
    engine: &dyn SemEngine,
    spec: &StructuralSpecification,
    data: &DataFrame,
    group_column: &str,
) -> Result<TwinFit> {
    let observed = group_order(data, group_column)?;
    let aligned = spec.align_to(&observed)?;
    let request = aligned.fit_request(group_column, &observed)?;
    info!(
        "Fitting {} on {} pairs in groups [{}] with {}",
        aligned.family,
        data.height(),
        request.group_labels.join(","),
        request.estimator.as_str()
    );

    let fit = engine.fit(&request)?;
    if !fit.converged {
        warn!(
            "{} did not converge after {} iterations",
            aligned.family, fit.iterations
        );
    }
    for warning in &fit.warnings {
        warn!("{warning}");
    }

    let shares = decompose(&aligned, &fit)?;
    Ok(TwinFit {
        spec: aligned,
        fit,
        shares,
    })
}
