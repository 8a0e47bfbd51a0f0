use anyhow::{Context, Result};
use semspec::{Coef, SemFit};

use crate::group::GroupId;
use crate::spec::{GroupValues, StructuralSpecification};
use crate::types::{Component, Sex, Twin, Var};

#[derive(Debug, Clone, PartialEq)]
pub struct VarianceShare {
    pub sex: Option<Sex>,
    pub component: Component,
    pub variance: f64,
    pub share: f64,
}

pub fn decompose(spec: &StructuralSpecification, fit: &SemFit) -> Result<Vec<VarianceShare>> {
    let strata: Vec<Option<Sex>> = if spec.template.sex_limited {
        vec![Some(Sex::Male), Some(Sex::Female)]
    } else {
        vec![None]
    };

    let mut out = Vec::new();
    for sex in strata {
        let (group, twin) = stratum_anchor(spec, sex)
            .with_context(|| format!("no twin of sex {sex:?} in the specification"))?;

        let mut parts = Vec::with_capacity(3);
        for component in spec.template.components() {
            let loading = spec
                .loading(component, twin)
                .with_context(|| format!("{component} loading missing"))?;
            let value = coef_value(loading, group, fit)?;
            parts.push((component, value * value));
        }
        let residual = spec
            .variance(Var::Phenotype(twin))
            .context("residual variance missing")?;
        parts.push((Component::E, coef_value(residual, group, fit)?));

        let total: f64 = parts.iter().map(|(_, v)| v).sum();
        for (component, variance) in parts {
            out.push(VarianceShare {
                sex,
                component,
                variance,
                share: variance / total,
            });
        }
    }
    Ok(out)
}

fn stratum_anchor(spec: &StructuralSpecification, sex: Option<Sex>) -> Option<(GroupId, Twin)> {
    spec.groups.iter().find_map(|g| {
        Twin::BOTH
            .into_iter()
            .find(|t| sex.is_none() || g.sex(*t) == sex)
            .map(|t| (g.id, t))
    })
}

fn coef_value(values: &GroupValues, group: GroupId, fit: &SemFit) -> Result<f64> {
    match values.get(group).context("coefficient missing for group")? {
        Coef::Fixed(v) => Ok(*v),
        Coef::Label(label) => fit
            .estimate(label)
            .ok_or_else(|| anyhow::anyhow!("fit has no estimate for {label}")),
    }
}
