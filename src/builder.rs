use semspec::Coef;
use semspec::syntax::format_number;
use tracing::debug;

use crate::error::{Result, TwinSemError};
use crate::family::{BETA_LABEL, Family, Template};
use crate::group::{Group, GroupSet, resolve};
use crate::parallel::par_map;
use crate::spec::{Define, GroupValues, Statement, StructuralSpecification};
use crate::types::{Component, Phenotypes, Sex, Twin, Var};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub phenotypes: Phenotypes,
    pub means: bool,
    pub defines: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            phenotypes: Phenotypes::default(),
            means: true,
            defines: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpecBuilder {
    family: Family,
    options: BuildOptions,
}

impl SpecBuilder {
    pub fn new(family: Family) -> Self {
        Self {
            family,
            options: BuildOptions::default(),
        }
    }

    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn phenotypes(mut self, phenotypes: Phenotypes) -> Self {
        self.options.phenotypes = phenotypes;
        self
    }

    pub fn means(mut self, means: bool) -> Self {
        self.options.means = means;
        self
    }

    pub fn defines(mut self, defines: bool) -> Self {
        self.options.defines = defines;
        self
    }

    pub fn build(&self, groups: &GroupSet) -> Result<StructuralSpecification> {
        let template = self.family.template()?;
        check_identification(self.family, &template, groups)?;

        let mut statements = Vec::new();
        push_loadings(&mut statements, &template, groups);
        push_latent_variances(&mut statements, &template, groups);
        push_residuals(&mut statements, &template, groups);
        push_cross_twin(&mut statements, &template, groups);
        push_cross_component(&mut statements, &template, groups);
        if template.sibling_interaction {
            push_interaction(&mut statements, groups);
        }
        push_thresholds(&mut statements, &template, groups);
        if self.options.means && !template.is_categorical() {
            push_means(&mut statements, &template, groups);
        }

        let defines = if self.options.defines {
            share_defines(&template)
        } else {
            Vec::new()
        };

        debug!(
            "built {} with {} statements over groups [{}]",
            self.family,
            statements.len(),
            groups.labels().join(",")
        );

        Ok(StructuralSpecification {
            family: self.family,
            template,
            groups: groups.clone(),
            phenotypes: self.options.phenotypes.clone(),
            statements,
            defines,
            estimator: template.estimator(),
            parameterization: template.parameterization(),
        })
    }
}

pub fn build(family: Family, groups: &GroupSet) -> Result<StructuralSpecification> {
    SpecBuilder::new(family).build(groups)
}

pub fn build_from_labels<S: AsRef<str>>(
    family: Family,
    labels: &[S],
) -> Result<StructuralSpecification> {
    let groups = resolve(labels)?;
    build(family, &groups)
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub family: Family,
    pub groups: Vec<String>,
    pub options: BuildOptions,
}

impl BatchRequest {
    pub fn build(&self) -> Result<StructuralSpecification> {
        let groups = resolve(&self.groups)?;
        SpecBuilder::new(self.family)
            .options(self.options.clone())
            .build(&groups)
    }
}

pub fn build_batch(
    requests: &[BatchRequest],
    cores: Option<usize>,
) -> anyhow::Result<Vec<Result<StructuralSpecification>>> {
    par_map(requests, cores, "build thread pool", BatchRequest::build)
}

fn check_identification(family: Family, template: &Template, groups: &GroupSet) -> Result<()> {
    let insufficient = |reason: String| TwinSemError::InsufficientGroups {
        family: family.name(),
        reason,
    };

    if groups.is_empty() {
        return Err(insufficient("no groups given".to_string()));
    }

    if template.sex_limited {
        if let Some(group) = groups.iter().find(|g| !g.is_sexed()) {
            return Err(insufficient(format!(
                "group {} carries no sex roles",
                group.label
            )));
        }
        for sex in [Sex::Male, Sex::Female] {
            let same_sex: Vec<&Group> = groups
                .iter()
                .filter(|g| g.sex(Twin::One) == Some(sex) && g.sex(Twin::Two) == Some(sex))
                .collect();
            if distinct_count(same_sex.iter().map(|g| g.coefficient(Component::A))) < 2 {
                return Err(insufficient(format!(
                    "{} pairs need groups with two distinct A correlations",
                    sex.as_str()
                )));
            }
        }
    } else if distinct_count(groups.iter().map(|g| g.coefficient(Component::A))) < 2 {
        return Err(insufficient(
            "groups need at least two distinct A correlations, e.g. MZ and DZ".to_string(),
        ));
    }

    let has_dz_like = groups.iter().any(|g| g.coefficient(Component::D) < 1.0);
    if template.second == Component::D && !has_dz_like {
        return Err(insufficient("no group with a D correlation below 1".to_string()));
    }

    Ok(())
}

fn distinct_count<I: Iterator<Item = f64>>(values: I) -> usize {
    let mut seen: Vec<f64> = Vec::new();
    for v in values {
        if !seen.iter().any(|s| (s - v).abs() < 1e-12) {
            seen.push(v);
        }
    }
    seen.len()
}

fn sex_of(template: &Template, group: &Group, twin: Twin) -> Option<Sex> {
    if template.sex_limited {
        group.sex(twin)
    } else {
        None
    }
}

fn push_loadings(out: &mut Vec<Statement>, template: &Template, groups: &GroupSet) {
    for twin in Twin::BOTH {
        for component in template.components() {
            let values = GroupValues::from_fn(groups, |g| {
                Coef::Label(template.loading_label(component, sex_of(template, g, twin)))
            });
            out.push(Statement::Loading {
                component,
                twin,
                values,
            });
        }
    }
}

fn push_latent_variances(out: &mut Vec<Statement>, template: &Template, groups: &GroupSet) {
    for twin in Twin::BOTH {
        for component in template.components() {
            out.push(Statement::Variance {
                var: Var::Latent(component, twin),
                values: GroupValues::uniform(groups, Coef::Fixed(1.0)),
            });
        }
    }
}

fn push_residuals(out: &mut Vec<Statement>, template: &Template, groups: &GroupSet) {
    for twin in Twin::BOTH {
        let values = match template.fixed_residual() {
            Some(v) => GroupValues::uniform(groups, Coef::Fixed(v)),
            None => GroupValues::from_fn(groups, |g| {
                Coef::Label(template.residual_label(sex_of(template, g, twin)))
            }),
        };
        out.push(Statement::Variance {
            var: Var::Phenotype(twin),
            values,
        });
    }
}

fn push_cross_twin(out: &mut Vec<Statement>, template: &Template, groups: &GroupSet) {
    for component in template.components() {
        out.push(Statement::Covariance {
            a: Var::Latent(component, Twin::One),
            b: Var::Latent(component, Twin::Two),
            values: GroupValues::from_fn(groups, |g| Coef::Fixed(g.coefficient(component))),
        });
    }
}

fn push_cross_component(out: &mut Vec<Statement>, template: &Template, groups: &GroupSet) {
    let [first, second] = template.components();
    for t1 in Twin::BOTH {
        for t2 in Twin::BOTH {
            out.push(Statement::Covariance {
                a: Var::Latent(first, t1),
                b: Var::Latent(second, t2),
                values: GroupValues::uniform(groups, Coef::Fixed(0.0)),
            });
        }
    }
}

/// One `beta` for both directions and every group; freeing it per group
/// leaves the model under-identified.
fn push_interaction(out: &mut Vec<Statement>, groups: &GroupSet) {
    for twin in Twin::BOTH {
        out.push(Statement::Regression {
            target: Var::Phenotype(twin),
            predictor: Var::Phenotype(twin.other()),
            values: GroupValues::uniform(groups, Coef::label(BETA_LABEL)),
        });
    }
}

/// The first threshold is fixed at 0; the rest are free and shared across
/// twins and groups.
fn push_thresholds(out: &mut Vec<Statement>, template: &Template, groups: &GroupSet) {
    let count = template.thresholds.count();
    for twin in Twin::BOTH {
        for index in 1..=count {
            let coef = if index == 1 {
                Coef::Fixed(0.0)
            } else {
                Coef::Label(template.threshold_label(index))
            };
            out.push(Statement::Threshold {
                twin,
                index,
                values: GroupValues::uniform(groups, coef),
            });
        }
    }
}

fn push_means(out: &mut Vec<Statement>, template: &Template, groups: &GroupSet) {
    for twin in Twin::BOTH {
        let values = GroupValues::from_fn(groups, |g| {
            Coef::Label(template.mean_label(sex_of(template, g, twin)))
        });
        out.push(Statement::Intercept { twin, values });
    }
}

fn share_defines(template: &Template) -> Vec<Define> {
    let strata: Vec<Option<Sex>> = if template.sex_limited {
        vec![Some(Sex::Male), Some(Sex::Female)]
    } else {
        vec![None]
    };

    let mut defines = Vec::new();
    for sex in strata {
        let suffix = sex.map(|s| s.suffix()).unwrap_or("");
        let terms: Vec<(Component, String)> = template
            .components()
            .into_iter()
            .map(|c| (c, format!("{}^2", template.loading_label(c, sex))))
            .collect();
        let residual = match template.fixed_residual() {
            Some(v) => format_number(v),
            None => template.residual_label(sex),
        };
        let total = terms
            .iter()
            .map(|(_, t)| t.as_str())
            .chain(std::iter::once(residual.as_str()))
            .collect::<Vec<_>>()
            .join("+");
        for (component, term) in &terms {
            defines.push(Define {
                name: format!("{}{suffix}2_std", component.stem()),
                expr: format!("{term}/({total})"),
            });
        }
        defines.push(Define {
            name: format!("e{suffix}2_std"),
            expr: format!("{residual}/({total})"),
        });
    }
    defines
}
