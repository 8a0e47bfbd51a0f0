use anyhow::Context;
use semspec::partable::par_table;
use semspec::{
    Coef, Estimator, FitRequest, Line, ModelOp, ModelSyntax, ParTableRow, Parameterization,
};

use crate::error::{Result, TwinSemError};
use crate::family::{Family, Template};
use crate::group::{Group, GroupId, GroupSet};
use crate::relatedness::canonical_label;
use crate::types::{Component, Phenotypes, Twin, Var};

#[derive(Debug, Clone, PartialEq)]
pub struct GroupValues {
    entries: Vec<(GroupId, Coef)>,
}

impl GroupValues {
    pub fn uniform(groups: &GroupSet, coef: Coef) -> Self {
        Self::from_fn(groups, |_| coef.clone())
    }

    pub fn from_fn<F>(groups: &GroupSet, mut f: F) -> Self
    where
        F: FnMut(&Group) -> Coef,
    {
        Self {
            entries: groups.iter().map(|g| (g.id, f(g))).collect(),
        }
    }

    pub fn get(&self, id: GroupId) -> Option<&Coef> {
        self.entries.iter().find(|(g, _)| *g == id).map(|(_, c)| c)
    }

    pub fn entries(&self) -> &[(GroupId, Coef)] {
        &self.entries
    }

    pub fn in_order(&self, groups: &GroupSet) -> Option<Vec<Coef>> {
        groups.iter().map(|g| self.get(g.id).cloned()).collect()
    }

    pub fn fixed_in_order(&self, groups: &GroupSet) -> Option<Vec<f64>> {
        groups
            .iter()
            .map(|g| self.get(g.id).and_then(Coef::fixed_value))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Loading {
        component: Component,
        twin: Twin,
        values: GroupValues,
    },
    Variance {
        var: Var,
        values: GroupValues,
    },
    Covariance {
        a: Var,
        b: Var,
        values: GroupValues,
    },
    Regression {
        target: Var,
        predictor: Var,
        values: GroupValues,
    },
    Threshold {
        twin: Twin,
        index: usize,
        values: GroupValues,
    },
    Intercept {
        twin: Twin,
        values: GroupValues,
    },
}

impl Statement {
    pub fn values(&self) -> &GroupValues {
        match self {
            Statement::Loading { values, .. }
            | Statement::Variance { values, .. }
            | Statement::Covariance { values, .. }
            | Statement::Regression { values, .. }
            | Statement::Threshold { values, .. }
            | Statement::Intercept { values, .. } => values,
        }
    }

    pub fn op(&self) -> ModelOp {
        match self {
            Statement::Loading { .. } => ModelOp::Measure,
            Statement::Variance { .. } | Statement::Covariance { .. } => ModelOp::Cov,
            Statement::Regression { .. } => ModelOp::Regress,
            Statement::Threshold { .. } => ModelOp::Threshold,
            Statement::Intercept { .. } => ModelOp::Intercept,
        }
    }

    fn sides(&self, phenotypes: &Phenotypes) -> (String, String) {
        match self {
            Statement::Loading {
                component, twin, ..
            } => (
                Var::Latent(*component, *twin).name(phenotypes),
                phenotypes.name(*twin).to_string(),
            ),
            Statement::Variance { var, .. } => (var.name(phenotypes), var.name(phenotypes)),
            Statement::Covariance { a, b, .. } => (a.name(phenotypes), b.name(phenotypes)),
            Statement::Regression {
                target, predictor, ..
            } => (target.name(phenotypes), predictor.name(phenotypes)),
            Statement::Threshold { twin, index, .. } => {
                (phenotypes.name(*twin).to_string(), format!("t{index}"))
            }
            Statement::Intercept { twin, .. } => {
                (phenotypes.name(*twin).to_string(), String::new())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Define {
    pub name: String,
    pub expr: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuralSpecification {
    pub family: Family,
    pub template: Template,
    pub groups: GroupSet,
    pub phenotypes: Phenotypes,
    pub statements: Vec<Statement>,
    pub defines: Vec<Define>,
    pub estimator: Estimator,
    pub parameterization: Parameterization,
}

impl StructuralSpecification {
    pub fn loading(&self, component: Component, twin: Twin) -> Option<&GroupValues> {
        self.statements.iter().find_map(|s| match s {
            Statement::Loading {
                component: c,
                twin: t,
                values,
            } if *c == component && *t == twin => Some(values),
            _ => None,
        })
    }

    pub fn variance(&self, var: Var) -> Option<&GroupValues> {
        self.statements.iter().find_map(|s| match s {
            Statement::Variance { var: v, values } if *v == var => Some(values),
            _ => None,
        })
    }

    pub fn covariance(&self, a: Var, b: Var) -> Option<&GroupValues> {
        self.statements.iter().find_map(|s| match s {
            Statement::Covariance { a: x, b: y, values }
                if (*x == a && *y == b) || (*x == b && *y == a) =>
            {
                Some(values)
            }
            _ => None,
        })
    }

    pub fn regression(&self, target: Var, predictor: Var) -> Option<&GroupValues> {
        self.statements.iter().find_map(|s| match s {
            Statement::Regression {
                target: t,
                predictor: p,
                values,
            } if *t == target && *p == predictor => Some(values),
            _ => None,
        })
    }

    pub fn thresholds(&self, twin: Twin) -> Vec<&GroupValues> {
        let mut found: Vec<(usize, &GroupValues)> = self
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::Threshold {
                    twin: t,
                    index,
                    values,
                } if *t == twin => Some((*index, values)),
                _ => None,
            })
            .collect();
        found.sort_by_key(|(index, _)| *index);
        found.into_iter().map(|(_, v)| v).collect()
    }

    pub fn intercept(&self, twin: Twin) -> Option<&GroupValues> {
        self.statements.iter().find_map(|s| match s {
            Statement::Intercept { twin: t, values } if *t == twin => Some(values),
            _ => None,
        })
    }

    pub fn free_labels(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for statement in &self.statements {
            for (_, coef) in statement.values().entries() {
                if let Some(label) = coef.label_name()
                    && !out.iter().any(|l| l == label)
                {
                    out.push(label.to_string());
                }
            }
        }
        out
    }

    /// Flattens group-keyed coefficients into positional vectors following
    /// the current group order.
    pub fn to_syntax(&self) -> anyhow::Result<ModelSyntax> {
        let mut syntax = ModelSyntax::new(self.groups.labels());
        for statement in &self.statements {
            let (lhs, rhs) = statement.sides(&self.phenotypes);
            let op = statement.op();
            let coefs = statement
                .values()
                .in_order(&self.groups)
                .with_context(|| format!("{lhs} {} {rhs} is missing a group", op.as_str()))?;
            syntax.push(Line {
                lhs,
                op,
                rhs,
                coefs,
            })?;
        }
        for define in &self.defines {
            syntax.define(&define.name, &define.expr);
        }
        Ok(syntax)
    }

    pub fn to_lavaan(&self) -> anyhow::Result<String> {
        Ok(self.to_syntax()?.render())
    }

    pub fn par_table(&self) -> anyhow::Result<Vec<ParTableRow>> {
        Ok(par_table(&self.to_syntax()?))
    }

    pub fn check_data_order<S: AsRef<str>>(&self, observed: &[S]) -> Result<()> {
        let expected = self.groups.labels();
        let found: Vec<String> = observed.iter().map(|s| canonical_label(s.as_ref())).collect();
        if expected != found {
            return Err(TwinSemError::GroupOrderMismatch {
                expected: expected.join(","),
                found: found.join(","),
            });
        }
        Ok(())
    }

    pub fn align_to<S: AsRef<str>>(&self, observed: &[S]) -> Result<StructuralSpecification> {
        let mut aligned = self.clone();
        aligned.groups = self.groups.reordered(observed)?;
        Ok(aligned)
    }

    pub fn fit_request<S: AsRef<str>>(
        &self,
        group_column: &str,
        observed: &[S],
    ) -> anyhow::Result<FitRequest> {
        let aligned = self.align_to(observed)?;
        let syntax = aligned.to_syntax()?;
        let ordered = if self.template.is_categorical() {
            self.phenotypes.names()
        } else {
            Vec::new()
        };
        Ok(FitRequest::from_syntax(
            &syntax,
            group_column,
            self.phenotypes.names(),
            ordered,
            self.estimator,
            self.parameterization,
        ))
    }
}
