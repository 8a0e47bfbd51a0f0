use anyhow::Result;

use crate::partable::par_table;
use crate::syntax::ModelSyntax;
use crate::types::{Estimator, ParTableRow, Parameterization, SemFit};

/// Everything a multi-group fitting engine needs besides the data itself.
///
/// `group_labels` follows the positional order of every coefficient vector
/// in `syntax` and `par_table`; engines are expected to map group `i` to the
/// `i`-th label found in `group_column`.
#[derive(Debug, Clone)]
pub struct FitRequest {
    pub syntax: String,
    pub par_table: Vec<ParTableRow>,
    pub group_labels: Vec<String>,
    pub group_column: String,
    pub observed: Vec<String>,
    pub ordered: Vec<String>,
    pub estimator: Estimator,
    pub parameterization: Parameterization,
}

impl FitRequest {
    pub fn from_syntax(
        syntax: &ModelSyntax,
        group_column: &str,
        observed: Vec<String>,
        ordered: Vec<String>,
        estimator: Estimator,
        parameterization: Parameterization,
    ) -> Self {
        Self {
            syntax: syntax.render(),
            par_table: par_table(syntax),
            group_labels: syntax.groups.clone(),
            group_column: group_column.to_string(),
            observed,
            ordered,
            estimator,
            parameterization,
        }
    }
}

pub trait SemEngine {
    fn fit(&self, request: &FitRequest) -> Result<SemFit>;
}
