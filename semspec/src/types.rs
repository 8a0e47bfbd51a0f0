#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Estimator {
    Ml,
    Wlsmv,
}

impl Estimator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Estimator::Ml => "ML",
            Estimator::Wlsmv => "WLSMV",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameterization {
    Delta,
    Theta,
}

impl Parameterization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameterization::Delta => "delta",
            Parameterization::Theta => "theta",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParTableRow {
    pub lhs: String,
    pub op: String,
    pub rhs: String,
    pub group: usize,
    pub free: usize,
    pub label: Option<String>,
    pub ustart: f64,
    pub est: f64,
    pub se: f64,
}

#[derive(Debug, Clone)]
pub struct FitStats {
    pub chisq: f64,
    pub df: i64,
    pub p_chisq: f64,
    pub cfi: f64,
    pub rmsea: f64,
}

#[derive(Debug, Clone)]
pub struct ParamEstimate {
    pub lhs: String,
    pub op: String,
    pub rhs: String,
    pub group: usize,
    pub label: Option<String>,
    pub free: usize,
    pub est: f64,
    pub se: f64,
}

#[derive(Debug, Clone)]
pub struct DefinedEstimate {
    pub name: String,
    pub expr: String,
    pub est: f64,
    pub se: f64,
}

#[derive(Debug, Clone)]
pub struct SemFit {
    pub params: Vec<ParamEstimate>,
    pub defined: Vec<DefinedEstimate>,
    pub stats: FitStats,
    pub converged: bool,
    pub iterations: usize,
    pub npar: usize,
    pub warnings: Vec<String>,
}

impl SemFit {
    pub fn estimate(&self, label: &str) -> Option<f64> {
        self.params
            .iter()
            .find(|p| p.label.as_deref() == Some(label))
            .map(|p| p.est)
    }

    pub fn defined_estimate(&self, name: &str) -> Option<&DefinedEstimate> {
        self.defined.iter().find(|d| d.name == name)
    }
}
