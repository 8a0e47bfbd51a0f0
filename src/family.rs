use std::fmt;
use std::str::FromStr;

use semspec::{Estimator, Parameterization};

use crate::error::{Result, TwinSemError};
use crate::types::{Component, Sex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Ace,
    Ade,
    AceX,
    AdeX,
    AceSexLimited,
    AceOrdinal { categories: usize },
    AceBinary,
}

impl Family {
    pub fn from_name(name: &str, categories: Option<usize>) -> Result<Family> {
        let key = name.trim().to_ascii_lowercase().replace('_', "-");
        let family = match key.as_str() {
            "ace" => Family::Ace,
            "ade" => Family::Ade,
            "acex" | "ace-x" => Family::AceX,
            "adex" | "ade-x" => Family::AdeX,
            "ace-sex" | "sexlim" | "ace-sexlim" | "ace-sex-limited" => Family::AceSexLimited,
            "ace-ordinal" | "ordinal" => {
                let categories = categories.ok_or_else(|| {
                    TwinSemError::InvalidArgument(
                        "ordinal family needs a category count".to_string(),
                    )
                })?;
                Family::AceOrdinal { categories }
            }
            "ace-binary" | "binary" => Family::AceBinary,
            _ => return Err(TwinSemError::UnsupportedFamily(name.to_string())),
        };
        Ok(family)
    }

    pub fn name(&self) -> String {
        match self {
            Family::Ace => "ACE".to_string(),
            Family::Ade => "ADE".to_string(),
            Family::AceX => "ACEx".to_string(),
            Family::AdeX => "ADEx".to_string(),
            Family::AceSexLimited => "ACE-sex".to_string(),
            Family::AceOrdinal { categories } => format!("ACE-ordinal({categories})"),
            Family::AceBinary => "ACE-binary".to_string(),
        }
    }

    pub fn template(&self) -> Result<Template> {
        let mut template = Template {
            second: Component::C,
            sex_limited: false,
            sibling_interaction: false,
            thresholds: ThresholdRule::None,
        };
        match *self {
            Family::Ace => {}
            Family::Ade => template.second = Component::D,
            Family::AceX => template.sibling_interaction = true,
            Family::AdeX => {
                template.second = Component::D;
                template.sibling_interaction = true;
            }
            Family::AceSexLimited => template.sex_limited = true,
            Family::AceOrdinal { categories } => {
                template.thresholds = match categories {
                    0 | 1 => return Err(TwinSemError::InvalidCategories(categories)),
                    2 => ThresholdRule::Binary,
                    k => ThresholdRule::Ordinal { categories: k },
                };
            }
            Family::AceBinary => template.thresholds = ThresholdRule::Binary,
        }
        Ok(template)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Family {
    type Err = TwinSemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((name, k)) => {
                let categories = k.trim().parse::<usize>().map_err(|_| {
                    TwinSemError::InvalidArgument(format!("bad category count in {s}"))
                })?;
                Family::from_name(name, Some(categories))
            }
            None => Family::from_name(s, None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdRule {
    None,
    Ordinal { categories: usize },
    Binary,
}

impl ThresholdRule {
    pub fn count(&self) -> usize {
        match self {
            ThresholdRule::None => 0,
            ThresholdRule::Ordinal { categories } => categories.saturating_sub(1),
            ThresholdRule::Binary => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub second: Component,
    pub sex_limited: bool,
    pub sibling_interaction: bool,
    pub thresholds: ThresholdRule,
}

pub const BETA_LABEL: &str = "beta";

impl Template {
    pub fn components(&self) -> [Component; 2] {
        [Component::A, self.second]
    }

    pub fn is_categorical(&self) -> bool {
        !matches!(self.thresholds, ThresholdRule::None)
    }

    /// Binary phenotypes carry no scale information, so E is fixed.
    pub fn fixed_residual(&self) -> Option<f64> {
        match self.thresholds {
            ThresholdRule::Binary => Some(1.0),
            _ => None,
        }
    }

    pub fn estimator(&self) -> Estimator {
        if self.is_categorical() {
            Estimator::Wlsmv
        } else {
            Estimator::Ml
        }
    }

    pub fn parameterization(&self) -> Parameterization {
        if self.is_categorical() {
            Parameterization::Theta
        } else {
            Parameterization::Delta
        }
    }

    pub fn loading_label(&self, component: Component, sex: Option<Sex>) -> String {
        with_sex(component.stem(), sex)
    }

    pub fn residual_label(&self, sex: Option<Sex>) -> String {
        match sex {
            Some(sex) => format!("e{}2", sex.suffix()),
            None => "e2".to_string(),
        }
    }

    pub fn mean_label(&self, sex: Option<Sex>) -> String {
        match sex {
            Some(sex) => format!("m{}", sex.suffix()),
            None => "mu".to_string(),
        }
    }

    pub fn threshold_label(&self, index: usize) -> String {
        format!("t{index}")
    }
}

fn with_sex(stem: &str, sex: Option<Sex>) -> String {
    match sex {
        Some(sex) => format!("{stem}{}", sex.suffix()),
        None => stem.to_string(),
    }
}
