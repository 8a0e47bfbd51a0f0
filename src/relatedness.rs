use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::{Result, TwinSemError};
use crate::types::{Component, Sex, Twin};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relatedness {
    pub a: f64,
    pub c: f64,
    pub d: f64,
}

impl Relatedness {
    pub const MZ: Relatedness = Relatedness {
        a: 1.0,
        c: 1.0,
        d: 1.0,
    };

    pub const DZ: Relatedness = Relatedness {
        a: 0.5,
        c: 1.0,
        d: 0.25,
    };

    /// E is unique to each twin and never correlates.
    pub fn coefficient(&self, component: Component) -> f64 {
        match component {
            Component::A => self.a,
            Component::C => self.c,
            Component::D => self.d,
            Component::E => 0.0,
        }
    }

    fn validate(&self, label: &str) -> Result<()> {
        for (name, value) in [("A", self.a), ("C", self.c), ("D", self.d)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TwinSemError::InvalidArgument(format!(
                    "{name} relatedness {value} for group {label} is outside [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupProfile {
    pub relatedness: Relatedness,
    pub sexes: Option<[Sex; 2]>,
}

impl GroupProfile {
    pub const fn unsexed(relatedness: Relatedness) -> Self {
        Self {
            relatedness,
            sexes: None,
        }
    }

    pub const fn sexed(relatedness: Relatedness, sexes: [Sex; 2]) -> Self {
        Self {
            relatedness,
            sexes: Some(sexes),
        }
    }

    pub fn sex(&self, twin: Twin) -> Option<Sex> {
        self.sexes.map(|s| s[twin.index() - 1])
    }
}

const BUILTIN: [(&str, GroupProfile); 7] = [
    ("MZ", GroupProfile::unsexed(Relatedness::MZ)),
    ("DZ", GroupProfile::unsexed(Relatedness::DZ)),
    (
        "MZM",
        GroupProfile::sexed(Relatedness::MZ, [Sex::Male, Sex::Male]),
    ),
    (
        "MZF",
        GroupProfile::sexed(Relatedness::MZ, [Sex::Female, Sex::Female]),
    ),
    (
        "DZM",
        GroupProfile::sexed(Relatedness::DZ, [Sex::Male, Sex::Male]),
    ),
    (
        "DZF",
        GroupProfile::sexed(Relatedness::DZ, [Sex::Female, Sex::Female]),
    ),
    (
        "DOS",
        GroupProfile::sexed(Relatedness::DZ, [Sex::Male, Sex::Female]),
    ),
];

static DEFAULT_TABLE: LazyLock<RelatednessTable> = LazyLock::new(RelatednessTable::default);

pub fn default_table() -> &'static RelatednessTable {
    &DEFAULT_TABLE
}

pub fn lookup(component: Component, group: &str) -> Result<f64> {
    default_table().lookup(component, group)
}

pub fn canonical_label(label: &str) -> String {
    label.trim().to_ascii_uppercase()
}

#[derive(Debug, Clone)]
pub struct RelatednessTable {
    profiles: BTreeMap<String, GroupProfile>,
}

impl Default for RelatednessTable {
    fn default() -> Self {
        let profiles = BUILTIN
            .iter()
            .map(|(label, profile)| (label.to_string(), *profile))
            .collect();
        Self { profiles }
    }
}

impl RelatednessTable {
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, label: &str, profile: GroupProfile) -> Result<()> {
        let key = canonical_label(label);
        if key.is_empty() {
            return Err(TwinSemError::InvalidArgument(
                "group label must not be empty".to_string(),
            ));
        }
        profile.relatedness.validate(&key)?;
        self.profiles.insert(key, profile);
        Ok(())
    }

    pub fn profile(&self, label: &str) -> Result<GroupProfile> {
        self.profiles
            .get(&canonical_label(label))
            .copied()
            .ok_or_else(|| TwinSemError::UnknownGroup(label.to_string()))
    }

    pub fn lookup(&self, component: Component, label: &str) -> Result<f64> {
        Ok(self.profile(label)?.relatedness.coefficient(component))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}
