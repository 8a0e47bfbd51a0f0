//! Resolution of observed group labels into an ordered arena of groups.
//!
//! Every coefficient in a specification is keyed by [`GroupId`], so the
//! order of a [`GroupSet`] only matters when a specification is flattened
//! into positional group vectors for an engine.

use crate::error::{Result, TwinSemError};
use crate::relatedness::{GroupProfile, RelatednessTable, canonical_label, default_table};
use crate::types::{Component, Sex, Twin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: GroupId,
    pub label: String,
    pub profile: GroupProfile,
}

impl Group {
    pub fn coefficient(&self, component: Component) -> f64 {
        self.profile.relatedness.coefficient(component)
    }

    pub fn sex(&self, twin: Twin) -> Option<Sex> {
        self.profile.sex(twin)
    }

    pub fn is_sexed(&self) -> bool {
        self.profile.sexes.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct GroupDecl {
    pub label: String,
    pub profile: GroupProfile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSet {
    groups: Vec<Group>,
    order: Vec<GroupId>,
}

impl GroupSet {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.order.iter().map(|id| &self.groups[id.0])
    }

    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    pub fn find(&self, label: &str) -> Option<&Group> {
        let key = canonical_label(label);
        self.groups.iter().find(|g| g.label == key)
    }

    pub fn labels(&self) -> Vec<String> {
        self.iter().map(|g| g.label.clone()).collect()
    }

    pub fn position(&self, id: GroupId) -> Option<usize> {
        self.order.iter().position(|g| *g == id)
    }

    pub fn reordered<S: AsRef<str>>(&self, order: &[S]) -> Result<GroupSet> {
        let mismatch = || TwinSemError::GroupOrderMismatch {
            expected: self.labels().join(","),
            found: order
                .iter()
                .map(|s| canonical_label(s.as_ref()))
                .collect::<Vec<_>>()
                .join(","),
        };
        if order.len() != self.len() {
            return Err(mismatch());
        }
        let mut ids = Vec::with_capacity(order.len());
        for label in order {
            let group = self.find(label.as_ref()).ok_or_else(mismatch)?;
            if ids.contains(&group.id) {
                return Err(mismatch());
            }
            ids.push(group.id);
        }
        Ok(GroupSet {
            groups: self.groups.clone(),
            order: ids,
        })
    }
}

pub fn resolve<S: AsRef<str>>(labels: &[S]) -> Result<GroupSet> {
    resolve_with(default_table(), labels)
}

pub fn resolve_with<S: AsRef<str>>(table: &RelatednessTable, labels: &[S]) -> Result<GroupSet> {
    let decls = labels
        .iter()
        .map(|label| {
            Ok(GroupDecl {
                label: label.as_ref().to_string(),
                profile: table.profile(label.as_ref())?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    resolve_declared(&decls)
}

pub fn resolve_declared(decls: &[GroupDecl]) -> Result<GroupSet> {
    let mut groups: Vec<Group> = Vec::with_capacity(decls.len());
    for decl in decls {
        let label = canonical_label(&decl.label);
        if label.is_empty() {
            return Err(TwinSemError::UnknownGroup(decl.label.clone()));
        }
        if let Some(existing) = groups.iter().find(|g| g.label == label) {
            if existing.profile != decl.profile {
                return Err(TwinSemError::DuplicateGroup(label));
            }
            continue;
        }
        groups.push(Group {
            id: GroupId(groups.len()),
            label,
            profile: decl.profile,
        });
    }
    let order = groups.iter().map(|g| g.id).collect();
    Ok(GroupSet { groups, order })
}

pub fn first_appearance<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let label = canonical_label(value.as_ref());
        if !label.is_empty() && !out.contains(&label) {
            out.push(label);
        }
    }
    out
}
