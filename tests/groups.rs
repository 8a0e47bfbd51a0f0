use twinsem::error::TwinSemError;
use twinsem::group::{GroupDecl, first_appearance, resolve, resolve_declared, resolve_with};
use twinsem::relatedness::{GroupProfile, Relatedness, RelatednessTable, default_table, lookup};
use twinsem::types::{Component, Sex, Twin};

#[test]
fn builtin_coefficients() {
    assert_eq!(lookup(Component::A, "MZ").expect("MZ"), 1.0);
    assert_eq!(lookup(Component::A, "DZ").expect("DZ"), 0.5);
    assert_eq!(lookup(Component::D, "DZ").expect("DZ"), 0.25);
    assert_eq!(lookup(Component::C, "DOS").expect("DOS"), 1.0);
    assert_eq!(lookup(Component::E, "MZ").expect("MZ"), 0.0);
    assert_eq!(lookup(Component::A, " dzf ").expect("dzf"), 0.5);
}

#[test]
fn unknown_group_is_rejected() {
    let err = lookup(Component::A, "XX").unwrap_err();
    assert!(matches!(err, TwinSemError::UnknownGroup(ref g) if g == "XX"));
    assert!(matches!(
        resolve(&["MZ", "XX"]),
        Err(TwinSemError::UnknownGroup(_))
    ));
}

#[test]
fn dos_pairs_male_with_female() {
    let profile = default_table().profile("DOS").expect("DOS");
    assert_eq!(profile.sex(Twin::One), Some(Sex::Male));
    assert_eq!(profile.sex(Twin::Two), Some(Sex::Female));
    assert_eq!(default_table().profile("MZ").expect("MZ").sex(Twin::One), None);
}

#[test]
fn register_checks_range() {
    let mut table = RelatednessTable::empty();
    let half_sibs = Relatedness {
        a: 0.25,
        c: 1.0,
        d: 0.0,
    };
    table
        .register("hs", GroupProfile::unsexed(half_sibs))
        .expect("register half sibs");
    assert_eq!(table.lookup(Component::A, "HS").expect("HS"), 0.25);
    assert_eq!(table.labels().collect::<Vec<_>>(), vec!["HS"]);

    let bad = Relatedness {
        a: 1.5,
        c: 1.0,
        d: 1.0,
    };
    assert!(matches!(
        table.register("BAD", GroupProfile::unsexed(bad)),
        Err(TwinSemError::InvalidArgument(_))
    ));
    assert!(matches!(
        table.register("  ", GroupProfile::unsexed(half_sibs)),
        Err(TwinSemError::InvalidArgument(_))
    ));
    assert!(matches!(
        resolve_with(&table, &["MZ"]),
        Err(TwinSemError::UnknownGroup(_))
    ));
}

#[test]
fn resolve_keeps_first_appearance_order() {
    let groups = resolve(&["dz", "MZ", "DZ"]).expect("resolve");
    assert_eq!(groups.labels(), vec!["DZ".to_string(), "MZ".to_string()]);
    let dz = groups.find("dz").expect("DZ present");
    assert_eq!(groups.position(dz.id), Some(0));
    assert_eq!(dz.coefficient(Component::A), 0.5);
}

#[test]
fn conflicting_declarations_are_duplicates() {
    let decls = vec![
        GroupDecl {
            label: "MZ".to_string(),
            profile: GroupProfile::unsexed(Relatedness::MZ),
        },
        GroupDecl {
            label: "mz".to_string(),
            profile: GroupProfile::unsexed(Relatedness::DZ),
        },
    ];
    assert!(matches!(
        resolve_declared(&decls),
        Err(TwinSemError::DuplicateGroup(ref g)) if g == "MZ"
    ));
}

#[test]
fn first_appearance_skips_blanks() {
    let column = ["MZ", "", "dz", "MZ", " DZ", "DOS"];
    assert_eq!(
        first_appearance(column),
        vec!["MZ".to_string(), "DZ".to_string(), "DOS".to_string()]
    );
}

#[test]
fn reordered_keeps_ids() {
    let groups = resolve(&["MZ", "DZ"]).expect("resolve");
    let mz = groups.find("MZ").expect("MZ").id;
    let swapped = groups.reordered(&["DZ", "MZ"]).expect("reorder");
    assert_eq!(swapped.labels(), vec!["DZ".to_string(), "MZ".to_string()]);
    assert_eq!(swapped.find("MZ").expect("MZ").id, mz);
    assert_eq!(swapped.position(mz), Some(1));
    assert_eq!(swapped.get(mz).map(|g| g.label.as_str()), Some("MZ"));

    assert!(matches!(
        groups.reordered(&["DZ"]),
        Err(TwinSemError::GroupOrderMismatch { .. })
    ));
    assert!(matches!(
        groups.reordered(&["DZ", "DZ"]),
        Err(TwinSemError::GroupOrderMismatch { .. })
    ));
    assert!(matches!(
        groups.reordered(&["DZ", "DOS"]),
        Err(TwinSemError::GroupOrderMismatch { .. })
    ));
}
