use crate::model::{PilotCode, RestrictionSet, Role, RoleMap};
use serde::Serialize;
use std::collections::BTreeSet;

/// The bipartite graph for one day: PIC side, SIC side and the edges that
/// survive the restriction table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairingProblem {
    pub pics: Vec<PilotCode>,
    pub sics: Vec<PilotCode>,
    /// Every (PIC, SIC) combination not forbidden by a restriction.
    pub edges: Vec<(PilotCode, PilotCode)>,
    /// Available pilots without a PIC/SIC role. They take no part in pairing.
    pub unroled: Vec<PilotCode>,
}

/// Partition the available pilots by role and build the allowed edges.
///
/// Pure function of its inputs. Duplicates in `available` collapse, all
/// lists come out sorted. Codes are already case-normalized by `PilotCode`,
/// so role and restriction lookups are case-insensitive.
pub fn build_allowed_pairs(
    available: &[PilotCode],
    roles: &RoleMap,
    restrictions: &RestrictionSet,
) -> PairingProblem {
    let available: BTreeSet<&PilotCode> = available.iter().collect();

    let mut problem = PairingProblem::default();
    for pilot in available {
        match roles.role_of(pilot) {
            Some(Role::Pic) => problem.pics.push(pilot.clone()),
            Some(Role::Sic) => problem.sics.push(pilot.clone()),
            None => problem.unroled.push(pilot.clone()),
        }
    }

    problem.edges = problem
        .pics
        .iter()
        .flat_map(|pic| problem.sics.iter().map(move |sic| (pic, sic)))
        .filter(|(pic, sic)| !restrictions.forbids(pic, sic))
        .map(|(pic, sic)| (pic.clone(), sic.clone()))
        .collect();

    problem
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn code(s: &str) -> PilotCode {
        PilotCode::parse(s).unwrap()
    }

    fn codes(list: &[&str]) -> Vec<PilotCode> {
        list.iter().map(|s| code(s)).collect()
    }

    #[test]
    fn test_restricted_pair_removed() {
        let roles: RoleMap = [
            (code("KVB"), Role::Pic),
            (code("HEB"), Role::Sic),
            (code("YAD"), Role::Sic),
        ]
        .into_iter()
        .collect();
        let restrictions: RestrictionSet = [(code("kvb"), code("heb"))].into_iter().collect();

        let problem = build_allowed_pairs(&codes(&["KVB", "HEB", "YAD"]), &roles, &restrictions);
        assert_eq!(problem.pics, codes(&["KVB"]));
        assert_eq!(problem.sics, codes(&["HEB", "YAD"]));
        assert_eq!(problem.edges, vec![(code("KVB"), code("YAD"))]);
    }

    #[test]
    fn test_unroled_and_unrecognized_are_excluded() {
        let mut roles = RoleMap::new();
        roles.insert(code("KVB"), Role::Pic);
        roles.insert_unrecognized(code("JSN"), "Instructor".into());

        let problem = build_allowed_pairs(
            &codes(&["KVB", "JSN", "XYZ", "KVB"]),
            &roles,
            &RestrictionSet::new(),
        );
        assert_eq!(problem.pics, codes(&["KVB"]));
        assert!(problem.sics.is_empty());
        assert!(problem.edges.is_empty());
        assert_eq!(problem.unroled, codes(&["JSN", "XYZ"]));
    }

    #[test]
    fn test_nothing_available() {
        let roles: RoleMap = [(code("KVB"), Role::Pic)].into_iter().collect();
        let problem = build_allowed_pairs(&[], &roles, &RestrictionSet::new());
        assert_eq!(problem, PairingProblem::default());
    }

    fn pilot_strategy() -> impl Strategy<Value = PilotCode> {
        "[A-Z]{2,3}".prop_map(|s| PilotCode::parse(&s).unwrap())
    }

    proptest! {
        #[test]
        fn prop_edges_are_cross_product_minus_restrictions(
            available in prop::collection::vec(pilot_strategy(), 0..10),
            pic_flags in prop::collection::vec(any::<Option<bool>>(), 10),
            restricted in prop::collection::vec((0usize..10, 0usize..10), 0..10),
        ) {
            let roles: RoleMap = available
                .iter()
                .zip(&pic_flags)
                .filter_map(|(p, flag)| flag.map(|pic| (p.clone(), if pic { Role::Pic } else { Role::Sic })))
                .collect();
            let restrictions: RestrictionSet = restricted
                .iter()
                .filter_map(|(a, b)| Some((available.get(*a)?.clone(), available.get(*b)?.clone())))
                .collect();

            let problem = build_allowed_pairs(&available, &roles, &restrictions);

            for (pic, sic) in &problem.edges {
                prop_assert!(!restrictions.forbids(pic, sic));
                prop_assert_eq!(roles.role_of(pic), Some(Role::Pic));
                prop_assert_eq!(roles.role_of(sic), Some(Role::Sic));
            }
            let expected = problem.pics.len() * problem.sics.len()
                - problem
                    .pics
                    .iter()
                    .flat_map(|p| problem.sics.iter().map(move |s| (p, s)))
                    .filter(|(p, s)| restrictions.forbids(p, s))
                    .count();
            prop_assert_eq!(problem.edges.len(), expected);

            let unique: BTreeSet<_> = problem.edges.iter().collect();
            prop_assert_eq!(unique.len(), problem.edges.len());
        }
    }
}
