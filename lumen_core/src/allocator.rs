//! Lumen allocation.
//!
//! Deterministic greedy coloring of the conflict graph with a lumen type
//! constraint:
//!
//! 1. Drugs are ordered by descending hard-edge degree, ties broken by
//!    selection order.
//! 2. Each drug goes to the lowest-index configured lumen whose type accepts
//!    it and which holds no drug it has a hard edge with.
//! 3. A drug that no configured lumen type accepts is left unallocated with a
//!    `TypeMismatch` warning.
//! 4. Otherwise, when every accepting lumen is blocked, the drug goes to an
//!    overflow lumen (first-fit over overflow lumens, opened as needed).
//!    `deficit` is the number of overflow lumens.
//! 5. Overflow drugs are then physically placed into the accepting configured
//!    lumen where they cause the fewest hard conflicts (lowest index on ties),
//!    so every violation is explicit and attached to a lumen.
//!
//! This is a heuristic; it does not search for the minimum number of lumens.

use crate::{
    AllocationResult, ConflictGraph, Error, Lumen, LumenSlot, LumenType, Result, Warning,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lumen count plus optional per-lumen types, as entered by the user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LumenConfiguration {
    #[serde(default = "default_lumen_count")]
    pub count: u32,
    /// Types of the first `types.len()` lumens; the rest are untyped
    #[serde(default)]
    pub types: Vec<LumenType>,
}

// Triple-lumen CVC
fn default_lumen_count() -> u32 {
    3
}

impl Default for LumenConfiguration {
    fn default() -> Self {
        Self {
            count: default_lumen_count(),
            types: Vec::new(),
        }
    }
}

impl LumenConfiguration {
    pub fn new(count: u32, types: Vec<LumenType>) -> Self {
        Self { count, types }
    }

    /// Expand into slots `0..count`, rejecting unusable configurations
    pub fn slots(&self) -> Result<Vec<LumenSlot>> {
        if self.count == 0 {
            return Err(Error::InvalidConfiguration(
                "at least one lumen is required".into(),
            ));
        }
        if self.types.len() > self.count as usize {
            return Err(Error::InvalidConfiguration(format!(
                "{} lumen types given for {} lumens",
                self.types.len(),
                self.count
            )));
        }

        Ok((0..self.count as usize)
            .map(|index| LumenSlot {
                index,
                lumen_type: self.types.get(index).copied(),
            })
            .collect())
    }
}

pub(crate) fn validate_slots(slots: &[LumenSlot]) -> Result<()> {
    if slots.is_empty() {
        return Err(Error::InvalidConfiguration(
            "at least one lumen is required".into(),
        ));
    }

    let mut seen = HashSet::new();
    for slot in slots {
        if !seen.insert(slot.index) {
            return Err(Error::InvalidConfiguration(format!(
                "lumen index {} is configured twice",
                slot.index
            )));
        }
    }

    Ok(())
}

/// Allocate the drugs of a conflict graph to lumens.
///
/// Fails only for an invalid lumen configuration. Graph warnings (unknown
/// drugs, missing or conflicting data) are carried into the result.
pub fn allocate(graph: &ConflictGraph, slots: &[LumenSlot]) -> Result<AllocationResult> {
    validate_slots(slots)?;

    let mut slots = slots.to_vec();
    slots.sort_by_key(|s| s.index);

    let mut result = AllocationResult::empty(slots.len());
    result.warnings.extend(graph.warnings().iter().cloned());

    if graph.is_empty() {
        return Ok(result);
    }

    let nodes = graph.nodes();
    let degrees: Vec<usize> = (0..nodes.len()).map(|i| graph.hard_degree(i)).collect();
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| degrees[b].cmp(&degrees[a]).then(a.cmp(&b)));

    let conflicts = |members: &[usize], node: usize| {
        members
            .iter()
            .filter(|&&m| graph.has_hard_edge(m, node))
            .count()
    };

    // Node positions per configured lumen and per overflow lumen
    let mut placed: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
    let mut overflow: Vec<Vec<usize>> = Vec::new();
    let mut unallocated: Vec<usize> = Vec::new();

    for &node in &order {
        let drug = &nodes[node];

        if !slots.iter().any(|s| s.accepts(drug.cvc_required)) {
            tracing::warn!("No configured lumen accepts CVC-only drug '{}'", drug.id);
            unallocated.push(node);
            continue;
        }

        let target = (0..slots.len())
            .find(|&k| slots[k].accepts(drug.cvc_required) && conflicts(&placed[k], node) == 0);

        if let Some(k) = target {
            tracing::debug!("Placed '{}' in lumen {}", drug.id, slots[k].index);
            placed[k].push(node);
            continue;
        }

        match overflow.iter().position(|m| conflicts(m, node) == 0) {
            Some(k) => overflow[k].push(node),
            None => overflow.push(vec![node]),
        }
        tracing::debug!("'{}' needs an overflow lumen", drug.id);
    }

    result.deficit = overflow.len();

    for &node in overflow.iter().flatten() {
        let drug = &nodes[node];
        let target = (0..slots.len())
            .filter(|&k| slots[k].accepts(drug.cvc_required))
            .min_by_key(|&k| (conflicts(&placed[k], node), k));

        if let Some(k) = target {
            tracing::warn!(
                "Forcing '{}' into lumen {} despite incompatibility",
                drug.id,
                slots[k].index
            );
            placed[k].push(node);
        }
    }

    unallocated.sort_unstable();
    for &node in &unallocated {
        result.unallocated.push(nodes[node].id.clone());
        result.warnings.push(Warning::TypeMismatch {
            drug: nodes[node].id.clone(),
        });
    }

    for (slot, members) in slots.iter().zip(&placed) {
        if members.is_empty() {
            continue;
        }

        for (pos, &p) in members.iter().enumerate() {
            for &q in &members[pos + 1..] {
                let (drug_a, drug_b) = (nodes[p].id.clone(), nodes[q].id.clone());
                if graph.has_hard_edge(p, q) {
                    result.warnings.push(Warning::HardConflict {
                        drug_a,
                        drug_b,
                        lumen: slot.index,
                    });
                } else if graph.has_soft_edge(p, q) {
                    result.warnings.push(Warning::YSiteRequired {
                        drug_a,
                        drug_b,
                        lumen: slot.index,
                    });
                }
            }
        }

        result.lumens.push(Lumen {
            index: slot.index,
            lumen_type: slot.lumen_type,
            assigned: members.iter().map(|&n| nodes[n].id.clone()).collect(),
            light_protection: members.iter().any(|&n| nodes[n].photosensitive),
        });
    }

    tracing::info!(
        "Allocated {} drugs into {} of {} lumens (deficit {}, unallocated {})",
        nodes.len() - result.unallocated.len(),
        result.lumens.len(),
        result.available,
        result.deficit,
        result.unallocated.len()
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sample_database, CompatibilityStatus, ConflictGraphBuilder, DrugDatabase, DrugEntry,
        LocalizedText,
    };

    fn test_db(drugs: &[(&str, bool)], pairs: &[(&str, &str, CompatibilityStatus)]) -> DrugDatabase {
        let mut db = DrugDatabase::new();
        for &(id, cvc_required) in drugs {
            db.insert_drug(DrugEntry {
                id: id.into(),
                name: LocalizedText::new(id, id),
                photosensitive: false,
                cvc_required,
            });
        }
        for &(a, b, status) in pairs {
            db.insert_pair(a, b, status);
        }
        db
    }

    fn untyped(count: usize) -> Vec<LumenSlot> {
        (0..count).map(LumenSlot::untyped).collect()
    }

    fn run(db: &DrugDatabase, selection: &[&str], slots: &[LumenSlot]) -> AllocationResult {
        let graph = ConflictGraphBuilder::new(db).build(selection);
        allocate(&graph, slots).unwrap()
    }

    /// Every pair of co-located drugs with a hard edge must carry a warning
    fn assert_conflicts_flagged(db: &DrugDatabase, selection: &[&str], result: &AllocationResult) {
        let graph = ConflictGraphBuilder::new(db).build(selection);
        for lumen in &result.lumens {
            for (i, a) in lumen.assigned.iter().enumerate() {
                for b in &lumen.assigned[i + 1..] {
                    let (pa, pb) = (graph.position(a).unwrap(), graph.position(b).unwrap());
                    if graph.has_hard_edge(pa, pb) {
                        assert!(
                            result.warnings.iter().any(|w| matches!(
                                w,
                                Warning::HardConflict { drug_a, drug_b, lumen: l }
                                    if *l == lumen.index
                                        && ((drug_a == a && drug_b == b) || (drug_a == b && drug_b == a))
                            )),
                            "unflagged conflict {} / {} in lumen {}",
                            a,
                            b,
                            lumen.index
                        );
                    }
                }
            }
        }
    }

    fn complete_incompatible(ids: &[&'static str]) -> DrugDatabase {
        let drugs: Vec<(&str, bool)> = ids.iter().map(|&id| (id, false)).collect();
        let mut pairs = Vec::new();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                pairs.push((*a, *b, CompatibilityStatus::Incompatible));
            }
        }
        test_db(&drugs, &pairs)
    }

    #[test]
    fn test_single_incompatible_pair_two_lumens() {
        let db = test_db(
            &[("a", false), ("b", false), ("c", false)],
            &[
                ("a", "b", CompatibilityStatus::Incompatible),
                ("a", "c", CompatibilityStatus::Compatible),
                ("b", "c", CompatibilityStatus::Compatible),
            ],
        );
        let result = run(&db, &["a", "b", "c"], &untyped(2));

        assert_eq!(result.lumens.len(), 2);
        assert_eq!(result.lumens[0].index, 0);
        assert_eq!(result.lumens[0].assigned, vec!["a", "c"]);
        assert_eq!(result.lumens[1].index, 1);
        assert_eq!(result.lumens[1].assigned, vec!["b"]);
        assert_eq!(result.deficit, 0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_three_mutually_incompatible_two_lumens() {
        let db = complete_incompatible(&["a", "b", "c"]);
        let result = run(&db, &["a", "b", "c"], &untyped(2));

        assert_eq!(result.deficit, 1);
        assert_eq!(result.lumens_needed(), 3);
        assert_eq!(result.lumens[0].assigned, vec!["a", "c"]);
        assert_eq!(result.lumens[1].assigned, vec!["b"]);
        assert_eq!(
            result.warnings,
            vec![Warning::HardConflict {
                drug_a: "a".into(),
                drug_b: "c".into(),
                lumen: 0,
            }]
        );
    }

    #[test]
    fn test_y_site_pair_single_lumen() {
        let db = test_db(
            &[("a", false), ("b", false)],
            &[("a", "b", CompatibilityStatus::YSiteOnly)],
        );
        let result = run(&db, &["a", "b"], &untyped(1));

        assert_eq!(result.lumens.len(), 1);
        assert_eq!(result.lumens[0].assigned, vec!["a", "b"]);
        assert_eq!(result.deficit, 0);
        assert_eq!(
            result.warnings,
            vec![Warning::YSiteRequired {
                drug_a: "a".into(),
                drug_b: "b".into(),
                lumen: 0,
            }]
        );
    }

    #[test]
    fn test_cvc_drug_with_only_picc_is_unallocated() {
        let db = test_db(&[("x", true)], &[]);
        let result = run(&db, &["x"], &[LumenSlot::typed(0, LumenType::Picc)]);

        assert!(result.lumens.is_empty());
        assert_eq!(result.unallocated, vec!["x"]);
        assert_eq!(result.deficit, 0);
        assert_eq!(
            result.warnings,
            vec![Warning::TypeMismatch { drug: "x".into() }]
        );
    }

    #[test]
    fn test_empty_selection() {
        let graph = ConflictGraphBuilder::new(sample_database()).build::<&str>(&[]);
        let result = allocate(&graph, &untyped(3)).unwrap();

        assert!(result.lumens.is_empty());
        assert!(result.unallocated.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.deficit, 0);
        assert_eq!(result.available, 3);
    }

    #[test]
    fn test_single_drug_goes_to_first_compatible_lumen() {
        let db = test_db(&[("x", true)], &[]);
        let slots = [
            LumenSlot::typed(0, LumenType::Picc),
            LumenSlot::typed(1, LumenType::Cvc),
        ];
        let result = run(&db, &["x"], &slots);

        assert_eq!(result.lumen_of("x"), Some(1));
        assert_eq!(result.lumens[0].lumen_type, Some(LumenType::Cvc));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_all_incompatible_deficit() {
        let ids = ["a", "b", "c", "d", "e", "f"];
        let db = complete_incompatible(&ids);

        for lumens in 3..=6 {
            let result = run(&db, &ids, &untyped(lumens));
            assert_eq!(result.deficit, ids.len() - lumens);
            assert_eq!(result.hard_conflict_count(), ids.len() - lumens);
            for lumen in &result.lumens {
                assert!(lumen.assigned.len() <= 2);
            }
            assert_conflicts_flagged(&db, &ids, &result);
        }
    }

    #[test]
    fn test_degree_ordering() {
        // "hub" conflicts with everyone else and is placed first despite
        // being selected last
        let db = test_db(
            &[("a", false), ("b", false), ("hub", false)],
            &[
                ("hub", "a", CompatibilityStatus::Incompatible),
                ("hub", "b", CompatibilityStatus::Incompatible),
                ("a", "b", CompatibilityStatus::Compatible),
            ],
        );
        let result = run(&db, &["a", "b", "hub"], &untyped(2));

        assert_eq!(result.lumen_of("hub"), Some(0));
        assert_eq!(result.lumens[1].assigned, vec!["a", "b"]);
    }

    #[test]
    fn test_blocked_cvc_lumen_overflows_instead_of_mismatch() {
        let db = test_db(
            &[("x", true), ("y", true)],
            &[("x", "y", CompatibilityStatus::Incompatible)],
        );
        let slots = [
            LumenSlot::typed(0, LumenType::Cvc),
            LumenSlot::typed(1, LumenType::Picc),
        ];
        let result = run(&db, &["x", "y"], &slots);

        assert_eq!(result.deficit, 1);
        assert!(result.unallocated.is_empty());
        assert_eq!(result.lumens.len(), 1);
        assert_eq!(result.lumens[0].assigned, vec!["x", "y"]);
        assert_eq!(result.hard_conflict_count(), 1);
        assert_eq!(result.lumens_needed(), result.available + result.deficit);
    }

    #[test]
    fn test_needed_exceeds_available_with_idle_typed_lumen() {
        let db = test_db(
            &[("x", true), ("y", true), ("z", false)],
            &[
                ("x", "y", CompatibilityStatus::Incompatible),
                ("x", "z", CompatibilityStatus::Compatible),
                ("y", "z", CompatibilityStatus::Compatible),
            ],
        );
        let slots = [
            LumenSlot::typed(0, LumenType::Cvc),
            LumenSlot::typed(1, LumenType::Picc),
        ];
        let result = run(&db, &["x", "y", "z"], &slots);

        assert_eq!(result.deficit, 1);
        assert_eq!(result.lumens.len(), 1);
        assert_eq!(result.lumens_needed(), 3);
        assert!(result.lumens_needed() > result.available);
    }

    #[test]
    fn test_cycle_monotonic_in_lumen_count() {
        let ids = ["a", "b", "c", "d", "e"];
        let db = test_db(
            &ids.map(|id| (id, false)),
            &[
                ("a", "b", CompatibilityStatus::Incompatible),
                ("b", "c", CompatibilityStatus::Incompatible),
                ("c", "d", CompatibilityStatus::Incompatible),
                ("d", "e", CompatibilityStatus::Incompatible),
                ("e", "a", CompatibilityStatus::Incompatible),
            ],
        );

        let results: Vec<AllocationResult> =
            (1..=4).map(|l| run(&db, &ids, &untyped(l))).collect();

        let deficits: Vec<usize> = results.iter().map(|r| r.deficit).collect();
        let conflicts: Vec<usize> = results.iter().map(|r| r.hard_conflict_count()).collect();
        assert_eq!(deficits, vec![2, 1, 0, 0]);
        assert_eq!(conflicts, vec![5, 1, 0, 0]);

        for result in &results {
            assert_conflicts_flagged(&db, &ids, result);
        }
    }

    #[test]
    fn test_monotonic_over_sample_database() {
        let db = sample_database();
        let selection = [
            "noradrenalina",
            "furosemide",
            "midazolam",
            "amiodarone",
            "eparina",
            "pantoprazolo",
            "propofol",
        ];

        let mut previous: Option<AllocationResult> = None;
        for lumens in 1..=7 {
            let result = run(db, &selection, &untyped(lumens));
            assert_conflicts_flagged(db, &selection, &result);
            if let Some(prev) = &previous {
                assert!(result.deficit <= prev.deficit);
                assert!(result.hard_conflict_count() <= prev.hard_conflict_count());
            }
            previous = Some(result);
        }
        assert_eq!(previous.map(|r| r.deficit), Some(0));
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let selection = ["propofol", "midazolam", "noradrenalina", "insulina", "furosemide"];
        let slots = untyped(2);

        let first = serde_json::to_string(&run(sample_database(), &selection, &slots)).unwrap();
        let second = serde_json::to_string(&run(sample_database(), &selection, &slots)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_light_protection_flag() {
        let result = run(sample_database(), &["furosemide", "eparina"], &untyped(2));
        assert_eq!(result.lumens.len(), 1);
        assert!(result.lumens[0].light_protection);

        let result = run(sample_database(), &["fentanil", "midazolam"], &untyped(2));
        assert!(!result.lumens[0].light_protection);
    }

    #[test]
    fn test_graph_warnings_carried_over() {
        let result = run(sample_database(), &["ghost", "insulina", "fentanil"], &untyped(2));
        assert_eq!(
            result.warnings,
            vec![
                Warning::UnknownDrug {
                    drug: "ghost".into()
                },
                Warning::NoCompatibilityData {
                    drug_a: "insulina".into(),
                    drug_b: "fentanil".into(),
                },
            ]
        );
        assert_eq!(result.lumens[0].assigned, vec!["insulina", "fentanil"]);
    }

    #[test]
    fn test_slots_scanned_in_index_order() {
        let db = test_db(&[("a", false)], &[]);
        let slots = [LumenSlot::untyped(5), LumenSlot::untyped(2)];
        let result = run(&db, &["a"], &slots);
        assert_eq!(result.lumen_of("a"), Some(2));
    }

    #[test]
    fn test_invalid_slots_rejected() {
        let graph = ConflictGraphBuilder::new(sample_database()).build(&["propofol"]);

        assert!(matches!(
            allocate(&graph, &[]),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            allocate(&graph, &[LumenSlot::untyped(1), LumenSlot::untyped(1)]),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_lumen_configuration_slots() {
        let config = LumenConfiguration::new(3, vec![LumenType::Cvc, LumenType::Picc]);
        let slots = config.slots().unwrap();
        assert_eq!(
            slots,
            vec![
                LumenSlot::typed(0, LumenType::Cvc),
                LumenSlot::typed(1, LumenType::Picc),
                LumenSlot::untyped(2),
            ]
        );

        assert!(matches!(
            LumenConfiguration::new(0, vec![]).slots(),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            LumenConfiguration::new(1, vec![LumenType::Cvc, LumenType::Cvc]).slots(),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
