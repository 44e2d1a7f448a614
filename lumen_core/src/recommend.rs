//! Recommendations derived from an allocation result.
//!
//! `recommend` is a pure function of its input: calling it twice on the same
//! result yields the same list, in a fixed order.

use crate::{AllocationResult, Locale, Warning};
use serde::{Deserialize, Serialize};

/// User-facing guidance for an allocation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    /// More lumens are needed to separate every incompatible pair
    AddLumens {
        deficit: usize,
        needed: usize,
        available: usize,
    },
    /// CVC-only drugs had no CVC lumen to go to
    AddCvcLumen { drugs: Vec<String> },
    /// Drugs involved in forced hard conflicts
    RemoveIncompatible { drugs: Vec<String> },
    SequentialAdministration,
    UseYSiteConnector,
    /// Pairs with conflicting literature data
    ConsultPharmacy { pairs: Vec<(String, String)> },
    /// Pairs with no compatibility data at all
    VerifyMissingData { pairs: Vec<(String, String)> },
    /// Selected ids missing from the database, left out of the plan
    CheckUnknownDrugs { drugs: Vec<String> },
    /// Lumens carrying photosensitive drugs
    ProtectFromLight { lumens: Vec<usize> },
    /// Enough lumens and no critical incompatibilities
    Sufficient,
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|d| d == id) {
        list.push(id.to_string());
    }
}

/// Derive recommendations from an allocation result
pub fn recommend(result: &AllocationResult) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    let mut incompatible = Vec::new();
    let mut mismatched = Vec::new();
    let mut conflicting = Vec::new();
    let mut missing = Vec::new();
    let mut unknown = Vec::new();
    let mut y_site = false;

    for warning in &result.warnings {
        match warning {
            Warning::HardConflict { drug_a, drug_b, .. } => {
                push_unique(&mut incompatible, drug_a);
                push_unique(&mut incompatible, drug_b);
            }
            Warning::YSiteRequired { .. } => y_site = true,
            Warning::TypeMismatch { drug } => push_unique(&mut mismatched, drug),
            Warning::ConflictingData { drug_a, drug_b } => {
                conflicting.push((drug_a.clone(), drug_b.clone()))
            }
            Warning::NoCompatibilityData { drug_a, drug_b } => {
                missing.push((drug_a.clone(), drug_b.clone()))
            }
            Warning::UnknownDrug { drug } => push_unique(&mut unknown, drug),
        }
    }

    if result.deficit > 0 {
        recommendations.push(Recommendation::AddLumens {
            deficit: result.deficit,
            needed: result.lumens_needed(),
            available: result.available,
        });
    }

    if !mismatched.is_empty() {
        recommendations.push(Recommendation::AddCvcLumen { drugs: mismatched });
    }

    let has_hard_conflict = !incompatible.is_empty();
    if has_hard_conflict {
        recommendations.push(Recommendation::RemoveIncompatible {
            drugs: incompatible,
        });
    }

    if has_hard_conflict || y_site {
        recommendations.push(Recommendation::SequentialAdministration);
    }

    if y_site {
        recommendations.push(Recommendation::UseYSiteConnector);
    }

    if !conflicting.is_empty() {
        recommendations.push(Recommendation::ConsultPharmacy { pairs: conflicting });
    }

    if !missing.is_empty() {
        recommendations.push(Recommendation::VerifyMissingData { pairs: missing });
    }

    if !unknown.is_empty() {
        recommendations.push(Recommendation::CheckUnknownDrugs { drugs: unknown });
    }

    let shaded: Vec<usize> = result
        .lumens
        .iter()
        .filter(|l| l.light_protection)
        .map(|l| l.index)
        .collect();
    if !shaded.is_empty() {
        recommendations.push(Recommendation::ProtectFromLight { lumens: shaded });
    }

    if result.warnings.is_empty() && result.deficit == 0 {
        recommendations.push(Recommendation::Sufficient);
    }

    recommendations
}

fn join_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(a, b)| format!("{} + {}", a, b))
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_lumens(lumens: &[usize]) -> String {
    lumens
        .iter()
        .map(|i| (i + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Recommendation {
    /// Render the recommendation in the given language.
    ///
    /// Lumens are numbered from 1 in text.
    pub fn text(&self, locale: Locale) -> String {
        match (self, locale) {
            (
                Recommendation::AddLumens {
                    deficit,
                    needed,
                    available,
                },
                Locale::It,
            ) => format!(
                "Aggiungere {} {} aggiuntivo/i per evitare incompatibilità (necessari {}, disponibili {})",
                deficit,
                if *deficit == 1 { "lume" } else { "lumi" },
                needed,
                available
            ),
            (
                Recommendation::AddLumens {
                    deficit,
                    needed,
                    available,
                },
                Locale::En,
            ) => format!(
                "Add {} additional {} to avoid incompatibilities ({} needed, {} available)",
                deficit,
                if *deficit == 1 { "lumen" } else { "lumens" },
                needed,
                available
            ),
            (Recommendation::AddCvcLumen { drugs }, Locale::It) => format!(
                "NON DISPONIBILE: {} richiede/richiedono un lume CVC. Aggiungere CVC multi-lume",
                drugs.join(", ")
            ),
            (Recommendation::AddCvcLumen { drugs }, Locale::En) => format!(
                "NOT AVAILABLE: {} require(s) a CVC lumen. Add a multi-lumen CVC",
                drugs.join(", ")
            ),
            (Recommendation::RemoveIncompatible { drugs }, Locale::It) => format!(
                "Considera rimozione farmaci incompatibili: {}",
                drugs.join(", ")
            ),
            (Recommendation::RemoveIncompatible { drugs }, Locale::En) => format!(
                "Consider removing incompatible drugs: {}",
                drugs.join(", ")
            ),
            (Recommendation::SequentialAdministration, Locale::It) => {
                "Valuta somministrazione sequenziale con flush tra farmaci".to_string()
            }
            (Recommendation::SequentialAdministration, Locale::En) => {
                "Consider sequential administration with flush between drugs".to_string()
            }
            (Recommendation::UseYSiteConnector, Locale::It) => {
                "Utilizzare connettore Y-site/rubinetto a tre vie".to_string()
            }
            (Recommendation::UseYSiteConnector, Locale::En) => {
                "Use Y-site connector/three-way stopcock".to_string()
            }
            (Recommendation::ConsultPharmacy { pairs }, Locale::It) => format!(
                "Consultare il servizio di farmacia per dati contrastanti: {}",
                join_pairs(pairs)
            ),
            (Recommendation::ConsultPharmacy { pairs }, Locale::En) => format!(
                "Consult pharmacy service for conflicting data: {}",
                join_pairs(pairs)
            ),
            (Recommendation::VerifyMissingData { pairs }, Locale::It) => format!(
                "Nessun dato di compatibilità per: {}. Verificare prima della co-somministrazione",
                join_pairs(pairs)
            ),
            (Recommendation::VerifyMissingData { pairs }, Locale::En) => format!(
                "No compatibility data for: {}. Verify before co-administration",
                join_pairs(pairs)
            ),
            (Recommendation::CheckUnknownDrugs { drugs }, Locale::It) => format!(
                "Farmaci non presenti nel database, esclusi dal piano: {}. Verificare nome o codice",
                drugs.join(", ")
            ),
            (Recommendation::CheckUnknownDrugs { drugs }, Locale::En) => format!(
                "Drugs not in the database, left out of the plan: {}. Check the name or id",
                drugs.join(", ")
            ),
            (Recommendation::ProtectFromLight { lumens }, Locale::It) => format!(
                "Farmaci fotosensibili: usare deflussori fotoprotetti sul/i lume/i {}",
                join_lumens(lumens)
            ),
            (Recommendation::ProtectFromLight { lumens }, Locale::En) => format!(
                "Photosensitive drugs: use light-protective tubing on lumen(s) {}",
                join_lumens(lumens)
            ),
            (Recommendation::Sufficient, Locale::It) => {
                "Lumi sufficienti, nessuna incompatibilità critica".to_string()
            }
            (Recommendation::Sufficient, Locale::En) => {
                "Sufficient lumens, no critical incompatibilities".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lumen;

    fn lumen(index: usize, drugs: &[&str], light_protection: bool) -> Lumen {
        Lumen {
            index,
            lumen_type: None,
            assigned: drugs.iter().map(|d| d.to_string()).collect(),
            light_protection,
        }
    }

    #[test]
    fn test_sufficient_when_clean() {
        let result = AllocationResult {
            lumens: vec![lumen(0, &["a", "b"], false)],
            available: 2,
            ..AllocationResult::default()
        };
        assert_eq!(recommend(&result), vec![Recommendation::Sufficient]);
    }

    #[test]
    fn test_deficit_and_hard_conflict() {
        let result = AllocationResult {
            lumens: vec![lumen(0, &["a", "c"], false), lumen(1, &["b"], false)],
            deficit: 1,
            available: 2,
            warnings: vec![Warning::HardConflict {
                drug_a: "a".into(),
                drug_b: "c".into(),
                lumen: 0,
            }],
            ..AllocationResult::default()
        };

        assert_eq!(
            recommend(&result),
            vec![
                Recommendation::AddLumens {
                    deficit: 1,
                    needed: 3,
                    available: 2,
                },
                Recommendation::RemoveIncompatible {
                    drugs: vec!["a".into(), "c".into()],
                },
                Recommendation::SequentialAdministration,
            ]
        );
    }

    #[test]
    fn test_y_site_guidance() {
        let result = AllocationResult {
            lumens: vec![lumen(0, &["a", "b"], false)],
            available: 1,
            warnings: vec![Warning::YSiteRequired {
                drug_a: "a".into(),
                drug_b: "b".into(),
                lumen: 0,
            }],
            ..AllocationResult::default()
        };

        assert_eq!(
            recommend(&result),
            vec![
                Recommendation::SequentialAdministration,
                Recommendation::UseYSiteConnector,
            ]
        );
    }

    #[test]
    fn test_type_mismatch_and_data_gaps() {
        let result = AllocationResult {
            lumens: vec![lumen(0, &["b", "c"], true)],
            unallocated: vec!["x".into()],
            available: 1,
            warnings: vec![
                Warning::UnknownDrug {
                    drug: "ghost".into(),
                },
                Warning::ConflictingData {
                    drug_a: "b".into(),
                    drug_b: "x".into(),
                },
                Warning::NoCompatibilityData {
                    drug_a: "b".into(),
                    drug_b: "c".into(),
                },
                Warning::TypeMismatch { drug: "x".into() },
            ],
            ..AllocationResult::default()
        };

        assert_eq!(
            recommend(&result),
            vec![
                Recommendation::AddCvcLumen {
                    drugs: vec!["x".into()],
                },
                Recommendation::ConsultPharmacy {
                    pairs: vec![("b".into(), "x".into())],
                },
                Recommendation::VerifyMissingData {
                    pairs: vec![("b".into(), "c".into())],
                },
                Recommendation::CheckUnknownDrugs {
                    drugs: vec!["ghost".into()],
                },
                Recommendation::ProtectFromLight { lumens: vec![0] },
            ]
        );
    }

    #[test]
    fn test_only_unknown_drugs_is_not_silent() {
        let result = AllocationResult {
            available: 3,
            warnings: vec![Warning::UnknownDrug {
                drug: "ghost".into(),
            }],
            ..AllocationResult::default()
        };

        let recommendations = recommend(&result);
        assert_eq!(
            recommendations,
            vec![Recommendation::CheckUnknownDrugs {
                drugs: vec!["ghost".into()],
            }]
        );
        assert!(recommendations[0].text(Locale::En).contains("ghost"));
    }

    #[test]
    fn test_recommend_is_idempotent() {
        let result = AllocationResult {
            lumens: vec![lumen(0, &["a", "b", "c"], true)],
            deficit: 2,
            available: 1,
            warnings: vec![
                Warning::HardConflict {
                    drug_a: "a".into(),
                    drug_b: "b".into(),
                    lumen: 0,
                },
                Warning::HardConflict {
                    drug_a: "a".into(),
                    drug_b: "c".into(),
                    lumen: 0,
                },
            ],
            ..AllocationResult::default()
        };

        let first = recommend(&result);
        assert_eq!(first, recommend(&result));
        assert!(first.contains(&Recommendation::RemoveIncompatible {
            drugs: vec!["a".into(), "b".into(), "c".into()],
        }));
    }

    #[test]
    fn test_text_is_bilingual() {
        let rec = Recommendation::AddLumens {
            deficit: 2,
            needed: 5,
            available: 3,
        };
        assert_eq!(
            rec.text(Locale::En),
            "Add 2 additional lumens to avoid incompatibilities (5 needed, 3 available)"
        );
        assert!(rec.text(Locale::It).starts_with("Aggiungere 2 lumi"));

        let light = Recommendation::ProtectFromLight { lumens: vec![0, 2] };
        assert!(light.text(Locale::En).ends_with("lumen(s) 1, 3"));
    }
}
