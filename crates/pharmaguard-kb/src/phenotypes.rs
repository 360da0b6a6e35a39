//! Curated diplotype → phenotype table, per-allele activity scores and the
//! optional activity-score bands used for diplotypes the table does not list.

use std::collections::HashMap;

use pharmaguard_common::{Gene, PharmaGuardError, Phenotype, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiplotypeRow {
    pub gene: Gene,
    pub alleles: [String; 2],
    pub phenotype: Phenotype,
}

/// Summed activity score `<= max_score` maps to `phenotype`. Bands are
/// checked in ascending `max_score` order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdBand {
    pub max_score: f64,
    pub phenotype: Phenotype,
}

/// Order-insensitive key: alleles stored sorted.
fn pair_key(gene: Gene, a: &str, b: &str) -> (Gene, String, String) {
    let (a, b) = (a.trim(), b.trim());
    if a <= b {
        (gene, a.to_string(), b.to_string())
    } else {
        (gene, b.to_string(), a.to_string())
    }
}

#[derive(Debug, Default)]
pub struct PhenotypeTable {
    curated: HashMap<(Gene, String, String), Phenotype>,
    scores: HashMap<Gene, HashMap<String, f64>>,
    thresholds: HashMap<Gene, Vec<ThresholdBand>>,
}

impl PhenotypeTable {
    pub fn new(
        rows: Vec<DiplotypeRow>,
        scores: HashMap<Gene, HashMap<String, f64>>,
        thresholds: HashMap<Gene, Vec<ThresholdBand>>,
    ) -> Result<Self> {
        let mut curated = HashMap::with_capacity(rows.len());
        for row in rows {
            let [a, b] = &row.alleles;
            if row.phenotype == Phenotype::Unknown {
                return Err(PharmaGuardError::KnowledgeBase(format!(
                    "curated diplotype {} {a}/{b} must name a phenotype",
                    row.gene
                )));
            }
            if curated.insert(pair_key(row.gene, a, b), row.phenotype).is_some() {
                return Err(PharmaGuardError::KnowledgeBase(format!(
                    "duplicate curated diplotype {} {a}/{b}",
                    row.gene
                )));
            }
        }

        let mut thresholds = thresholds;
        for bands in thresholds.values_mut() {
            bands.sort_by(|x, y| x.max_score.total_cmp(&y.max_score));
        }

        Ok(Self { curated, scores, thresholds })
    }

    /// Curated lookup. `(a, b)` and `(b, a)` always agree.
    pub fn lookup(&self, gene: Gene, a: &str, b: &str) -> Option<Phenotype> {
        self.curated.get(&pair_key(gene, a, b)).copied()
    }

    pub fn activity_score(&self, gene: Gene, star: &str) -> Option<f64> {
        self.scores.get(&gene)?.get(star.trim()).copied()
    }

    /// Sum of both alleles' scores; `None` if either is unscored.
    pub fn diplotype_score(&self, gene: Gene, a: &str, b: &str) -> Option<f64> {
        Some(self.activity_score(gene, a)? + self.activity_score(gene, b)?)
    }

    /// Band the summed score against configured thresholds. `None` when the
    /// gene has no bands, an allele is unscored, or the score exceeds every band.
    pub fn threshold_phenotype(&self, gene: Gene, a: &str, b: &str) -> Option<Phenotype> {
        let bands = self.thresholds.get(&gene)?;
        let score = self.diplotype_score(gene, a, b)?;
        bands.iter().find(|band| score <= band.max_score).map(|band| band.phenotype)
    }

    pub fn has_thresholds(&self, gene: Gene) -> bool {
        self.thresholds.get(&gene).is_some_and(|b| !b.is_empty())
    }

    pub fn curated_len(&self) -> usize {
        self.curated.len()
    }

    pub fn scored_allele_count(&self) -> usize {
        self.scores.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(gene: Gene, a: &str, b: &str, phenotype: Phenotype) -> DiplotypeRow {
        DiplotypeRow { gene, alleles: [a.to_string(), b.to_string()], phenotype }
    }

    fn table() -> PhenotypeTable {
        let mut scores = HashMap::new();
        scores.insert(
            Gene::Cyp2c9,
            HashMap::from([("*1".to_string(), 1.0), ("*2".to_string(), 0.5), ("*3".to_string(), 0.25), ("*13".to_string(), 0.0)]),
        );
        let mut thresholds = HashMap::new();
        thresholds.insert(
            Gene::Cyp2c9,
            vec![
                ThresholdBand { max_score: 2.0, phenotype: Phenotype::Normal },
                ThresholdBand { max_score: 0.0, phenotype: Phenotype::Poor },
                ThresholdBand { max_score: 1.0, phenotype: Phenotype::Intermediate },
            ],
        );
        PhenotypeTable::new(
            vec![
                row(Gene::Cyp2d6, "*4", "*6", Phenotype::Poor),
                row(Gene::Cyp2c9, "*1", "*3", Phenotype::Intermediate),
            ],
            scores,
            thresholds,
        )
        .unwrap()
    }

    #[test]
    fn test_curated_lookup_order_insensitive() {
        let t = table();
        assert_eq!(t.lookup(Gene::Cyp2d6, "*4", "*6"), Some(Phenotype::Poor));
        assert_eq!(t.lookup(Gene::Cyp2d6, "*6", "*4"), Some(Phenotype::Poor));
        assert_eq!(t.lookup(Gene::Cyp2c19, "*4", "*6"), None);
    }

    #[test]
    fn test_duplicate_row_in_reverse_order_rejected() {
        let err = PhenotypeTable::new(
            vec![
                row(Gene::Tpmt, "*1", "*2", Phenotype::Intermediate),
                row(Gene::Tpmt, "*2", "*1", Phenotype::Intermediate),
            ],
            HashMap::new(),
            HashMap::new(),
        );
        assert!(matches!(err, Err(PharmaGuardError::KnowledgeBase(_))));
    }

    #[test]
    fn test_threshold_bands_sorted_and_applied() {
        let t = table();
        assert!(t.has_thresholds(Gene::Cyp2c9));
        assert_eq!(t.threshold_phenotype(Gene::Cyp2c9, "*13", "*13"), Some(Phenotype::Poor));
        assert_eq!(t.threshold_phenotype(Gene::Cyp2c9, "*2", "*3"), Some(Phenotype::Intermediate));
        assert_eq!(t.threshold_phenotype(Gene::Cyp2c9, "*1", "*2"), Some(Phenotype::Normal));
        assert_eq!(t.threshold_phenotype(Gene::Cyp2c9, "*1", "*99"), None);
        assert_eq!(t.threshold_phenotype(Gene::Cyp2d6, "*1", "*1"), None);
    }

    #[test]
    fn test_diplotype_score() {
        let t = table();
        assert_eq!(t.diplotype_score(Gene::Cyp2c9, "*2", "*3"), Some(0.75));
        assert_eq!(t.activity_score(Gene::Cyp2c9, "*99"), None);
        assert_eq!(t.scored_allele_count(), 4);
    }

    proptest! {
        #[test]
        fn prop_lookup_symmetric(a in "\\*[0-9]{1,2}", b in "\\*[0-9]{1,2}") {
            let t = PhenotypeTable::new(
                vec![row(Gene::Cyp2d6, &a, &b, Phenotype::Intermediate)],
                HashMap::new(),
                HashMap::new(),
            ).unwrap();
            prop_assert_eq!(t.lookup(Gene::Cyp2d6, &a, &b), t.lookup(Gene::Cyp2d6, &b, &a));
            prop_assert_eq!(t.lookup(Gene::Cyp2d6, &b, &a), Some(Phenotype::Intermediate));
        }
    }
}
