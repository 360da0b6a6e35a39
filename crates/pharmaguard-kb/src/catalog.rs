//! Known-variant catalog keyed by dbSNP rsID.

use std::collections::HashMap;

use pharmaguard_common::{FunctionalEffect, Gene, PharmaGuardError, Result};
use serde::{Deserialize, Serialize};

/// A curated catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnownVariant {
    /// dbSNP identifier, e.g. "rs3892097"
    pub rsid: String,
    pub gene: Gene,
    /// Star-allele label, e.g. "*4"
    pub star: String,
    pub effect: FunctionalEffect,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default)]
pub struct VariantCatalog {
    by_rsid: HashMap<String, KnownVariant>,
    by_allele: HashMap<(Gene, String), FunctionalEffect>,
}

impl VariantCatalog {
    /// Fails if an rsID appears twice.
    pub fn from_entries(entries: Vec<KnownVariant>) -> Result<Self> {
        let mut catalog = Self::default();
        for entry in entries {
            let key = entry.rsid.trim().to_ascii_lowercase();
            if catalog.by_rsid.contains_key(&key) {
                return Err(PharmaGuardError::KnowledgeBase(format!(
                    "duplicate rsID in variant catalog: {}",
                    entry.rsid
                )));
            }
            catalog
                .by_allele
                .entry((entry.gene, entry.star.clone()))
                .or_insert(entry.effect);
            catalog.by_rsid.insert(key, entry);
        }
        Ok(catalog)
    }

    /// Exact identifier lookup; the `rs` prefix is case-insensitive.
    pub fn lookup(&self, rsid: &str) -> Option<&KnownVariant> {
        self.by_rsid.get(&rsid.trim().to_ascii_lowercase())
    }

    /// Functional effect of a named star allele, if the catalog knows it.
    pub fn effect_of(&self, gene: Gene, star: &str) -> Option<FunctionalEffect> {
        self.by_allele.get(&(gene, star.trim().to_string())).copied()
    }

    pub fn variants_for(&self, gene: Gene) -> impl Iterator<Item = &KnownVariant> {
        self.by_rsid.values().filter(move |v| v.gene == gene)
    }

    pub fn len(&self) -> usize {
        self.by_rsid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_rsid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rsid: &str, gene: Gene, star: &str, effect: FunctionalEffect) -> KnownVariant {
        KnownVariant { rsid: rsid.to_string(), gene, star: star.to_string(), effect, description: String::new() }
    }

    #[test]
    fn test_lookup_is_exact_but_case_insensitive_on_prefix() {
        let catalog = VariantCatalog::from_entries(vec![
            entry("rs3892097", Gene::Cyp2d6, "*4", FunctionalEffect::NoFunction),
        ])
        .unwrap();
        assert_eq!(catalog.lookup("rs3892097").unwrap().star, "*4");
        assert!(catalog.lookup("RS3892097").is_some());
        assert!(catalog.lookup("rs389209").is_none());
    }

    #[test]
    fn test_effect_of_star_allele() {
        let catalog = VariantCatalog::from_entries(vec![
            entry("rs4244285", Gene::Cyp2c19, "*2", FunctionalEffect::NoFunction),
            entry("rs12248560", Gene::Cyp2c19, "*17", FunctionalEffect::IncreasedFunction),
        ])
        .unwrap();
        assert_eq!(catalog.effect_of(Gene::Cyp2c19, "*17"), Some(FunctionalEffect::IncreasedFunction));
        assert_eq!(catalog.effect_of(Gene::Cyp2d6, "*17"), None);
        assert_eq!(catalog.variants_for(Gene::Cyp2c19).count(), 2);
    }

    #[test]
    fn test_duplicate_rsid_rejected() {
        let err = VariantCatalog::from_entries(vec![
            entry("rs1", Gene::Tpmt, "*2", FunctionalEffect::NoFunction),
            entry("RS1", Gene::Tpmt, "*3B", FunctionalEffect::NoFunction),
        ]);
        assert!(matches!(err, Err(PharmaGuardError::KnowledgeBase(_))));
    }
}
