//! The assembled reference data store.
//!
//! Five YAML documents make up a knowledge base:
//!
//! | File | Top-level key |
//! |------|---------------|
//! | `catalog.yaml` | `known_variants` |
//! | `drugs.yaml` | `drugs` |
//! | `activity_scores.yaml` | `activity_scores` |
//! | `phenotypes.yaml` | `diplotypes`, `activity_thresholds` |
//! | `guidelines.yaml` | `guidelines` |

use std::collections::HashMap;
use std::path::Path;

use pharmaguard_common::{FunctionalEffect, Gene, PharmaGuardError, Phenotype, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::catalog::{KnownVariant, VariantCatalog};
use crate::drugs::{DrugInfo, DrugTable};
use crate::guidelines::{GuidelineEntry, GuidelineSource, GuidelineTable};
use crate::phenotypes::{DiplotypeRow, PhenotypeTable, ThresholdBand};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.yaml");
const BUILTIN_DRUGS: &str = include_str!("../data/drugs.yaml");
const BUILTIN_SCORES: &str = include_str!("../data/activity_scores.yaml");
const BUILTIN_PHENOTYPES: &str = include_str!("../data/phenotypes.yaml");
const BUILTIN_GUIDELINES: &str = include_str!("../data/guidelines.yaml");

// ── YAML documents ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CatalogDoc {
    known_variants: Vec<KnownVariant>,
}

#[derive(Deserialize)]
struct DrugsDoc {
    drugs: Vec<DrugInfo>,
}

#[derive(Deserialize)]
struct ScoresDoc {
    activity_scores: HashMap<Gene, HashMap<String, f64>>,
}

#[derive(Deserialize)]
struct PhenotypesDoc {
    diplotypes: Vec<DiplotypeRow>,
    #[serde(default)]
    activity_thresholds: HashMap<Gene, Vec<ThresholdBand>>,
}

#[derive(Deserialize)]
struct GuidelinesDoc {
    guidelines: Vec<GuidelineEntry>,
}

/// Raw YAML text of the five tables.
pub struct TableSources<'a> {
    pub catalog: &'a str,
    pub drugs: &'a str,
    pub activity_scores: &'a str,
    pub phenotypes: &'a str,
    pub guidelines: &'a str,
}

// ── KnowledgeBase ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct KnowledgeBase {
    catalog: VariantCatalog,
    drugs: DrugTable,
    phenotypes: PhenotypeTable,
    guidelines: GuidelineTable,
}

impl KnowledgeBase {
    // ── Constructors ──────────────────────────────────────────────────────────

    /// Tables compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_sources(TableSources {
            catalog: BUILTIN_CATALOG,
            drugs: BUILTIN_DRUGS,
            activity_scores: BUILTIN_SCORES,
            phenotypes: BUILTIN_PHENOTYPES,
            guidelines: BUILTIN_GUIDELINES,
        })
    }

    /// Load the five YAML files from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| -> Result<String> {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|e| {
                PharmaGuardError::KnowledgeBase(format!("cannot read {}: {e}", path.display()))
            })
        };
        let catalog = read("catalog.yaml")?;
        let drugs = read("drugs.yaml")?;
        let activity_scores = read("activity_scores.yaml")?;
        let phenotypes = read("phenotypes.yaml")?;
        let guidelines = read("guidelines.yaml")?;

        info!("Loading knowledge base from {}", dir.display());
        Self::from_sources(TableSources {
            catalog: &catalog,
            drugs: &drugs,
            activity_scores: &activity_scores,
            phenotypes: &phenotypes,
            guidelines: &guidelines,
        })
    }

    pub fn from_sources(src: TableSources<'_>) -> Result<Self> {
        let catalog_doc: CatalogDoc = serde_yaml::from_str(src.catalog)?;
        let drugs_doc: DrugsDoc = serde_yaml::from_str(src.drugs)?;
        let scores_doc: ScoresDoc = serde_yaml::from_str(src.activity_scores)?;
        let pheno_doc: PhenotypesDoc = serde_yaml::from_str(src.phenotypes)?;
        let guide_doc: GuidelinesDoc = serde_yaml::from_str(src.guidelines)?;

        let kb = Self {
            catalog: VariantCatalog::from_entries(catalog_doc.known_variants)?,
            drugs: DrugTable::from_entries(drugs_doc.drugs)?,
            phenotypes: PhenotypeTable::new(
                pheno_doc.diplotypes,
                scores_doc.activity_scores,
                pheno_doc.activity_thresholds,
            )?,
            guidelines: GuidelineTable::from_entries(guide_doc.guidelines)?,
        };
        kb.validate()?;

        info!(
            "Knowledge base loaded: {} variants, {} drugs ({} aliases), {} curated diplotypes, {} guidelines",
            kb.catalog.len(),
            kb.drugs.len(),
            kb.drugs.alias_count(),
            kb.phenotypes.curated_len(),
            kb.guidelines.len(),
        );
        Ok(kb)
    }

    /// Cross-table checks. A guideline for an unregistered drug is an error;
    /// a drug missing one of the five phenotype rows only warns, since the
    /// classifier degrades to Unknown for it.
    fn validate(&self) -> Result<()> {
        if let Some(orphan) = self.guidelines.drugs().find(|d| self.drugs.resolve(d).is_none()) {
            return Err(PharmaGuardError::KnowledgeBase(format!(
                "guideline references unregistered drug {orphan}"
            )));
        }
        for drug in self.drugs.iter() {
            let covered = self.guidelines.phenotypes_for(&drug.name);
            let missing: Vec<String> = Phenotype::CLASSIFIED
                .iter()
                .filter(|p| !covered.contains(p))
                .map(|p| p.to_string())
                .collect();
            if !missing.is_empty() {
                warn!("{} has no guideline for phenotype(s): {}", drug.name, missing.join(", "));
            }
        }
        Ok(())
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    pub fn variant_by_rsid(&self, rsid: &str) -> Option<&KnownVariant> {
        self.catalog.lookup(rsid)
    }

    pub fn catalog_effect(&self, gene: Gene, star: &str) -> Option<FunctionalEffect> {
        self.catalog.effect_of(gene, star)
    }

    pub fn drug(&self, name: &str) -> Option<&DrugInfo> {
        self.drugs.get(name)
    }

    /// Canonical or alias name → drug record. Case-insensitive.
    pub fn resolve_drug(&self, name: &str) -> Option<&DrugInfo> {
        self.drugs.resolve(name)
    }

    pub fn canonical_drug_name(&self, name: &str) -> Option<&str> {
        self.drugs.canonical_name(name)
    }

    pub fn supported_drugs(&self) -> impl Iterator<Item = &DrugInfo> {
        self.drugs.iter()
    }

    pub fn activity_score(&self, gene: Gene, star: &str) -> Option<f64> {
        self.phenotypes.activity_score(gene, star)
    }

    /// Curated, order-insensitive diplotype lookup.
    pub fn phenotype_for(&self, gene: Gene, a: &str, b: &str) -> Option<Phenotype> {
        self.phenotypes.lookup(gene, a, b)
    }

    pub fn phenotype_table(&self) -> &PhenotypeTable {
        &self.phenotypes
    }

    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    pub fn guidelines(&self) -> &GuidelineTable {
        &self.guidelines
    }
}

impl GuidelineSource for KnowledgeBase {
    fn guideline(&self, drug: &str, phenotype: Phenotype) -> Option<GuidelineEntry> {
        self.guidelines.get(drug, phenotype).cloned()
    }

    fn source_name(&self) -> &str {
        "builtin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmaguard_common::RiskLabel;

    #[test]
    fn test_builtin_loads() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert_eq!(kb.supported_drugs().count(), 6);
        assert_eq!(kb.variant_by_rsid("rs3892097").unwrap().star, "*4");
        assert_eq!(kb.guidelines().len(), 30);
        assert!(kb.drug("plavix").is_none());
        assert_eq!(kb.drug("clopidogrel").unwrap().name, "CLOPIDOGREL");
    }

    #[test]
    fn test_every_drug_has_five_phenotype_rows() {
        let kb = KnowledgeBase::builtin().unwrap();
        for drug in kb.supported_drugs() {
            assert_eq!(kb.guidelines().phenotypes_for(&drug.name).len(), 5, "{}", drug.name);
        }
    }

    #[test]
    fn test_orphan_guideline_rejected() {
        let err = KnowledgeBase::from_sources(TableSources {
            catalog: "known_variants: []",
            drugs: "drugs: []",
            activity_scores: "activity_scores: {}",
            phenotypes: "diplotypes: []",
            guidelines: "guidelines:\n  - { drug: ASPIRIN, phenotype: NM, risk_label: Safe, severity: none, confidence: 0.5, dosing_recommendation: x }\n",
        });
        assert!(matches!(err, Err(PharmaGuardError::KnowledgeBase(_))));
    }

    #[test]
    fn test_bad_yaml_is_yaml_error() {
        let err = KnowledgeBase::from_sources(TableSources {
            catalog: "known_variants: [",
            drugs: "drugs: []",
            activity_scores: "activity_scores: {}",
            phenotypes: "diplotypes: []",
            guidelines: "guidelines: []",
        });
        assert!(matches!(err, Err(PharmaGuardError::Yaml(_))));
    }

    #[test]
    fn test_guideline_source_impl() {
        let kb = KnowledgeBase::builtin().unwrap();
        let g = kb.guideline("CLOPIDOGREL", Phenotype::Poor).unwrap();
        assert_eq!(g.risk_label, RiskLabel::Ineffective);
    }
}
