//! Phenotype resolution per gene.
//!
//! The curated diplotype table is authoritative. For pairs it does not list,
//! configured activity-score bands may supply a phenotype; otherwise the call
//! is `Unknown`. Anything not read from the table is flagged for review.

use pharmaguard_common::report::DetectedVariant;
use pharmaguard_common::{Gene, Phenotype};
use pharmaguard_kb::KnowledgeBase;
use serde::Serialize;
use tracing::{debug, warn};

use crate::diplotype::{build_diplotype, Diplotype};
use crate::matcher::MatchedVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhenotypeBasis {
    /// Row in the curated table.
    Curated,
    /// No variants and no curated `*1/*1` row: reference pair assumed normal.
    Reference,
    /// Summed activity scores banded by configured thresholds.
    ActivityThreshold,
    /// Nothing applied.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhenotypeCall {
    pub phenotype: Phenotype,
    pub basis: PhenotypeBasis,
    /// Informational; never the deciding input for curated calls.
    pub activity_score: Option<f64>,
}

impl PhenotypeCall {
    pub fn requires_review(&self) -> bool {
        matches!(self.basis, PhenotypeBasis::ActivityThreshold | PhenotypeBasis::Unresolved)
    }
}

pub fn resolve_phenotype(kb: &KnowledgeBase, diplotype: &Diplotype) -> PhenotypeCall {
    let gene = diplotype.gene;
    let (a, b) = (diplotype.allele_a.as_str(), diplotype.allele_b.as_str());
    let table = kb.phenotype_table();
    let activity_score = table.diplotype_score(gene, a, b);

    if let Some(phenotype) = table.lookup(gene, a, b) {
        return PhenotypeCall { phenotype, basis: PhenotypeBasis::Curated, activity_score };
    }
    if diplotype.is_wildtype() {
        return PhenotypeCall { phenotype: Phenotype::Normal, basis: PhenotypeBasis::Reference, activity_score };
    }
    if let Some(phenotype) = table.threshold_phenotype(gene, a, b) {
        warn!("{} {} not in curated table; activity bands give {} (needs review)", gene, diplotype, phenotype);
        return PhenotypeCall { phenotype, basis: PhenotypeBasis::ActivityThreshold, activity_score };
    }
    warn!("{} {} not in curated table; phenotype left Unknown for review", gene, diplotype);
    PhenotypeCall { phenotype: Phenotype::Unknown, basis: PhenotypeBasis::Unresolved, activity_score }
}

/// Everything known about one gene for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneProfile {
    pub gene: Gene,
    pub diplotype: Diplotype,
    pub call: PhenotypeCall,
    /// Matched variants in this gene, file order.
    pub variants: Vec<DetectedVariant>,
}

pub fn resolve_gene(kb: &KnowledgeBase, gene: Gene, matched: &[MatchedVariant]) -> GeneProfile {
    let diplotype = build_diplotype(gene, matched);
    let call = resolve_phenotype(kb, &diplotype);
    let variants: Vec<DetectedVariant> = matched
        .iter()
        .filter(|m| m.gene() == gene)
        .map(|m| m.variant.clone())
        .collect();
    debug!(
        "{}: {} variant(s) → {} → {} ({:?})",
        gene,
        variants.len(),
        diplotype,
        call.phenotype,
        call.basis
    );
    GeneProfile { gene, diplotype, call, variants }
}
