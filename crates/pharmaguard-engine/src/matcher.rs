//! Variant matching.
//!
//! Each strategy is a pure function from a record to an optional match.
//! [`STRATEGIES`] lists them in priority order and [`match_record`] takes the
//! first hit:
//!
//! 1. `annotation` : INFO carries both GENE and STAR
//! 2. `identifier` : ID column or INFO RS found in the catalog
//! 3. `gene_region`: INFO carries GENE only; star allele unknown

use pharmaguard_common::report::{DetectedVariant, MatchSource};
use pharmaguard_common::{FunctionalEffect, Gene};
use pharmaguard_kb::{KnownVariant, KnowledgeBase};
use pharmaguard_vcf::VariantRecord;

/// Star label used for gene-region matches.
pub const UNKNOWN_STAR: &str = "unknown";

pub type MatchStrategy = fn(&VariantRecord, &KnowledgeBase) -> Option<MatchedVariant>;

pub const STRATEGIES: &[(&str, MatchStrategy)] = &[
    ("annotation", match_annotation),
    ("identifier", match_identifier),
    ("gene_region", match_gene_region),
];

/// A record resolved to a pharmacogene.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedVariant {
    pub variant: DetectedVariant,
    /// Variant allele copies implied by the genotype (1 or 2).
    pub copies: u8,
}

impl MatchedVariant {
    pub fn gene(&self) -> Gene {
        self.variant.gene
    }

    pub fn star(&self) -> &str {
        &self.variant.star_allele
    }

    pub fn effect(&self) -> FunctionalEffect {
        self.variant.functional_effect
    }

    /// False for gene-region matches, which carry no star allele.
    pub fn has_named_allele(&self) -> bool {
        self.variant.star_allele != UNKNOWN_STAR
    }
}

/// First-success combinator over [`STRATEGIES`].
pub fn match_record(record: &VariantRecord, kb: &KnowledgeBase) -> Option<MatchedVariant> {
    match_with(STRATEGIES, record, kb)
}

pub fn match_with(
    strategies: &[(&str, MatchStrategy)],
    record: &VariantRecord,
    kb: &KnowledgeBase,
) -> Option<MatchedVariant> {
    let hit = strategies.iter().find_map(|(_, strategy)| strategy(record, kb));
    if hit.is_none() {
        tracing::trace!("line {}: no pharmacogenomic match", record.line_no);
    }
    hit
}

// ── Strategies ────────────────────────────────────────────────────────────────

/// Pipeline-provided GENE + STAR tags. Effect comes from the catalog entry for
/// that allele when there is one.
pub fn match_annotation(record: &VariantRecord, kb: &KnowledgeBase) -> Option<MatchedVariant> {
    let gene = annotated_gene(record)?;
    let star = record.info("STAR").map(str::trim).filter(|s| *s != ".")?;
    let effect = kb.catalog_effect(gene, star).unwrap_or_default();
    let rsid = reported_rsid(record);
    Some(build(record, rsid, gene, star, effect, MatchSource::Annotation))
}

/// Exact rsID lookup against the catalog.
pub fn match_identifier(record: &VariantRecord, kb: &KnowledgeBase) -> Option<MatchedVariant> {
    let known: &KnownVariant = candidate_ids(record).find_map(|id| kb.variant_by_rsid(&id))?;
    Some(build(
        record,
        known.rsid.clone(),
        known.gene,
        &known.star,
        known.effect,
        MatchSource::Identifier,
    ))
}

/// Gene known, allele not: keeps gene coverage visible.
pub fn match_gene_region(record: &VariantRecord, _kb: &KnowledgeBase) -> Option<MatchedVariant> {
    let gene = annotated_gene(record)?;
    Some(build(
        record,
        reported_rsid(record),
        gene,
        UNKNOWN_STAR,
        FunctionalEffect::Unknown,
        MatchSource::GeneRegion,
    ))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn annotated_gene(record: &VariantRecord) -> Option<Gene> {
    record.info("GENE")?.parse().ok()
}

/// ID column entries, then INFO RS (bare numbers get the `rs` prefix).
fn candidate_ids(record: &VariantRecord) -> impl Iterator<Item = String> + '_ {
    let info_rs = record.info("RS").map(|rs| {
        let rs = rs.trim();
        if rs.chars().all(|c| c.is_ascii_digit()) {
            format!("rs{rs}")
        } else {
            rs.to_string()
        }
    });
    record.ids.iter().cloned().chain(info_rs)
}

fn reported_rsid(record: &VariantRecord) -> String {
    candidate_ids(record)
        .find(|id| id.to_ascii_lowercase().starts_with("rs"))
        .unwrap_or_else(|| record.primary_id().to_string())
}

fn build(
    record: &VariantRecord,
    rsid: String,
    gene: Gene,
    star: &str,
    effect: FunctionalEffect,
    source: MatchSource,
) -> MatchedVariant {
    MatchedVariant {
        variant: DetectedVariant {
            rsid,
            gene,
            chromosome: record.chromosome.clone(),
            position: record.position,
            ref_allele: record.ref_allele.clone(),
            alt_allele: record.alt_display(),
            star_allele: star.to_string(),
            genotype: record.genotype_display().to_string(),
            functional_effect: effect,
            quality: record.quality,
            matched_by: source,
        },
        copies: record.allele_copies().max(1),
    }
}
