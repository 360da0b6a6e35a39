//! Batch analysis: one file, many drugs.
//!
//! Parsing and matching happen once per file and gene profiles once per gene;
//! only classification and explanation run per drug. Reference data is shared
//! read-only through `Arc`, so the per-drug stage fans out on rayon.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::BufRead;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pharmaguard_common::report::{
    AnalysisResult, BatchReport, DrugFailure, Explanation, PharmacogenomicProfile, QualityMetrics,
};
use pharmaguard_common::{Gene, PharmaGuardError, Result};
use pharmaguard_kb::{normalize_drug_name, DrugInfo, GuidelineSource, KnowledgeBase};
use pharmaguard_vcf::{ParseStats, VcfReader};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::classifier::{classify, resolve_drug, RiskCall};
use crate::explain::{explain_or_fallback, Explainer, ExplanationRequest, RuleBasedExplainer};
use crate::matcher::{match_record, MatchedVariant};
use crate::phenotype::{resolve_gene, GeneProfile};

/// Default upper bound on VCF size (5 MiB).
pub const DEFAULT_MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Classify drugs on the rayon pool.
    pub parallel_drugs: bool,
    pub max_file_bytes: usize,
    /// Ask the configured explainer; when false every result gets the
    /// rule-based text.
    pub explanations: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self { parallel_drugs: true, max_file_bytes: DEFAULT_MAX_FILE_BYTES, explanations: true }
    }
}

// ── Drug list ─────────────────────────────────────────────────────────────────

/// Split a comma-separated request into trimmed, uppercase, de-duplicated
/// names in first-seen order.
pub fn normalize_drug_list(csv: &str) -> Vec<String> {
    normalize_drug_names(csv.split(','))
}

pub fn normalize_drug_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|n| normalize_drug_name(n.as_ref()))
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

// ── Parsed sample ─────────────────────────────────────────────────────────────

/// A file after parsing and matching; drug-independent.
#[derive(Debug, Clone)]
pub struct ParsedSample {
    pub patient_id: String,
    pub sample_name: String,
    pub matched: Vec<MatchedVariant>,
    pub stats: ParseStats,
}

impl ParsedSample {
    /// Sorted genes with at least one matched variant.
    pub fn gene_coverage(&self) -> Vec<Gene> {
        self.matched
            .iter()
            .map(MatchedVariant::gene)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Per-drug outcome before explanation.
struct DrugAssessment {
    drug: DrugInfo,
    profile: GeneProfile,
    risk: RiskCall,
}

struct Prepared {
    analysis_id: String,
    timestamp: DateTime<Utc>,
    assessments: Vec<DrugAssessment>,
    failures: Vec<DrugFailure>,
}

// ── Analyzer ──────────────────────────────────────────────────────────────────

pub struct Analyzer {
    kb: Arc<KnowledgeBase>,
    guidelines: Arc<dyn GuidelineSource>,
    explainer: Arc<dyn Explainer>,
    options: AnalysisOptions,
}

impl Analyzer {
    /// Guidelines from the knowledge base, rule-based explanations.
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self {
            guidelines: kb.clone(),
            kb,
            explainer: Arc::new(RuleBasedExplainer),
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_guidelines(mut self, source: Arc<dyn GuidelineSource>) -> Self {
        self.guidelines = source;
        self
    }

    pub fn with_explainer(mut self, explainer: Arc<dyn Explainer>) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    // ── Parse + match ─────────────────────────────────────────────────────────

    /// Stream records from `reader` and keep only pharmacogenomic matches.
    pub fn parse<R: BufRead>(&self, reader: R) -> Result<ParsedSample> {
        let mut records = VcfReader::new(reader)?;
        let header = records.header().clone();
        let kb = self.kb.as_ref();
        let matched: Vec<MatchedVariant> =
            records.by_ref().filter_map(|record| match_record(&record, kb)).collect();
        let stats = records.finish();

        info!(
            "Parsed {}: {} records ({} reference-only, {} malformed), {} pharmacogenomic",
            header.patient_id,
            stats.total_records,
            stats.reference_only,
            stats.malformed_lines,
            matched.len()
        );

        Ok(ParsedSample {
            sample_name: header.sample_name().to_string(),
            patient_id: header.patient_id,
            matched,
            stats,
        })
    }

    /// Size-checked parse of in-memory text.
    pub fn parse_text(&self, text: &str) -> Result<ParsedSample> {
        if text.len() > self.options.max_file_bytes {
            return Err(PharmaGuardError::InputTooLarge {
                size: text.len(),
                limit: self.options.max_file_bytes,
            });
        }
        self.parse(text.as_bytes())
    }

    // ── Entry points ──────────────────────────────────────────────────────────

    /// Full analysis with the configured explainer.
    #[instrument(skip_all, fields(drugs = drugs.len()))]
    pub async fn analyze(&self, text: &str, drugs: &[String]) -> Result<BatchReport> {
        let sample = self.parse_text(text)?;
        self.analyze_sample(&sample, drugs).await
    }

    pub async fn analyze_sample(&self, sample: &ParsedSample, drugs: &[String]) -> Result<BatchReport> {
        if !self.options.explanations {
            return self.analyze_sample_sync(sample, drugs);
        }
        let prepared = self.prepare(sample, drugs)?;
        let requests: Vec<ExplanationRequest> = prepared.assessments.iter().map(explanation_request).collect();
        let explainer = self.explainer.as_ref();
        let explanations =
            futures_util::future::join_all(requests.iter().map(|req| explain_or_fallback(explainer, req))).await;
        Ok(self.assemble(sample, prepared, explanations))
    }

    /// Analysis without an async runtime; explanations are rule-based.
    pub fn analyze_sync(&self, text: &str, drugs: &[String]) -> Result<BatchReport> {
        let sample = self.parse_text(text)?;
        self.analyze_sample_sync(&sample, drugs)
    }

    pub fn analyze_sample_sync(&self, sample: &ParsedSample, drugs: &[String]) -> Result<BatchReport> {
        let prepared = self.prepare(sample, drugs)?;
        let explanations = prepared
            .assessments
            .iter()
            .map(|a| (RuleBasedExplainer::render(&explanation_request(a)), false))
            .collect();
        Ok(self.assemble(sample, prepared, explanations))
    }

    // ── Stages ────────────────────────────────────────────────────────────────

    fn prepare(&self, sample: &ParsedSample, drugs: &[String]) -> Result<Prepared> {
        let requested = normalize_drug_names(drugs);
        if requested.is_empty() {
            return Err(PharmaGuardError::EmptyDrugList);
        }

        // Resolve names; unsupported drugs fail individually.
        let mut resolved: Vec<&DrugInfo> = Vec::new();
        let mut failures = Vec::new();
        let mut seen_canonical = HashSet::new();
        for name in &requested {
            match resolve_drug(&self.kb, name) {
                Ok(info) if seen_canonical.insert(info.name.as_str()) => resolved.push(info),
                Ok(info) => debug!("{} already requested as {}", name, info.name),
                Err(e) => {
                    debug!("{}", e);
                    failures.push(DrugFailure { drug: name.clone(), error: e.to_string() });
                }
            }
        }

        // One profile per gene, shared by every drug on that gene.
        let profiles: BTreeMap<Gene, GeneProfile> = resolved
            .iter()
            .map(|d| d.gene)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|gene| (gene, resolve_gene(&self.kb, gene, &sample.matched)))
            .collect();

        let guidelines = self.guidelines.as_ref();
        let assess = |drug: &&DrugInfo| -> Option<DrugAssessment> {
            let profile = profiles.get(&drug.gene)?;
            Some(DrugAssessment {
                drug: (*drug).clone(),
                profile: profile.clone(),
                risk: classify(guidelines, drug, profile.call.phenotype),
            })
        };
        let assessments: Vec<DrugAssessment> = if self.options.parallel_drugs {
            resolved.par_iter().filter_map(assess).collect()
        } else {
            resolved.iter().filter_map(assess).collect()
        };

        let mut analysis_id = uuid::Uuid::new_v4().simple().to_string();
        analysis_id.truncate(8);

        Ok(Prepared { analysis_id, timestamp: Utc::now(), assessments, failures })
    }

    fn assemble(
        &self,
        sample: &ParsedSample,
        prepared: Prepared,
        explanations: Vec<(Explanation, bool)>,
    ) -> BatchReport {
        let Prepared { analysis_id, timestamp, assessments, failures } = prepared;
        let gene_coverage = sample.gene_coverage();

        let results: Vec<AnalysisResult> = assessments
            .into_iter()
            .zip(explanations)
            .map(|(a, (explanation, generated))| AnalysisResult {
                patient_id: sample.patient_id.clone(),
                drug: a.drug.name.clone(),
                timestamp,
                risk_assessment: a.risk.assessment,
                pharmacogenomic_profile: PharmacogenomicProfile {
                    primary_gene: a.profile.gene,
                    diplotype: a.profile.diplotype.to_string(),
                    phenotype: a.profile.call.phenotype,
                    requires_review: a.profile.call.requires_review(),
                    detected_variants: a.profile.variants,
                },
                clinical_recommendation: a.risk.recommendation,
                explanation,
                quality_metrics: QualityMetrics {
                    vcf_parsing_success: sample.stats.parsing_success(),
                    total_variants_parsed: sample.stats.total_records,
                    pharmacogenomic_variants_found: sample.matched.len(),
                    gene_coverage: gene_coverage.clone(),
                    malformed_lines: sample.stats.malformed_lines,
                    analysis_timestamp: timestamp,
                    explanation_generated: generated,
                },
            })
            .collect();

        info!(
            "Analysis {} for {}: {} drug(s) analysed, {} failed",
            analysis_id,
            sample.patient_id,
            results.len(),
            failures.len()
        );

        BatchReport { analysis_id, total_drugs_analyzed: results.len(), results, failures }
    }
}

fn explanation_request(a: &DrugAssessment) -> ExplanationRequest {
    ExplanationRequest {
        drug: a.drug.name.clone(),
        drug_class: a.drug.drug_class.clone(),
        pathway: a.drug.pathway.clone(),
        gene: a.profile.gene,
        diplotype: a.profile.diplotype.to_string(),
        phenotype: a.profile.call.phenotype,
        risk_label: a.risk.assessment.risk_label,
        severity: a.risk.assessment.severity,
        dosing_recommendation: a.risk.recommendation.dosing_recommendation.clone(),
        variants: a.profile.variants.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_drug_list() {
        assert_eq!(
            normalize_drug_list(" codeine, Warfarin ,,CODEINE, plavix "),
            vec!["CODEINE".to_string(), "WARFARIN".to_string(), "PLAVIX".to_string()]
        );
        assert!(normalize_drug_list(" , ").is_empty());
    }

    #[test]
    fn test_empty_drug_list_is_error() {
        let analyzer = Analyzer::new(Arc::new(KnowledgeBase::builtin().unwrap()));
        let text = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\n";
        let err = analyzer.analyze_sync(text, &[" ".to_string()]).err().unwrap();
        assert!(matches!(err, PharmaGuardError::EmptyDrugList));
    }

    #[test]
    fn test_size_limit() {
        let analyzer = Analyzer::new(Arc::new(KnowledgeBase::builtin().unwrap()))
            .with_options(AnalysisOptions { max_file_bytes: 10, ..AnalysisOptions::default() });
        let err = analyzer.parse_text("##fileformat=VCFv4.2\n").err().unwrap();
        assert!(matches!(err, PharmaGuardError::InputTooLarge { limit: 10, .. }));
    }

    #[test]
    fn test_alias_and_canonical_in_one_request_analysed_once() {
        let analyzer = Analyzer::new(Arc::new(KnowledgeBase::builtin().unwrap()));
        let text = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\n";
        let report = analyzer
            .analyze_sync(text, &["PLAVIX".to_string(), "clopidogrel".to_string()])
            .unwrap();
        assert_eq!(report.total_drugs_analyzed, 1);
        assert!(report.failures.is_empty());
        assert_eq!(report.analysis_id.len(), 8);
    }

    #[test]
    fn test_read_error_reports_partial_sample() {
        let analyzer = Analyzer::new(Arc::new(KnowledgeBase::builtin().unwrap()));
        let mut bytes = b"##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
            22\t42128945\trs3892097\tC\tT\t.\tPASS\t.\tGT\t0/1\n"
            .to_vec();
        bytes.extend_from_slice(b"22\t42130692\trs5030655\t\xff\xfe\n");

        let sample = analyzer.parse(bytes.as_slice()).unwrap();
        assert!(sample.stats.read_error.is_some());
        assert_eq!(sample.matched.len(), 1);

        let report = analyzer.analyze_sample_sync(&sample, &["CODEINE".to_string()]).unwrap();
        let r = &report.results[0];
        assert!(!r.quality_metrics.vcf_parsing_success);
        assert_eq!(r.pharmacogenomic_profile.diplotype, "*1/*4");
        assert_eq!(r.pharmacogenomic_profile.detected_variants[0].rsid, "rs3892097");
    }
}
