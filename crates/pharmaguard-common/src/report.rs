//! Output records handed to presentation and storage collaborators.
//! Field names are the JSON contract; do not rename without versioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{FunctionalEffect, Gene, Phenotype, RiskLabel, Severity, Urgency};

/// Which matching strategy resolved a variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Annotation,
    Identifier,
    GeneRegion,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedVariant {
    pub rsid: String,
    pub gene: Gene,
    pub chromosome: String,
    pub position: u64,
    pub ref_allele: String,
    pub alt_allele: String,
    pub star_allele: String,
    /// Genotype as written in the file, e.g. "0/1" or "1|1".
    pub genotype: String,
    pub functional_effect: FunctionalEffect,
    pub quality: f64,
    pub matched_by: MatchSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub risk_label: RiskLabel,
    pub confidence_score: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PharmacogenomicProfile {
    pub primary_gene: Gene,
    /// "A/B", e.g. "*4/*6".
    pub diplotype: String,
    pub phenotype: Phenotype,
    pub detected_variants: Vec<DetectedVariant>,
    /// Set when the phenotype did not come from the curated table.
    #[serde(default)]
    pub requires_review: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalRecommendation {
    pub dosing_recommendation: String,
    #[serde(default)]
    pub alternative_drugs: Vec<String>,
    #[serde(default)]
    pub monitoring_parameters: Vec<String>,
    #[serde(default)]
    pub cpic_guideline_reference: String,
    #[serde(default)]
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub summary: String,
    pub mechanism: String,
    pub variant_specific_effects: Vec<String>,
    pub patient_friendly_summary: String,
    pub citations: Vec<String>,
    pub model_used: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityMetrics {
    pub vcf_parsing_success: bool,
    pub total_variants_parsed: usize,
    pub pharmacogenomic_variants_found: usize,
    pub gene_coverage: Vec<Gene>,
    pub malformed_lines: usize,
    pub analysis_timestamp: DateTime<Utc>,
    /// True only when the primary explanation collaborator answered.
    pub explanation_generated: bool,
}

/// One result per (patient, drug).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub patient_id: String,
    pub drug: String,
    pub timestamp: DateTime<Utc>,
    pub risk_assessment: RiskAssessment,
    pub pharmacogenomic_profile: PharmacogenomicProfile,
    pub clinical_recommendation: ClinicalRecommendation,
    pub explanation: Explanation,
    pub quality_metrics: QualityMetrics,
}

/// A requested drug that could not be analysed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugFailure {
    pub drug: String,
    pub error: String,
}

/// Outcome of a multi-drug request: partial success is the normal case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchReport {
    pub analysis_id: String,
    pub total_drugs_analyzed: usize,
    pub results: Vec<AnalysisResult>,
    #[serde(default)]
    pub failures: Vec<DrugFailure>,
}

impl BatchReport {
    pub fn result_for(&self, drug: &str) -> Option<&AnalysisResult> {
        self.results.iter().find(|r| r.drug == drug)
    }

    pub fn failure_for(&self, drug: &str) -> Option<&DrugFailure> {
        self.failures.iter().find(|f| f.drug == drug)
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() && !self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_variant() -> DetectedVariant {
        DetectedVariant {
            rsid: "rs3892097".to_string(),
            gene: Gene::Cyp2d6,
            chromosome: "chr22".to_string(),
            position: 42_524_947,
            ref_allele: "C".to_string(),
            alt_allele: "T".to_string(),
            star_allele: "*4".to_string(),
            genotype: "0/1".to_string(),
            functional_effect: FunctionalEffect::NoFunction,
            quality: 99.0,
            matched_by: MatchSource::Identifier,
        }
    }

    #[test]
    fn test_detected_variant_json_shape() {
        let json = serde_json::to_value(sample_variant()).unwrap();
        assert_eq!(json["gene"], "CYP2D6");
        assert_eq!(json["functional_effect"], "no_function");
        assert_eq!(json["matched_by"], "identifier");
        assert_eq!(json["position"], 42_524_947);
    }

    #[test]
    fn test_recommendation_defaults_when_fields_missing() {
        let rec: ClinicalRecommendation =
            serde_json::from_str(r#"{"dosing_recommendation": "Use label dose"}"#).unwrap();
        assert_eq!(rec.urgency, Urgency::Routine);
        assert!(rec.alternative_drugs.is_empty());
        assert_eq!(rec.cpic_guideline_reference, "");
    }

    #[test]
    fn test_batch_report_partial() {
        let report = BatchReport {
            analysis_id: "abcd1234".to_string(),
            total_drugs_analyzed: 0,
            results: vec![],
            failures: vec![DrugFailure { drug: "ASPIRIN".to_string(), error: "Unsupported drug: ASPIRIN".to_string() }],
        };
        assert!(!report.is_partial());
        assert_eq!(report.failure_for("ASPIRIN").map(|f| f.drug.as_str()), Some("ASPIRIN"));
        assert!(report.result_for("ASPIRIN").is_none());
    }
}
