//! Drug risk classification against the guideline table.

use pharmaguard_common::report::{ClinicalRecommendation, RiskAssessment};
use pharmaguard_common::{PharmaGuardError, Phenotype, Result, RiskLabel, Severity, Urgency};
use pharmaguard_kb::{DrugInfo, GuidelineEntry, GuidelineSource, KnowledgeBase};
use tracing::warn;

/// Risk assessment and recommendation for one (drug, phenotype).
#[derive(Debug, Clone, PartialEq)]
pub struct RiskCall {
    pub assessment: RiskAssessment,
    pub recommendation: ClinicalRecommendation,
    /// False when no guideline row existed and the call degraded to Unknown.
    pub guideline_found: bool,
}

impl From<GuidelineEntry> for RiskCall {
    fn from(entry: GuidelineEntry) -> Self {
        Self {
            assessment: RiskAssessment {
                risk_label: entry.risk_label,
                confidence_score: entry.confidence,
                severity: entry.severity,
            },
            recommendation: ClinicalRecommendation {
                dosing_recommendation: entry.dosing_recommendation,
                alternative_drugs: entry.alternative_drugs,
                monitoring_parameters: entry.monitoring_parameters,
                cpic_guideline_reference: entry.guideline_reference,
                urgency: entry.urgency,
            },
            guideline_found: true,
        }
    }
}

impl RiskCall {
    fn no_guideline(drug: &str, phenotype: Phenotype) -> Self {
        Self {
            assessment: RiskAssessment {
                risk_label: RiskLabel::Unknown,
                confidence_score: 0.0,
                severity: Severity::None,
            },
            recommendation: ClinicalRecommendation {
                dosing_recommendation: format!(
                    "No pharmacogenomic guideline is available for {drug} with phenotype {phenotype}. \
                     Consult a clinical pharmacogenomics specialist before prescribing."
                ),
                alternative_drugs: Vec::new(),
                monitoring_parameters: Vec::new(),
                cpic_guideline_reference: String::new(),
                urgency: Urgency::Routine,
            },
            guideline_found: false,
        }
    }
}

/// Canonical drug record for a requested name, or `UnsupportedDrug`.
pub fn resolve_drug<'kb>(kb: &'kb KnowledgeBase, name: &str) -> Result<&'kb DrugInfo> {
    kb.resolve_drug(name)
        .ok_or_else(|| PharmaGuardError::UnsupportedDrug(name.trim().to_uppercase()))
}

/// Guideline row verbatim on a hit; `Unknown` / `none` with a specialist
/// referral on a miss.
pub fn classify(guidelines: &dyn GuidelineSource, drug: &DrugInfo, phenotype: Phenotype) -> RiskCall {
    match guidelines.guideline(&drug.name, phenotype) {
        Some(entry) => entry.into(),
        None => {
            warn!(
                "No guideline for {} at phenotype {} ({} source)",
                drug.name,
                phenotype,
                guidelines.source_name()
            );
            RiskCall::no_guideline(&drug.name, phenotype)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmaguard_kb::MockGuidelineSource;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::builtin().unwrap()
    }

    #[test]
    fn test_guideline_hit_is_verbatim() {
        let kb = kb();
        let codeine = resolve_drug(&kb, "codeine").unwrap();
        for phenotype in Phenotype::CLASSIFIED {
            let row = kb.guidelines().get("CODEINE", phenotype).unwrap();
            let call = classify(&kb, codeine, phenotype);
            assert!(call.guideline_found);
            assert_eq!(call.assessment.risk_label, row.risk_label);
            assert_eq!(call.assessment.severity, row.severity);
            assert_eq!(call.assessment.confidence_score, row.confidence);
            assert_eq!(call.recommendation.urgency, row.urgency);
            assert_eq!(call.recommendation.dosing_recommendation, row.dosing_recommendation);
        }
    }

    #[test]
    fn test_unknown_phenotype_degrades() {
        let kb = kb();
        let warfarin = resolve_drug(&kb, "WARFARIN").unwrap();
        let call = classify(&kb, warfarin, Phenotype::Unknown);
        assert!(!call.guideline_found);
        assert_eq!(call.assessment.risk_label, RiskLabel::Unknown);
        assert_eq!(call.assessment.severity, Severity::None);
        assert!(call.recommendation.dosing_recommendation.contains("specialist"));
    }

    #[test]
    fn test_unsupported_drug() {
        let kb = kb();
        match resolve_drug(&kb, " aspirin ") {
            Err(PharmaGuardError::UnsupportedDrug(name)) => assert_eq!(name, "ASPIRIN"),
            other => panic!("expected UnsupportedDrug, got {other:?}"),
        }
    }

    #[test]
    fn test_alternate_source() {
        let kb = kb();
        let codeine = resolve_drug(&kb, "CODEINE").unwrap();
        let empty = MockGuidelineSource::new();
        let call = classify(&empty, codeine, Phenotype::Poor);
        assert_eq!(call.assessment.risk_label, RiskLabel::Unknown);
    }
}
