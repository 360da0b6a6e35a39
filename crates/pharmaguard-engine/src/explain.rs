//! Explanation collaborator seam.
//!
//! A text-generation service implements [`Explainer`]. When it is absent or
//! fails, [`RuleBasedExplainer`] produces a deterministic explanation from the
//! same inputs, so every result carries one.

use async_trait::async_trait;
use pharmaguard_common::report::{DetectedVariant, Explanation};
use pharmaguard_common::{Gene, Phenotype, RiskLabel, Severity};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const RULE_BASED_MODEL: &str = "fallback-rule-based";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("Explainer unavailable: {0}")]
    Unavailable(String),
    #[error("Explainer returned an unusable response: {0}")]
    InvalidResponse(String),
    #[error("Explainer timed out")]
    Timeout,
}

// ── Request ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub drug: String,
    pub drug_class: String,
    pub pathway: String,
    pub gene: Gene,
    pub diplotype: String,
    pub phenotype: Phenotype,
    pub risk_label: RiskLabel,
    pub severity: Severity,
    pub dosing_recommendation: String,
    pub variants: Vec<DetectedVariant>,
}

impl ExplanationRequest {
    /// Prompt text for a text-generation backend. The expected reply is a JSON
    /// object with the fields of [`Explanation`] minus `model_used`.
    pub fn prompt(&self) -> String {
        let variant_lines = if self.variants.is_empty() {
            "  - No specific variants detected (wildtype assumed)\n".to_string()
        } else {
            self.variants
                .iter()
                .map(|v| format!("  - {}: {} {} (effect: {})\n", v.rsid, v.gene, v.star_allele, v.functional_effect))
                .collect()
        };
        format!(
            "You are a clinical pharmacogenomics expert. Explain the following result.\n\n\
             PATIENT DATA:\n\
             - Drug: {} ({})\n\
             - Primary Gene: {}\n\
             - Diplotype: {}\n\
             - Phenotype: {}\n\
             - Risk Assessment: {} (Severity: {})\n\
             - Metabolic Pathway: {}\n\
             - Current Dosing Recommendation: {}\n\n\
             DETECTED VARIANTS:\n{}\n\
             Respond ONLY with a JSON object with the fields summary, mechanism, \
             variant_specific_effects (array), patient_friendly_summary and citations (array).",
            self.drug,
            self.drug_class,
            self.gene,
            self.diplotype,
            self.phenotype,
            self.risk_label,
            self.severity,
            self.pathway,
            self.dosing_recommendation,
            variant_lines,
        )
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, req: &ExplanationRequest) -> Result<Explanation, ExplainError>;
    fn model_id(&self) -> &str;
}

// ── Rule-based fallback ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedExplainer;

impl RuleBasedExplainer {
    pub fn render(req: &ExplanationRequest) -> Explanation {
        let (gene, drug, phenotype) = (req.gene, req.drug.as_str(), req.phenotype);

        let mechanism = if req.pathway.is_empty() {
            format!(
                "{gene} is involved in the metabolism of {drug}. The {} diplotype results in {phenotype} \
                 metabolizer status, which affects how the body processes this medication.",
                req.diplotype
            )
        } else {
            req.pathway.clone()
        };

        let variant_specific_effects = if req.variants.is_empty() {
            vec![format!("No pharmacogenomic variants detected in {gene}; wildtype (*1/*1) assumed")]
        } else {
            req.variants
                .iter()
                .map(|v| format!("{} ({}): {} allele", v.rsid, v.star_allele, v.functional_effect))
                .collect()
        };

        let slow = matches!(phenotype, Phenotype::Poor | Phenotype::Intermediate);
        let fast = matches!(phenotype, Phenotype::Rapid | Phenotype::UltraRapid);
        let ability = if slow { "may have difficulty processing" } else { "processes" };
        let pace = if slow {
            "slower than normal"
        } else if fast {
            "faster than normal"
        } else {
            "normally"
        };
        let advice = if req.risk_label == RiskLabel::Safe {
            "Standard dosing should work well for you."
        } else {
            "Your doctor may need to adjust your dose or consider an alternative medication."
        };

        Explanation {
            summary: format!(
                "Patient carries {gene} {} diplotype, classified as {phenotype} metabolizer. \
                 For {drug}, this results in a risk assessment of '{}' with {} severity.",
                req.diplotype, req.risk_label, req.severity
            ),
            mechanism,
            variant_specific_effects,
            patient_friendly_summary: format!(
                "Your genetic test shows that your body {ability} the medication {drug} {pace}. {advice}"
            ),
            citations: vec![
                format!("CPIC Guideline for {gene} and {drug} Therapy"),
                format!("PharmGKB: {gene}-{drug} drug-gene interaction"),
            ],
            model_used: RULE_BASED_MODEL.to_string(),
        }
    }
}

#[async_trait]
impl Explainer for RuleBasedExplainer {
    async fn explain(&self, req: &ExplanationRequest) -> Result<Explanation, ExplainError> {
        Ok(Self::render(req))
    }

    fn model_id(&self) -> &str {
        RULE_BASED_MODEL
    }
}

/// Ask `primary`; on failure fall back to the rule-based text. The flag is
/// true only when a non-fallback explainer answered.
pub async fn explain_or_fallback(primary: &dyn Explainer, req: &ExplanationRequest) -> (Explanation, bool) {
    match primary.explain(req).await {
        Ok(explanation) => {
            let generated = primary.model_id() != RULE_BASED_MODEL;
            (explanation, generated)
        }
        Err(e) => {
            warn!("Explainer {} failed for {}: {}; using rule-based text", primary.model_id(), req.drug, e);
            (RuleBasedExplainer::render(req), false)
        }
    }
}
