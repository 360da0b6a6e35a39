//! Guideline table keyed by (drug, phenotype), plus the [`GuidelineSource`]
//! seam that lets a remote guideline service sit in front of the static table.

use std::collections::HashMap;
use std::sync::Arc;

use pharmaguard_common::{PharmaGuardError, Phenotype, Result, RiskLabel, Severity, Urgency};
use serde::{Deserialize, Serialize};

use crate::drugs::normalize_drug_name;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuidelineEntry {
    /// Canonical drug name
    pub drug: String,
    pub phenotype: Phenotype,
    pub risk_label: RiskLabel,
    pub severity: Severity,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub dosing_recommendation: String,
    #[serde(default)]
    pub alternative_drugs: Vec<String>,
    #[serde(default)]
    pub monitoring_parameters: Vec<String>,
    #[serde(default)]
    pub guideline_reference: String,
    #[serde(default)]
    pub urgency: Urgency,
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// Anything that can answer "what does the guideline say for this drug at
/// this phenotype". Drug names are canonical and uppercase.
pub trait GuidelineSource: Send + Sync {
    fn guideline(&self, drug: &str, phenotype: Phenotype) -> Option<GuidelineEntry>;

    /// Short label for logs.
    fn source_name(&self) -> &str;
}

impl<T: GuidelineSource + ?Sized> GuidelineSource for Arc<T> {
    fn guideline(&self, drug: &str, phenotype: Phenotype) -> Option<GuidelineEntry> {
        (**self).guideline(drug, phenotype)
    }

    fn source_name(&self) -> &str {
        (**self).source_name()
    }
}

// ── Static table ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct GuidelineTable {
    entries: HashMap<(String, Phenotype), GuidelineEntry>,
}

impl GuidelineTable {
    /// Fails on a repeated (drug, phenotype) key or a confidence outside [0, 1].
    pub fn from_entries(entries: Vec<GuidelineEntry>) -> Result<Self> {
        let mut table = Self::default();
        for mut entry in entries {
            entry.drug = normalize_drug_name(&entry.drug);
            if !(0.0..=1.0).contains(&entry.confidence) {
                return Err(PharmaGuardError::KnowledgeBase(format!(
                    "guideline {} {} has confidence {} outside [0, 1]",
                    entry.drug, entry.phenotype, entry.confidence
                )));
            }
            let key = (entry.drug.clone(), entry.phenotype);
            if table.entries.contains_key(&key) {
                return Err(PharmaGuardError::KnowledgeBase(format!(
                    "duplicate guideline for {} {}",
                    entry.drug, entry.phenotype
                )));
            }
            table.entries.insert(key, entry);
        }
        Ok(table)
    }

    pub fn get(&self, drug: &str, phenotype: Phenotype) -> Option<&GuidelineEntry> {
        self.entries.get(&(normalize_drug_name(drug), phenotype))
    }

    /// Phenotypes with a guideline row for `drug`.
    pub fn phenotypes_for(&self, drug: &str) -> Vec<Phenotype> {
        let drug = normalize_drug_name(drug);
        let mut out: Vec<Phenotype> = self
            .entries
            .keys()
            .filter(|(d, _)| *d == drug)
            .map(|(_, p)| *p)
            .collect();
        out.sort();
        out
    }

    pub fn drugs(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|(d, _)| d.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GuidelineSource for GuidelineTable {
    fn guideline(&self, drug: &str, phenotype: Phenotype) -> Option<GuidelineEntry> {
        self.get(drug, phenotype).cloned()
    }

    fn source_name(&self) -> &str {
        "static"
    }
}

// ── Layering ──────────────────────────────────────────────────────────────────

/// Consult `primary` first, then `fallback`. Used to put a live guideline
/// service in front of the bundled table.
pub struct LayeredGuidelines<P, F> {
    primary: P,
    fallback: F,
}

impl<P: GuidelineSource, F: GuidelineSource> LayeredGuidelines<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: GuidelineSource, F: GuidelineSource> GuidelineSource for LayeredGuidelines<P, F> {
    fn guideline(&self, drug: &str, phenotype: Phenotype) -> Option<GuidelineEntry> {
        if let Some(hit) = self.primary.guideline(drug, phenotype) {
            return Some(hit);
        }
        tracing::debug!(
            "{} had no guideline for {} {}, using {}",
            self.primary.source_name(),
            drug,
            phenotype,
            self.fallback.source_name()
        );
        self.fallback.guideline(drug, phenotype)
    }

    fn source_name(&self) -> &str {
        self.primary.source_name()
    }
}

// ── Mock Implementation for Testing ──────────────────────────────────────────

/// In-memory source with hand-set rows.
pub struct MockGuidelineSource {
    data: HashMap<(String, Phenotype), GuidelineEntry>,
}

impl MockGuidelineSource {
    pub fn new() -> Self {
        Self { data: HashMap::new() }
    }

    /// Add a row keyed by its own drug and phenotype.
    pub fn with(mut self, entry: GuidelineEntry) -> Self {
        self.data.insert((normalize_drug_name(&entry.drug), entry.phenotype), entry);
        self
    }
}

impl Default for MockGuidelineSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GuidelineSource for MockGuidelineSource {
    fn guideline(&self, drug: &str, phenotype: Phenotype) -> Option<GuidelineEntry> {
        self.data.get(&(normalize_drug_name(drug), phenotype)).cloned()
    }

    fn source_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(drug: &str, phenotype: Phenotype, label: RiskLabel) -> GuidelineEntry {
        GuidelineEntry {
            drug: drug.to_string(),
            phenotype,
            risk_label: label,
            severity: Severity::Moderate,
            confidence: 0.9,
            dosing_recommendation: format!("{drug} at {phenotype}"),
            alternative_drugs: vec![],
            monitoring_parameters: vec![],
            guideline_reference: String::new(),
            urgency: Urgency::Soon,
        }
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = GuidelineTable::from_entries(vec![
            entry("CODEINE", Phenotype::Poor, RiskLabel::Ineffective),
            entry("codeine", Phenotype::Poor, RiskLabel::Toxic),
        ]);
        assert!(matches!(err, Err(PharmaGuardError::KnowledgeBase(_))));
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let mut bad = entry("CODEINE", Phenotype::Poor, RiskLabel::Ineffective);
        bad.confidence = 1.2;
        assert!(GuidelineTable::from_entries(vec![bad]).is_err());
    }

    #[test]
    fn test_get_and_phenotypes_for() {
        let table = GuidelineTable::from_entries(vec![
            entry("CODEINE", Phenotype::Poor, RiskLabel::Ineffective),
            entry("CODEINE", Phenotype::Normal, RiskLabel::Safe),
        ])
        .unwrap();
        assert_eq!(table.get("codeine", Phenotype::Poor).unwrap().risk_label, RiskLabel::Ineffective);
        assert!(table.get("CODEINE", Phenotype::Rapid).is_none());
        assert_eq!(table.phenotypes_for("CODEINE"), vec![Phenotype::Poor, Phenotype::Normal]);
    }

    #[test]
    fn test_layered_prefers_primary() {
        let primary = MockGuidelineSource::new().with(entry("WARFARIN", Phenotype::Poor, RiskLabel::AdjustDosage));
        let fallback = GuidelineTable::from_entries(vec![
            entry("WARFARIN", Phenotype::Poor, RiskLabel::Toxic),
            entry("WARFARIN", Phenotype::Normal, RiskLabel::Safe),
        ])
        .unwrap();
        let layered = LayeredGuidelines::new(primary, fallback);
        assert_eq!(layered.guideline("WARFARIN", Phenotype::Poor).unwrap().risk_label, RiskLabel::AdjustDosage);
        assert_eq!(layered.guideline("WARFARIN", Phenotype::Normal).unwrap().risk_label, RiskLabel::Safe);
        assert!(layered.guideline("WARFARIN", Phenotype::Rapid).is_none());
        assert_eq!(layered.source_name(), "mock");
    }
}
