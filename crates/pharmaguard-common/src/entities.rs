/// Strongly-typed vocabulary shared by the reader, knowledge base and engine.
/// Every table in the knowledge base is keyed by these enums rather than by
/// free-form strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Gene
// ---------------------------------------------------------------------------

/// Pharmacogenes covered by the knowledge base.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gene {
    Cyp2d6,
    Cyp2c19,
    Cyp2c9,
    Slco1b1,
    Tpmt,
    Dpyd,
}

impl Gene {
    pub const ALL: [Gene; 6] = [
        Gene::Cyp2d6,
        Gene::Cyp2c19,
        Gene::Cyp2c9,
        Gene::Slco1b1,
        Gene::Tpmt,
        Gene::Dpyd,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Gene::Cyp2d6  => "CYP2D6",
            Gene::Cyp2c19 => "CYP2C19",
            Gene::Cyp2c9  => "CYP2C9",
            Gene::Slco1b1 => "SLCO1B1",
            Gene::Tpmt    => "TPMT",
            Gene::Dpyd    => "DPYD",
        }
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Gene {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Gene::ALL
            .into_iter()
            .find(|g| g.symbol().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown gene symbol: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Metabolizer phenotype
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phenotype {
    #[serde(rename = "PM")]
    Poor,
    #[serde(rename = "IM")]
    Intermediate,
    #[serde(rename = "NM")]
    Normal,
    #[serde(rename = "RM")]
    Rapid,
    #[serde(rename = "URM")]
    UltraRapid,
    Unknown,
}

impl Phenotype {
    /// The five phenotypes every drug is expected to carry a guideline for.
    pub const CLASSIFIED: [Phenotype; 5] = [
        Phenotype::UltraRapid,
        Phenotype::Rapid,
        Phenotype::Normal,
        Phenotype::Intermediate,
        Phenotype::Poor,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Phenotype::Poor         => "PM",
            Phenotype::Intermediate => "IM",
            Phenotype::Normal       => "NM",
            Phenotype::Rapid        => "RM",
            Phenotype::UltraRapid   => "URM",
            Phenotype::Unknown      => "Unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Phenotype::Poor         => "Poor Metabolizer",
            Phenotype::Intermediate => "Intermediate Metabolizer",
            Phenotype::Normal       => "Normal Metabolizer",
            Phenotype::Rapid        => "Rapid Metabolizer",
            Phenotype::UltraRapid   => "Ultra-rapid Metabolizer",
            Phenotype::Unknown      => "Unknown",
        }
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Phenotype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PM"      => Ok(Phenotype::Poor),
            "IM"      => Ok(Phenotype::Intermediate),
            "NM"      => Ok(Phenotype::Normal),
            "RM"      => Ok(Phenotype::Rapid),
            "URM"     => Ok(Phenotype::UltraRapid),
            "UNKNOWN" => Ok(Phenotype::Unknown),
            other     => Err(format!("unknown phenotype: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Functional effect of a star allele
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum FunctionalEffect {
    Normal,
    IncreasedFunction,
    DecreasedFunction,
    NoFunction,
    #[default]
    Unknown,
}

impl FunctionalEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionalEffect::Normal            => "normal",
            FunctionalEffect::IncreasedFunction => "increased_function",
            FunctionalEffect::DecreasedFunction => "decreased_function",
            FunctionalEffect::NoFunction        => "no_function",
            FunctionalEffect::Unknown           => "unknown",
        }
    }

    /// Clinical significance rank used when more than two alleles compete for
    /// the two chromosome copies. Higher wins.
    pub fn significance(&self) -> u8 {
        match self {
            FunctionalEffect::NoFunction        => 4,
            FunctionalEffect::DecreasedFunction => 3,
            FunctionalEffect::IncreasedFunction => 2,
            FunctionalEffect::Normal            => 1,
            FunctionalEffect::Unknown           => 0,
        }
    }
}

impl fmt::Display for FunctionalEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Risk vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RiskLabel {
    Safe,
    #[serde(rename = "Adjust Dosage")]
    AdjustDosage,
    Toxic,
    Ineffective,
    Unknown,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Safe         => "Safe",
            RiskLabel::AdjustDosage => "Adjust Dosage",
            RiskLabel::Toxic        => "Toxic",
            RiskLabel::Ineffective  => "Ineffective",
            RiskLabel::Unknown      => "Unknown",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None     => "none",
            Severity::Low      => "low",
            Severity::Moderate => "moderate",
            Severity::High     => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Routine,
    Soon,
    Urgent,
    Emergent,
}
