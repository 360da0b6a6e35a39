//! Structured variant records and genotype calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Genotype ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zygosity {
    HomozygousReference,
    Heterozygous,
    HomozygousAlternate,
    /// No usable call (missing GT, `./.`, or `0/.` with no alternate seen).
    Unknown,
}

/// A GT call: allele indices per chromosome copy, `None` for `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genotype {
    pub alleles: Vec<Option<u32>>,
    pub phased: bool,
    raw: String,
}

impl Genotype {
    /// Parse a GT value such as `0/1`, `1|1` or `./.`.
    /// Returns `None` for an empty field or non-numeric allele indices.
    pub fn parse(gt: &str) -> Option<Self> {
        let gt = gt.trim();
        if gt.is_empty() {
            return None;
        }
        let phased = gt.contains('|');
        let mut alleles = Vec::new();
        for part in gt.split(|c: char| c == '/' || c == '|') {
            match part {
                "." => alleles.push(None),
                idx => alleles.push(Some(idx.parse::<u32>().ok()?)),
            }
        }
        Some(Self { alleles, phased, raw: gt.to_string() })
    }

    /// The call exactly as written in the file.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Homozygous reference requires every copy to be called as `0`; a
    /// half-missing `0/.` is `Unknown`, not reference.
    pub fn zygosity(&self) -> Zygosity {
        let called: Vec<u32> = self.alleles.iter().flatten().copied().collect();
        if called.is_empty() {
            return Zygosity::Unknown;
        }
        if called.iter().all(|&a| a == 0) {
            return if called.len() == self.alleles.len() {
                Zygosity::HomozygousReference
            } else {
                Zygosity::Unknown
            };
        }
        if called.len() >= 2 && called.iter().all(|&a| a == called[0]) {
            return Zygosity::HomozygousAlternate;
        }
        Zygosity::Heterozygous
    }

    pub fn is_homozygous_reference(&self) -> bool {
        self.zygosity() == Zygosity::HomozygousReference
    }
}

// ── VariantRecord ─────────────────────────────────────────────────────────────

/// One data line of a VCF file. Immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub chromosome: String,
    /// 1-based position.
    pub position: u64,
    /// ID column entries; empty when the column is `.`.
    pub ids: Vec<String>,
    pub ref_allele: String,
    pub alt_alleles: Vec<String>,
    /// PHRED quality, 0.0 when `.` or unparsable.
    pub quality: f64,
    /// INFO fields; flags carry the value `"true"`.
    pub info: BTreeMap<String, String>,
    /// First sample's GT call, when FORMAT carries one.
    pub genotype: Option<Genotype>,
    /// 1-based line number in the source file.
    pub line_no: usize,
}

impl VariantRecord {
    /// INFO lookup; keys are matched case-insensitively.
    pub fn info(&self, key: &str) -> Option<&str> {
        self.info
            .get(key)
            .or_else(|| {
                self.info
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// First ID column entry, or `"."`.
    pub fn primary_id(&self) -> &str {
        self.ids.first().map(String::as_str).unwrap_or(".")
    }

    pub fn alt_display(&self) -> String {
        self.alt_alleles.join(",")
    }

    /// Genotype text for reporting; empty when no GT was present.
    pub fn genotype_display(&self) -> &str {
        self.genotype.as_ref().map(Genotype::as_str).unwrap_or("")
    }

    pub fn zygosity(&self) -> Zygosity {
        self.genotype.as_ref().map(Genotype::zygosity).unwrap_or(Zygosity::Unknown)
    }

    /// Number of variant allele copies implied by the call. A missing call is
    /// assumed to carry one copy.
    pub fn allele_copies(&self) -> u8 {
        match self.zygosity() {
            Zygosity::HomozygousReference => 0,
            Zygosity::HomozygousAlternate => 2,
            Zygosity::Heterozygous | Zygosity::Unknown => 1,
        }
    }
}

/// Parse an INFO column into key/value pairs.
pub(crate) fn parse_info(field: &str) -> BTreeMap<String, String> {
    let mut info = BTreeMap::new();
    if field == "." {
        return info;
    }
    for entry in field.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.split_once('=') {
            Some((k, v)) => {
                info.insert(k.trim().to_string(), v.trim().to_string());
            }
            None => {
                info.insert(entry.to_string(), "true".to_string());
            }
        }
    }
    info
}

/// Pull the GT value of the first sample using the FORMAT key order.
pub(crate) fn extract_gt<'a>(format: &str, sample: &'a str) -> Option<&'a str> {
    let idx = format.split(':').position(|k| k == "GT")?;
    sample.split(':').nth(idx)
}
