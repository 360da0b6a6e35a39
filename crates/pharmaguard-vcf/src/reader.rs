//! Lazy VCF reader.
//!
//! The header block is consumed eagerly by [`VcfReader::new`]; data lines are
//! parsed one at a time as the iterator is driven. The reader is single-pass.

use std::io::{BufRead, Lines};
use std::sync::OnceLock;

use pharmaguard_common::{PharmaGuardError, Result};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::record::{extract_gt, parse_info, Genotype, VariantRecord};
use crate::stats::ParseStats;

/// Patient identifier used when the file does not declare one.
pub const DEFAULT_PATIENT_ID: &str = "PATIENT_001";

/// Minimum number of tab-separated columns in a data line (CHROM..ALT).
const MIN_COLUMNS: usize = 5;

fn patient_id_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)PATIENT[_\-]?ID\s*=\s*(\S+)").ok())
        .as_ref()
}

// ── Header ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcfHeader {
    /// Value of `##fileformat=`, e.g. "VCFv4.2".
    pub fileformat: Option<String>,
    pub patient_id: String,
    /// Sample names from the `#CHROM` line.
    pub samples: Vec<String>,
    pub has_column_header: bool,
}

impl Default for VcfHeader {
    fn default() -> Self {
        Self {
            fileformat: None,
            patient_id: DEFAULT_PATIENT_ID.to_string(),
            samples: Vec::new(),
            has_column_header: false,
        }
    }
}

impl VcfHeader {
    fn apply_meta(&mut self, line: &str) {
        if let Some(value) = line.strip_prefix("##fileformat=") {
            if value.trim().starts_with("VCF") {
                self.fileformat = Some(value.trim().to_string());
            }
            return;
        }
        if !line.to_ascii_uppercase().contains("PATIENT") {
            return;
        }
        let captured = patient_id_regex()
            .and_then(|re| re.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        if let Some(pid) = captured {
            self.patient_id = if pid.to_ascii_uppercase().starts_with("PATIENT") {
                pid
            } else {
                format!("PATIENT_{pid}")
            };
        }
    }

    fn apply_columns(&mut self, line: &str) {
        self.has_column_header = true;
        // CHROM POS ID REF ALT QUAL FILTER INFO FORMAT sample...
        self.samples = line
            .trim_start_matches('#')
            .split('\t')
            .skip(9)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    /// First sample name, falling back to the patient identifier.
    pub fn sample_name(&self) -> &str {
        self.samples.first().map(String::as_str).unwrap_or(&self.patient_id)
    }
}

// ── Reader ────────────────────────────────────────────────────────────────────

pub struct VcfReader<R> {
    lines: Lines<R>,
    header: VcfHeader,
    stats: ParseStats,
    /// First data line, read while scanning the header.
    pending: Option<(usize, String)>,
    line_no: usize,
    done: bool,
}

impl<'a> VcfReader<&'a [u8]> {
    /// Read from in-memory text.
    pub fn from_text(text: &'a str) -> Result<Self> {
        Self::new(text.as_bytes())
    }
}

impl<R: BufRead> VcfReader<R> {
    /// Consume the header block. Fails with `MalformedInput` if the content is
    /// empty or carries neither a `##fileformat=VCF` line nor a `#CHROM` header.
    pub fn new(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let mut header = VcfHeader::default();
        let mut stats = ParseStats::default();
        let mut line_no = 0usize;
        let mut pending = None;
        let mut saw_content = false;

        for line in lines.by_ref() {
            let line = line?;
            line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            saw_content = true;

            if trimmed.starts_with("##") {
                header.apply_meta(trimmed);
            } else if trimmed.get(..6).is_some_and(|p| p.eq_ignore_ascii_case("#CHROM")) {
                header.apply_columns(trimmed);
            } else if !trimmed.starts_with('#') {
                pending = Some((line_no, trimmed.to_string()));
                break;
            }
        }

        if !saw_content {
            return Err(PharmaGuardError::MalformedInput("empty VCF file".to_string()));
        }
        if header.fileformat.is_none() && !header.has_column_header {
            return Err(PharmaGuardError::MalformedInput(
                "no ##fileformat=VCF line or #CHROM header found".to_string(),
            ));
        }
        if header.fileformat.is_none() {
            stats.warnings.push("Missing ##fileformat=VCF header".to_string());
        }
        if !header.has_column_header {
            stats.warnings.push("Missing #CHROM header line".to_string());
        }
        for w in &stats.warnings {
            warn!("{}", w);
        }

        info!(
            "VCF header read: patient={}, samples={}, format={}",
            header.patient_id,
            header.samples.len(),
            header.fileformat.as_deref().unwrap_or("unknown"),
        );

        Ok(Self { lines, header, stats, pending, line_no, done: false })
    }

    pub fn header(&self) -> &VcfHeader {
        &self.header
    }

    /// Counters so far. Final only once the iterator is exhausted.
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Drain any remaining lines and return the final counters.
    pub fn finish(mut self) -> ParseStats {
        for _ in self.by_ref() {}
        self.stats
    }

    fn next_line(&mut self) -> Option<(usize, String)> {
        if let Some(p) = self.pending.take() {
            return Some(p);
        }
        match self.lines.next()? {
            Ok(line) => {
                self.line_no += 1;
                Some((self.line_no, line))
            }
            Err(e) => {
                warn!("VCF read aborted after line {}: {}", self.line_no, e);
                self.stats.read_error = Some(e.to_string());
                self.done = true;
                None
            }
        }
    }
}

impl<R: BufRead> Iterator for VcfReader<R> {
    type Item = VariantRecord;

    fn next(&mut self) -> Option<VariantRecord> {
        while !self.done {
            let Some((line_no, line)) = self.next_line() else {
                self.done = true;
                break;
            };
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(record) = parse_data_line(line, line_no) else {
                self.stats.malformed_lines += 1;
                debug!("Skipping malformed VCF line {}", line_no);
                continue;
            };

            self.stats.total_records += 1;
            if record.genotype.as_ref().is_some_and(Genotype::is_homozygous_reference) {
                self.stats.reference_only += 1;
                continue;
            }
            return Some(record);
        }
        None
    }
}

/// Parse one tab-separated data line. `None` marks a parse anomaly.
fn parse_data_line(line: &str, line_no: usize) -> Option<VariantRecord> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() < MIN_COLUMNS {
        return None;
    }
    let position = fields[1].parse::<u64>().ok()?;

    let ids = fields[2]
        .split(';')
        .map(str::trim)
        .filter(|id| !id.is_empty() && *id != ".")
        .map(str::to_string)
        .collect();
    let alt_alleles = fields[4]
        .split(',')
        .filter(|a| !a.is_empty() && *a != ".")
        .map(str::to_string)
        .collect();
    let quality = fields
        .get(5)
        .and_then(|q| q.parse::<f64>().ok())
        .filter(|q| q.is_finite())
        .unwrap_or(0.0);
    let info = fields.get(7).map(|f| parse_info(f)).unwrap_or_default();
    let genotype = match (fields.get(8), fields.get(9)) {
        (Some(format), Some(sample)) => extract_gt(format, sample).and_then(Genotype::parse),
        _ => None,
    };

    Some(VariantRecord {
        chromosome: fields[0].to_string(),
        position,
        ids,
        ref_allele: fields[3].to_string(),
        alt_alleles,
        quality,
        info,
        genotype,
        line_no,
    })
}
