//! Test fixtures shared across the PharmaGuard workspace.
//!
//! `VcfBuilder` assembles small VCF documents line by line so tests state
//! exactly which calls a file carries. `fixtures` holds the canned files
//! used by the end-to-end scenario tests.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub use pretty_assertions;

const COLUMNS: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT";

/// Builder for synthetic single-sample VCF text.
#[derive(Debug, Clone)]
pub struct VcfBuilder {
    patient_id: Option<String>,
    sample: String,
    fileformat: bool,
    column_header: bool,
    records: Vec<String>,
}

impl Default for VcfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VcfBuilder {
    pub fn new() -> Self {
        Self {
            patient_id: None,
            sample: "SAMPLE1".to_string(),
            fileformat: true,
            column_header: true,
            records: Vec::new(),
        }
    }

    pub fn patient(mut self, id: &str) -> Self {
        self.patient_id = Some(id.to_string());
        self
    }

    pub fn sample(mut self, name: &str) -> Self {
        self.sample = name.to_string();
        self
    }

    pub fn without_fileformat(mut self) -> Self {
        self.fileformat = false;
        self
    }

    pub fn without_column_header(mut self) -> Self {
        self.column_header = false;
        self
    }

    /// A record identified only by its ID column.
    pub fn rsid(self, chrom: &str, pos: u64, rsid: &str, gt: &str) -> Self {
        self.record(chrom, pos, rsid, ".", gt)
    }

    /// A record carrying pipeline annotation tags.
    pub fn annotated(self, chrom: &str, pos: u64, gene: &str, star: &str, gt: &str) -> Self {
        self.record(chrom, pos, ".", &format!("GENE={gene};STAR={star}"), gt)
    }

    /// A record with a gene annotation but no identifier or star allele.
    pub fn gene_only(self, chrom: &str, pos: u64, gene: &str, gt: &str) -> Self {
        self.record(chrom, pos, ".", &format!("GENE={gene}"), gt)
    }

    pub fn record(mut self, chrom: &str, pos: u64, id: &str, info: &str, gt: &str) -> Self {
        self.records.push(format!("{chrom}\t{pos}\t{id}\tC\tT\t99\tPASS\t{info}\tGT\t{gt}"));
        self
    }

    /// Append a line verbatim, e.g. a deliberately malformed one.
    pub fn raw_line(mut self, line: &str) -> Self {
        self.records.push(line.to_string());
        self
    }

    /// Shuffle data lines deterministically.
    pub fn shuffled(mut self, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        self.records.shuffle(&mut rng);
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::new();
        if self.fileformat {
            out.push_str("##fileformat=VCFv4.2\n");
        }
        out.push_str("##source=pharmaguard-test-utils\n");
        if let Some(pid) = &self.patient_id {
            out.push_str(&format!("##PATIENT_ID={pid}\n"));
        }
        if self.column_header {
            out.push_str(&format!("{COLUMNS}\t{}\n", self.sample));
        }
        for line in &self.records {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Canned inputs for scenario tests.
pub mod fixtures {
    use super::VcfBuilder;

    /// CYP2D6 *4 and *6, both heterozygous.
    pub fn cyp2d6_poor_metabolizer() -> String {
        VcfBuilder::new()
            .patient("001")
            .rsid("chr22", 42_128_945, "rs3892097", "0/1")
            .rsid("chr22", 42_130_692, "rs5030655", "0/1")
            .build()
    }

    /// Carries CYP2D6 and CYP2C9 calls but nothing in CYP2C19.
    pub fn no_cyp2c19_variants() -> String {
        VcfBuilder::new()
            .rsid("chr22", 42_128_945, "rs3892097", "0/1")
            .rsid("chr10", 94_981_296, "rs1799853", "0/1")
            .rsid("chr10", 94_761_900, "rs4244285", "0/0")
            .build()
    }

    /// A little of everything: annotated, identified, gene-only, unmatched,
    /// reference-only and malformed lines.
    pub fn mixed_panel() -> String {
        VcfBuilder::new()
            .patient("PATIENT_MIX")
            .annotated("chr10", 94_761_900, "CYP2C19", "*2", "0/1")
            .rsid("chr10", 94_781_859, "rs4986893", "0/1")
            .rsid("chr10", 94_842_866, "rs1799853", "0|0")
            .gene_only("chr12", 21_178_615, "SLCO1B1", "0/1")
            .rsid("chr1", 1_000_000, "rs0000001", "0/1")
            .raw_line("chr1\t12345")
            .build()
    }
}
