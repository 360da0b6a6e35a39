use pharmaguard_common::PharmaGuardError;
use pharmaguard_test_utils::pretty_assertions::assert_eq;
use pharmaguard_test_utils::{fixtures, VcfBuilder};
use pharmaguard_vcf::{VcfReader, Zygosity};

#[test]
fn mixed_panel_counts() {
    let text = fixtures::mixed_panel();
    let mut reader = VcfReader::from_text(&text).unwrap();
    assert_eq!(reader.header().patient_id, "PATIENT_MIX");
    assert_eq!(reader.header().sample_name(), "SAMPLE1");

    let records: Vec<_> = reader.by_ref().collect();
    let positions: Vec<u64> = records.iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![94_761_900, 94_781_859, 21_178_615, 1_000_000]);
    assert!(records.iter().all(|r| r.zygosity() == Zygosity::Heterozygous));

    let stats = reader.finish();
    assert_eq!(stats.total_records, 5);
    assert_eq!(stats.reference_only, 1);
    assert_eq!(stats.malformed_lines, 1);
    assert_eq!(stats.emitted(), 4);
    assert!(stats.parsing_success());
    assert!(stats.warnings.is_empty());
}

#[test]
fn annotated_record_exposes_info_tags() {
    let text = VcfBuilder::new().annotated("chr10", 94_761_900, "CYP2C19", "*2", "1|1").build();
    let record = VcfReader::from_text(&text).unwrap().next().unwrap();
    assert_eq!(record.info("gene"), Some("CYP2C19"));
    assert_eq!(record.info("STAR"), Some("*2"));
    assert_eq!(record.genotype_display(), "1|1");
    assert_eq!(record.allele_copies(), 2);
}

#[test]
fn missing_headers_warn_but_parse() {
    let text = VcfBuilder::new()
        .without_fileformat()
        .rsid("chr22", 42_128_945, "rs3892097", "0/1")
        .build();
    let mut reader = VcfReader::from_text(&text).unwrap();
    assert_eq!(reader.by_ref().count(), 1);
    assert_eq!(reader.finish().warnings.len(), 1);
}

#[test]
fn headerless_text_is_rejected() {
    let text = VcfBuilder::new()
        .without_fileformat()
        .without_column_header()
        .rsid("chr22", 42_128_945, "rs3892097", "0/1")
        .build();
    assert!(matches!(VcfReader::from_text(&text), Err(PharmaGuardError::MalformedInput(_))));
}

#[test]
fn shuffling_keeps_the_record_set() {
    let builder = VcfBuilder::new()
        .rsid("chr22", 1, "rs1", "0/1")
        .rsid("chr22", 2, "rs2", "1/1")
        .rsid("chr22", 3, "rs3", "0/0")
        .rsid("chr22", 4, "rs4", "./.");
    let collect = |text: String| {
        let mut ids: Vec<String> = VcfReader::from_text(&text)
            .unwrap()
            .map(|r| r.primary_id().to_string())
            .collect();
        ids.sort();
        ids
    };
    assert_eq!(collect(builder.build()), collect(builder.clone().shuffled(7).build()));
    assert_eq!(collect(builder.build()), vec!["rs1", "rs2", "rs4"]);
}
